//! User-related definitions.
//!
//! Users live in the identity service: only their IDs and [`Role`]s are
//! known here.

use common::DateTime;
use derive_more::{Display, From, Into};
use juniper::{GraphQLEnum, GraphQLObject, GraphQLScalar};
use service::domain;
use uuid::Uuid;

use crate::{Context, Session};

/// Unique identifier of a `User`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::user::Id)]
#[into(domain::user::Id)]
#[graphql(name = "UserId", transparent)]
pub struct Id(Uuid);

/// Role a `User` acts in.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "UserRole")]
pub enum Role {
    /// Lists surplus food and donates it.
    Donor,

    /// Browses, accepts and picks up donations.
    Recipient,
}

impl From<domain::user::Role> for Role {
    fn from(role: domain::user::Role) -> Self {
        use domain::user::Role as R;

        match role {
            R::Donor => Self::Donor,
            R::Recipient => Self::Recipient,
        }
    }
}

impl From<Role> for domain::user::Role {
    fn from(role: Role) -> Self {
        match role {
            Role::Donor => Self::Donor,
            Role::Recipient => Self::Recipient,
        }
    }
}

/// Authenticated `UserSession`.
#[derive(Clone, Copy, Debug, GraphQLObject)]
#[graphql(context = Context, name = "UserSession")]
pub struct SessionInfo {
    /// ID of the authenticated `User`.
    pub user_id: Id,

    /// `UserRole` the authenticated `User` acts in.
    pub role: Role,

    /// `DateTime` when this `UserSession` expires.
    pub expires_at: DateTime,
}

impl From<Session> for SessionInfo {
    fn from(session: Session) -> Self {
        Self {
            user_id: session.user_id,
            role: session.role,
            expires_at: session.expires_at,
        }
    }
}
