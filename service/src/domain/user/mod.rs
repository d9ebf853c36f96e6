//! [`User`] definitions.
//!
//! Users are owned by an external identity service: this crate only knows
//! their IDs and [`Role`]s, as carried by a [`Session`].
//!
//! [`User`]: Caller

pub mod session;

use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use self::session::Session;

/// ID of a platform user.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Role a platform user acts in.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Lists surplus food and donates it.
    #[display("donor")]
    Donor,

    /// Organization browsing, accepting and picking up donations.
    #[display("recipient")]
    Recipient,
}

/// Identity of whoever executes an operation.
///
/// Trusted as is: authentication happens before a [`Caller`] is built.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Caller {
    /// ID of the calling user.
    pub id: Id,

    /// [`Role`] of the calling user.
    pub role: Role,
}

impl Caller {
    /// Creates a new [`Role::Donor`] [`Caller`].
    #[must_use]
    pub const fn donor(id: Id) -> Self {
        Self {
            id,
            role: Role::Donor,
        }
    }

    /// Creates a new [`Role::Recipient`] [`Caller`].
    #[must_use]
    pub const fn recipient(id: Id) -> Self {
        Self {
            id,
            role: Role::Recipient,
        }
    }

    /// Returns the [`Id`] of this [`Caller`] if it acts as the provided
    /// [`Role`].
    ///
    /// # Errors
    ///
    /// With a [`RoleError`] if this [`Caller`] acts in another [`Role`].
    pub fn require(self, role: Role) -> Result<Id, RoleError> {
        if self.role == role {
            Ok(self.id)
        } else {
            Err(RoleError {
                user_id: self.id,
                expected: role,
            })
        }
    }
}

impl From<Session> for Caller {
    fn from(session: Session) -> Self {
        Self {
            id: session.user_id,
            role: session.role,
        }
    }
}

/// Error of a [`Caller`] acting in an unexpected [`Role`].
#[derive(Clone, Copy, Debug, Display, derive_more::Error, Eq, PartialEq)]
#[display("`User(id: {user_id})` is not a {expected}")]
pub struct RoleError {
    /// ID of the offending user.
    #[error(not(source))]
    pub user_id: Id,

    /// [`Role`] the operation requires.
    #[error(not(source))]
    pub expected: Role,
}

#[cfg(test)]
mod spec {
    use super::{Caller, Id, Role};

    #[test]
    fn requires_role() {
        let id = Id::new();

        assert_eq!(Caller::donor(id).require(Role::Donor), Ok(id));
        let err = Caller::donor(id).require(Role::Recipient).unwrap_err();
        assert_eq!(err.expected, Role::Recipient);
        assert_eq!(
            err.to_string(),
            format!("`User(id: {id})` is not a recipient"),
        );
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Recipient).unwrap();

        assert_eq!(json, r#""recipient""#);
        assert_eq!(
            serde_json::from_str::<Role>(r#""donor""#).unwrap(),
            Role::Donor,
        );
    }
}
