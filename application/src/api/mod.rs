//! GraphQL API definitions.

pub mod donation;
pub mod inventory;
mod mutation;
mod query;
pub mod scalar;
mod subscription;
pub mod user;

use service::domain;

use crate::{define_error, AsError, Error};

pub use self::{
    donation::Donation, inventory::InventoryEntry, mutation::Mutation,
    query::Query, subscription::Subscription,
};

/// GraphQL schema.
pub type Schema = juniper::RootNode<'static, Query, Mutation, Subscription>;

define_error! {
    enum PrivilegeError {
        #[code = "NOT_DONOR"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` must act as a donor"]
        Donor,

        #[code = "NOT_RECIPIENT"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` must act as a recipient"]
        Recipient,
    }
}

impl AsError for domain::user::RoleError {
    fn try_as_error(&self) -> Option<Error> {
        use domain::user::Role;

        Some(match self.expected {
            Role::Donor => PrivilegeError::Donor.into(),
            Role::Recipient => PrivilegeError::Recipient.into(),
        })
    }
}
