//! [`Query`] collection related to [`inventory::Entry`]s.

use common::operations::By;

#[cfg(doc)]
use crate::Query;
use crate::domain::{inventory, user};

use super::Lookup;

/// Queries in-stock [`inventory::Entry`]s of a donor, soonest expiring
/// first.
pub type List = Lookup<By<Vec<inventory::Entry>, user::Id>>;

/// Queries an [`inventory::Entry`] by its [`inventory::Id`].
pub type ById = Lookup<By<Option<inventory::Entry>, inventory::Id>>;
