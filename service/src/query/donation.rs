//! [`Query`] collection related to a single [`Donation`].

use common::operations::By;

use crate::{domain::donation, read};
#[cfg(doc)]
use crate::{read::Donation, Query};

use super::Lookup;

/// Queries a [`Donation`] with its items by its [`donation::Id`].
pub type ById = Lookup<By<Option<read::Donation>, donation::Id>>;
