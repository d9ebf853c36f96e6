//! [`Query`] collection related to the multiple [`Donation`]s.

use common::operations::By;

#[cfg(doc)]
use crate::{read::Donation, Query};
use crate::{
    domain::user,
    read::{self, donation::list::Selector},
};

use super::Lookup;

/// Queries a list of [`Donation`]s.
pub type List = Lookup<By<Vec<read::Donation>, Selector>>;

/// Queries [`Donation`]s made by a donor.
#[must_use]
pub fn for_donor(donor_id: user::Id) -> List {
    List::by(Selector::ForDonor(donor_id))
}

/// Queries [`Donation`]s a recipient can still accept.
#[must_use]
pub fn available_for(recipient_id: user::Id) -> List {
    List::by(Selector::AvailableFor(recipient_id))
}

/// Queries not accepted [`Donation`]s a recipient hasn't rejected.
///
/// Same as [`available_for()`].
#[must_use]
pub fn unaccepted_for(recipient_id: user::Id) -> List {
    available_for(recipient_id)
}

/// Queries [`Donation`]s accepted and not yet picked up by a recipient.
#[must_use]
pub fn accepted_by(recipient_id: user::Id) -> List {
    List::by(Selector::AcceptedBy(recipient_id))
}

/// Queries [`Donation`]s picked up by a recipient.
#[must_use]
pub fn completed_for(recipient_id: user::Id) -> List {
    List::by(Selector::CompletedFor(recipient_id))
}
