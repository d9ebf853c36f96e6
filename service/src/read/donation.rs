//! [`Donation`] read model definitions.
//!
//! [`Donation`]: crate::domain::Donation

use std::collections::HashMap;

#[cfg(doc)]
use common::DateTime;
use common::Date;

use crate::domain::{donation, inventory, user};

/// [`Donation`] with its [`Item`]s, as listed to users.
///
/// [`Donation`]: crate::domain::Donation
#[derive(Clone, Debug, PartialEq)]
pub struct Donation {
    /// ID of this [`Donation`].
    pub id: donation::Id,

    /// ID of the donor who made this [`Donation`].
    pub donor_id: user::Id,

    /// [`donation::Status`] of this [`Donation`].
    pub status: donation::Status,

    /// ID of the recipient who accepted this [`Donation`], if any.
    pub accepted_by: Option<user::Id>,

    /// [`donation::Lock`] of this [`Donation`], if any.
    ///
    /// Listed as stored, even if stale.
    pub lock: Option<donation::Lock>,

    /// [`donation::Pickup`] location of this [`Donation`], if any.
    pub pickup: Option<donation::Pickup>,

    /// [`DateTime`] when this [`Donation`] was made.
    pub donated_at: donation::CreationDateTime,

    /// [`DateTime`] when this [`Donation`] was accepted.
    pub accepted_at: Option<donation::AcceptanceDateTime>,

    /// [`DateTime`] when this [`Donation`] was picked up.
    pub picked_up_at: Option<donation::PickupDateTime>,

    /// [`Item`]s of this [`Donation`], in insertion order.
    pub items: Vec<Item>,
}

impl Donation {
    /// Indicates whether this [`Donation`] carries a [`donation::Lock`].
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.lock.is_some()
    }
}

/// Line of a [`Donation`] joined with its [`inventory::Entry`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Item {
    /// ID of the [`inventory::Entry`] this [`Item`] was debited from.
    pub inventory_id: inventory::Id,

    /// [`inventory::Name`] of the donated food.
    pub name: inventory::Name,

    /// Donated [`inventory::Quantity`].
    pub quantity: inventory::Quantity,

    /// [`Date`] the donated food expires at.
    pub expiry_date: Date,

    /// [`inventory::Category`] of the donated food.
    pub category: inventory::Category,
}

/// Regroups flattened `(donation, item)` rows into one [`Donation`] per ID.
///
/// [`Donation`]s keep the order they're first seen in, and [`Item`]s keep
/// the order of their rows. Any [`Item`]s the provided [`Donation`]s already
/// carry are discarded.
#[must_use]
pub fn group<I>(rows: I) -> Vec<Donation>
where
    I: IntoIterator<Item = (Donation, Item)>,
{
    let mut positions = HashMap::<donation::Id, usize>::new();
    let mut grouped = Vec::<Donation>::new();
    for (donation, item) in rows {
        let pos = *positions.entry(donation.id).or_insert_with(|| {
            grouped.push(Donation {
                items: Vec::new(),
                ..donation
            });
            grouped.len() - 1
        });
        grouped[pos].items.push(item);
    }
    grouped
}

pub mod list {
    //! [`Donation`]s list definitions.

    use crate::domain::user;
    #[cfg(doc)]
    use crate::domain::{donation::Status, Donation};

    /// Selector of a [`Donation`]s list.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub enum Selector {
        /// All [`Donation`]s made by the donor, newest first.
        ForDonor(user::Id),

        /// [`Status::NotAccepted`] [`Donation`]s not rejected by the
        /// recipient, newest first.
        ///
        /// Locked [`Donation`]s are listed too.
        AvailableFor(user::Id),

        /// [`Status::Accepted`] [`Donation`]s of the recipient, newest first.
        AcceptedBy(user::Id),

        /// [`Status::Completed`] [`Donation`]s of the recipient, latest
        /// picked up first.
        CompletedFor(user::Id),
    }
}

#[cfg(test)]
mod spec {
    use common::{Date, DateTime};

    use super::{group, Donation, Item};
    use crate::domain::{donation, inventory, user};

    fn donation() -> Donation {
        Donation {
            id: donation::Id::new(),
            donor_id: user::Id::new(),
            status: donation::Status::NotAccepted,
            accepted_by: None,
            lock: None,
            pickup: None,
            donated_at: DateTime::now().coerce(),
            accepted_at: None,
            picked_up_at: None,
            items: Vec::new(),
        }
    }

    fn item(name: &str) -> Item {
        Item {
            inventory_id: inventory::Id::new(),
            name: inventory::Name::new(name).unwrap(),
            quantity: 1.into(),
            expiry_date: Date::from_calendar_date(2026, 10, 30).unwrap(),
            category: inventory::Category::Cooked,
        }
    }

    fn names(d: &Donation) -> Vec<&str> {
        d.items.iter().map(|i| i.name.as_ref()).collect()
    }

    #[test]
    fn groups_by_donation_id() {
        let (a, b) = (donation(), donation());

        let grouped = group([
            (a.clone(), item("Rice")),
            (b.clone(), item("Soup")),
            (a.clone(), item("Beans")),
            (b.clone(), item("Bread")),
            (a.clone(), item("Milk")),
        ]);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].id, a.id);
        assert_eq!(names(&grouped[0]), ["Rice", "Beans", "Milk"]);
        assert_eq!(grouped[1].id, b.id);
        assert_eq!(names(&grouped[1]), ["Soup", "Bread"]);
    }

    #[test]
    fn discards_preset_items() {
        let mut a = donation();
        a.items.push(item("Stale"));

        let grouped = group([(a, item("Fresh"))]);

        assert_eq!(names(&grouped[0]), ["Fresh"]);
    }

    #[test]
    fn empty_rows_give_empty_list() {
        assert!(group(Vec::new()).is_empty());
    }
}
