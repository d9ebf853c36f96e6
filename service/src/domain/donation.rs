//! [`Donation`] definitions.

use std::{collections::HashSet, time::Duration};

use common::{define_kind, unit, Date, DateTime, DateTimeOf};
use derive_more::{AsRef, Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{inventory, user};

/// Offer of food items made by a donor.
#[derive(Clone, Debug, PartialEq)]
pub struct Donation {
    /// ID of this [`Donation`].
    pub id: Id,

    /// ID of the donor who made this [`Donation`].
    pub donor_id: user::Id,

    /// Current [`Status`] of this [`Donation`].
    pub status: Status,

    /// ID of the recipient who accepted this [`Donation`], if any.
    pub accepted_by: Option<user::Id>,

    /// IDs of the recipients who declined this [`Donation`].
    pub rejected_by: HashSet<user::Id>,

    /// Review [`Lock`] placed on this [`Donation`], if any.
    ///
    /// May be stale, see [`Donation::active_lock()`].
    pub lock: Option<Lock>,

    /// [`Pickup`] location of this [`Donation`], if set by its donor.
    pub pickup: Option<Pickup>,

    /// [`Item`]s of this [`Donation`], in insertion order.
    pub items: Vec<Item>,

    /// [`DateTime`] when this [`Donation`] was made.
    pub donated_at: CreationDateTime,

    /// [`DateTime`] when this [`Donation`] was accepted.
    pub accepted_at: Option<AcceptanceDateTime>,

    /// [`DateTime`] when this [`Donation`] was picked up.
    pub picked_up_at: Option<PickupDateTime>,
}

impl Donation {
    /// Creates a new [`Status::NotAccepted`] [`Donation`] of the provided
    /// [`Item`]s.
    #[must_use]
    pub fn new(donor_id: user::Id, items: Vec<Item>, at: DateTime) -> Self {
        Self {
            id: Id::new(),
            donor_id,
            status: Status::NotAccepted,
            accepted_by: None,
            rejected_by: HashSet::new(),
            lock: None,
            pickup: None,
            items,
            donated_at: at.coerce(),
            accepted_at: None,
            picked_up_at: None,
        }
    }

    /// Returns the [`Lock`] of this [`Donation`] if it's placed less than
    /// `ttl` ago.
    #[must_use]
    pub fn active_lock(&self, now: DateTime, ttl: Duration) -> Option<&Lock> {
        self.lock
            .as_ref()
            .filter(|l| now.saturating_duration_since(l.locked_at) < ttl)
    }

    /// Indicates whether this [`Donation`] is listed for the provided
    /// recipient.
    ///
    /// Locks don't hide a [`Donation`]: a lock conflict is only reported
    /// once the recipient tries to lock or accept it.
    #[must_use]
    pub fn is_available_for(&self, recipient_id: user::Id) -> bool {
        self.status == Status::NotAccepted
            && !self.rejected_by.contains(&recipient_id)
    }

    /// Places a review [`Lock`] on this [`Donation`].
    pub fn lock(&mut self, by: user::Id, at: DateTime) {
        self.lock = Some(Lock {
            locked_by: by,
            locked_at: at.coerce(),
        });
    }

    /// Lifts any review [`Lock`] from this [`Donation`].
    pub fn unlock(&mut self) {
        self.lock = None;
    }

    /// Marks this [`Donation`] as accepted by the provided recipient.
    pub fn accept(&mut self, by: user::Id, at: DateTime) {
        self.status = Status::Accepted;
        self.accepted_by = Some(by);
        self.accepted_at = Some(at.coerce());
        self.lock = None;
    }

    /// Returns an accepted [`Donation`] back to the [`Status::NotAccepted`]
    /// pool.
    pub fn revoke(&mut self) {
        self.status = Status::NotAccepted;
        self.accepted_by = None;
        self.accepted_at = None;
        self.lock = None;
    }

    /// Marks this [`Donation`] as picked up.
    pub fn complete(&mut self, at: DateTime) {
        self.status = Status::Completed;
        self.picked_up_at = Some(at.coerce());
    }

    /// Records the provided recipient as declining this [`Donation`].
    ///
    /// Returns `false` if it has already declined it.
    pub fn reject(&mut self, by: user::Id) -> bool {
        self.rejected_by.insert(by)
    }

    /// Returns total [`inventory::Quantity`] of all [`Item`]s.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Splits the provided [`AcceptedLine`]s off this [`Donation`] into a new
    /// [`Status::Accepted`] one.
    ///
    /// Every stored [`Item`] must be described by exactly one
    /// [`AcceptedLine`] with the same `available` quantity. What isn't
    /// accepted stays in this [`Donation`]. If anything stays, this
    /// [`Donation`] is unlocked and no longer rejected by `by`.
    ///
    /// Returns [`None`] if nothing is accepted.
    ///
    /// # Errors
    ///
    /// With a [`SplitError`] if the lines don't describe the stored
    /// [`Item`]s, in which case this [`Donation`] stays unchanged.
    pub fn split(
        &mut self,
        lines: &[AcceptedLine],
        by: user::Id,
        at: DateTime,
    ) -> Result<Option<Self>, SplitError> {
        if lines.len() != self.items.len() {
            return Err(SplitError::ItemsMismatch(self.id));
        }

        let mut accepted = Vec::new();
        let mut remaining = Vec::new();
        for item in &self.items {
            let mut matching =
                lines.iter().filter(|l| l.inventory_id == item.inventory_id);
            let line = match (matching.next(), matching.next()) {
                (Some(l), None) if l.available == item.quantity => l,
                _ => return Err(SplitError::ItemsMismatch(self.id)),
            };
            let rest = line.available.checked_sub(line.accepted).ok_or(
                SplitError::AcceptedExceedsAvailable(item.inventory_id),
            )?;

            if !line.accepted.is_zero() {
                accepted.push(Item {
                    quantity: line.accepted,
                    ..*item
                });
            }
            if !rest.is_zero() {
                remaining.push(Item {
                    quantity: rest,
                    ..*item
                });
            }
        }

        let split = (!accepted.is_empty()).then(|| Self {
            id: Id::new(),
            donor_id: self.donor_id,
            status: Status::Accepted,
            accepted_by: Some(by),
            rejected_by: HashSet::new(),
            lock: None,
            pickup: self.pickup.clone(),
            items: accepted,
            donated_at: self.donated_at,
            accepted_at: Some(at.coerce()),
            picked_up_at: None,
        });

        self.items = remaining;
        if !self.items.is_empty() {
            self.unlock();
            _ = self.rejected_by.remove(&by);
        }

        Ok(split)
    }
}

/// ID of a [`Donation`].
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

define_kind! {
    #[doc = "Status of a [`Donation`]."]
    enum Status {
        #[doc = "Listed and waiting for a recipient."]
        NotAccepted = 1,

        #[doc = "Claimed by a recipient, waiting for pickup."]
        Accepted = 2,

        #[doc = "Picked up by the recipient."]
        Completed = 3,
    }
}

/// Line of a [`Donation`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Item {
    /// ID of the [`inventory::Entry`] this [`Item`] was debited from.
    pub inventory_id: inventory::Id,

    /// Donated [`inventory::Quantity`], never zero.
    pub quantity: inventory::Quantity,

    /// [`Date`] the donated food expires at.
    pub expiry_date: Date,

    /// [`inventory::Category`] of the donated food.
    pub category: inventory::Category,
}

/// Advisory review lock of a [`Donation`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Lock {
    /// ID of the recipient holding this [`Lock`].
    pub locked_by: user::Id,

    /// [`DateTime`] when this [`Lock`] was placed.
    pub locked_at: LockDateTime,
}

/// Place a [`Donation`] is picked up at.
#[derive(Clone, Debug, PartialEq)]
pub struct Pickup {
    /// [`Latitude`] of this [`Pickup`] location.
    pub lat: Latitude,

    /// [`Longitude`] of this [`Pickup`] location.
    pub lng: Longitude,

    /// Human-readable [`Address`] of this [`Pickup`] location.
    pub address: Address,
}

/// Latitude in degrees, within `[-90; 90]`.
#[derive(Clone, Copy, Debug, Display, Into, PartialEq, PartialOrd)]
pub struct Latitude(f64);

impl Latitude {
    /// Creates a new [`Latitude`] if the provided `degrees` are in range.
    #[must_use]
    pub fn new(degrees: f64) -> Option<Self> {
        (-90.0..=90.0).contains(&degrees).then_some(Self(degrees))
    }
}

/// Longitude in degrees, within `[-180; 180]`.
#[derive(Clone, Copy, Debug, Display, Into, PartialEq, PartialOrd)]
pub struct Longitude(f64);

impl Longitude {
    /// Creates a new [`Longitude`] if the provided `degrees` are in range.
    #[must_use]
    pub fn new(degrees: f64) -> Option<Self> {
        (-180.0..=180.0).contains(&degrees).then_some(Self(degrees))
    }
}

/// Street address of a [`Pickup`] location.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Address(String);

impl Address {
    /// Creates a new [`Address`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `address` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Creates a new [`Address`] if the given `address` is valid.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Option<Self> {
        let address = address.into();
        Self::check(&address).then_some(Self(address))
    }

    /// Checks whether the given `address` is a valid [`Address`].
    fn check(address: impl AsRef<str>) -> bool {
        let address = address.as_ref();
        !address.trim().is_empty() && address.len() <= 1024
    }
}

impl FromStr for Address {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Address`")
    }
}

/// Line of a partial acceptance, as seen by the accepting recipient.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AcceptedLine {
    /// ID of the [`inventory::Entry`] the [`Item`] was debited from.
    pub inventory_id: inventory::Id,

    /// [`inventory::Quantity`] the recipient saw as available.
    pub available: inventory::Quantity,

    /// [`inventory::Quantity`] the recipient takes.
    pub accepted: inventory::Quantity,
}

/// Error of [`Donation::split()`].
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
pub enum SplitError {
    /// Submitted lines don't describe the stored [`Item`]s.
    #[display("lines don't match items of `Donation(id: {_0})`")]
    ItemsMismatch(#[error(not(source))] Id),

    /// More than available is accepted for an [`Item`].
    #[display(
        "accepted quantity exceeds available for `InventoryEntry(id: {_0})`"
    )]
    AcceptedExceedsAvailable(#[error(not(source))] inventory::Id),
}

/// [`DateTime`] when a [`Donation`] was made.
pub type CreationDateTime = DateTimeOf<(Donation, unit::Creation)>;

/// [`DateTime`] when a [`Donation`] was accepted.
pub type AcceptanceDateTime = DateTimeOf<(Donation, unit::Acceptance)>;

/// [`DateTime`] when a [`Donation`] was picked up.
pub type PickupDateTime = DateTimeOf<(Donation, unit::Pickup)>;

/// [`DateTime`] when a [`Donation`] was locked for review.
pub type LockDateTime = DateTimeOf<(Donation, unit::Locking)>;

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{Date, DateTime};

    use super::{AcceptedLine, Donation, Item, SplitError, Status};
    use crate::domain::{inventory, user};

    const TTL: Duration = Duration::from_secs(10 * 60);

    fn item(quantity: u32) -> Item {
        Item {
            inventory_id: inventory::Id::new(),
            quantity: quantity.into(),
            expiry_date: Date::from_calendar_date(2026, 11, 1).unwrap(),
            category: inventory::Category::Grocery,
        }
    }

    fn line(item: &Item, accepted: u32) -> AcceptedLine {
        AcceptedLine {
            inventory_id: item.inventory_id,
            available: item.quantity,
            accepted: accepted.into(),
        }
    }

    fn now() -> DateTime {
        DateTime::from_unix_timestamp(1_760_000_000).unwrap()
    }

    #[test]
    fn lock_expires_after_ttl() {
        let mut d = Donation::new(user::Id::new(), vec![item(1)], now());
        let recipient = user::Id::new();

        d.lock(recipient, now());
        let at_9m = now() + Duration::from_secs(9 * 60);
        let at_10m = now() + TTL;

        assert_eq!(
            d.active_lock(at_9m, TTL).map(|l| l.locked_by),
            Some(recipient),
        );
        assert!(d.active_lock(at_10m, TTL).is_none());
        assert!(d.lock.is_some(), "stale lock is kept until reclaimed");
    }

    #[test]
    fn rejection_is_a_set() {
        let mut d = Donation::new(user::Id::new(), vec![item(1)], now());
        let recipient = user::Id::new();

        assert!(d.reject(recipient));
        assert!(!d.reject(recipient));
        assert_eq!(d.rejected_by.len(), 1);
        assert_eq!(d.status, Status::NotAccepted);
        assert!(!d.is_available_for(recipient));
        assert!(d.is_available_for(user::Id::new()));
    }

    #[test]
    fn revoke_clears_acceptance() {
        let mut d = Donation::new(user::Id::new(), vec![item(1)], now());
        let recipient = user::Id::new();

        d.accept(recipient, now());
        assert_eq!(d.status, Status::Accepted);
        assert_eq!(d.accepted_by, Some(recipient));
        assert!(d.accepted_at.is_some());

        d.lock(recipient, now());
        d.revoke();
        assert_eq!(d.status, Status::NotAccepted);
        assert_eq!(d.accepted_by, None);
        assert_eq!(d.accepted_at, None);
        assert_eq!(d.lock, None);
    }

    #[test]
    fn split_conserves_quantity() {
        let (a, b) = (item(5), item(3));
        let mut d = Donation::new(user::Id::new(), vec![a, b], now());
        let recipient = user::Id::new();
        d.lock(recipient, now());
        _ = d.reject(recipient);
        let before = d.total_quantity();

        let new = d
            .split(&[line(&a, 3), line(&b, 3)], recipient, now())
            .unwrap()
            .unwrap();

        assert_eq!(new.status, Status::Accepted);
        assert_eq!(new.accepted_by, Some(recipient));
        assert_eq!(new.donated_at, d.donated_at);
        assert_eq!(
            new.items.iter().map(|i| u32::from(i.quantity)).collect::<Vec<_>>(),
            [3, 3],
        );
        assert_eq!(d.items.len(), 1);
        assert_eq!(d.items[0].inventory_id, a.inventory_id);
        assert_eq!(d.items[0].quantity, 2.into());
        assert_eq!(new.total_quantity() + d.total_quantity(), before);
        assert_eq!(d.lock, None);
        assert!(!d.rejected_by.contains(&recipient));
    }

    #[test]
    fn split_of_everything_empties_residual() {
        let a = item(4);
        let mut d = Donation::new(user::Id::new(), vec![a], now());
        let recipient = user::Id::new();
        d.lock(recipient, now());

        let new = d.split(&[line(&a, 4)], recipient, now()).unwrap();

        assert_eq!(new.unwrap().total_quantity(), 4);
        assert!(d.items.is_empty());
    }

    #[test]
    fn split_of_nothing_only_unlocks() {
        let a = item(4);
        let mut d = Donation::new(user::Id::new(), vec![a], now());
        let recipient = user::Id::new();
        d.lock(recipient, now());

        let new = d.split(&[line(&a, 0)], recipient, now()).unwrap();

        assert!(new.is_none());
        assert_eq!(d.items, [a]);
        assert_eq!(d.lock, None);
    }

    #[test]
    fn split_rejects_mismatching_lines() {
        let (a, b) = (item(5), item(3));
        let d = Donation::new(user::Id::new(), vec![a, b], now());
        let recipient = user::Id::new();

        for lines in [
            vec![line(&a, 1)],
            vec![line(&a, 1), line(&a, 1)],
            vec![line(&a, 1), line(&item(3), 1)],
            vec![
                line(&a, 1),
                AcceptedLine {
                    available: 2.into(),
                    ..line(&b, 1)
                },
            ],
        ] {
            let mut d = d.clone();
            assert_eq!(
                d.split(&lines, recipient, now()),
                Err(SplitError::ItemsMismatch(d.id)),
            );
            assert_eq!(d.items, [a, b]);
        }

        let mut d = d.clone();
        assert_eq!(
            d.split(&[line(&a, 6), line(&b, 0)], recipient, now()),
            Err(SplitError::AcceptedExceedsAvailable(a.inventory_id)),
        );
    }
}
