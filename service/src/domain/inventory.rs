//! Inventory [`Entry`] definitions.

#[cfg(feature = "postgres")]
use std::error::Error as StdError;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, Date, DateTimeOf};
use derive_more::{AsRef, Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{
    accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql, Type,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::user;

/// Stock of a single food item held by a donor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Entry {
    /// ID of this [`Entry`].
    pub id: Id,

    /// ID of the donor owning this [`Entry`].
    pub owner_id: user::Id,

    /// [`Name`] of the stored item.
    pub name: Name,

    /// [`Date`] the stored item expires at.
    pub expiry_date: Date,

    /// [`Quantity`] currently in stock.
    pub quantity: Quantity,

    /// [`Category`] of the stored item.
    pub category: Category,

    /// [`DateTime`] when this [`Entry`] was created.
    pub created_at: CreationDateTime,
}

impl Entry {
    /// Takes the provided [`Quantity`] out of this [`Entry`].
    ///
    /// # Errors
    ///
    /// With an [`InsufficientStock`] if less than `quantity` is in stock, in
    /// which case this [`Entry`] stays unchanged.
    pub fn debit(&mut self, quantity: Quantity) -> Result<(), InsufficientStock> {
        self.quantity = self.quantity.checked_sub(quantity).ok_or(
            InsufficientStock {
                entry_id: self.id,
                available: self.quantity,
                requested: quantity,
            },
        )?;
        Ok(())
    }

    /// Puts the provided [`Quantity`] back into this [`Entry`].
    ///
    /// # Errors
    ///
    /// With a [`QuantityOverflow`] if the resulting [`Quantity`] cannot be
    /// represented.
    pub fn credit(&mut self, quantity: Quantity) -> Result<(), QuantityOverflow> {
        self.quantity = self
            .quantity
            .checked_add(quantity)
            .ok_or(QuantityOverflow(self.id))?;
        Ok(())
    }
}

/// ID of an [`Entry`].
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

/// Name of a stored item.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `name` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.len() <= 256
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Name`")
    }
}

/// Amount of units of a stored or donated item.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Display,
    Eq,
    From,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
)]
pub struct Quantity(u32);

impl Quantity {
    /// [`Quantity`] of nothing.
    pub const ZERO: Self = Self(0);

    /// Indicates whether this [`Quantity`] is [`Quantity::ZERO`].
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Adds the provided [`Quantity`], returning [`None`] on overflow.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Subtracts the provided [`Quantity`], returning [`None`] if `rhs` is
    /// bigger.
    #[must_use]
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }
}

impl From<Quantity> for u64 {
    fn from(q: Quantity) -> Self {
        q.0.into()
    }
}

#[cfg(feature = "postgres")]
impl FromSql<'_> for Quantity {
    accepts!(INT4);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        Ok(Self(u32::try_from(i32::from_sql(ty, raw)?)?))
    }
}

#[cfg(feature = "postgres")]
impl ToSql for Quantity {
    accepts!(INT4);
    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        w: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        i32::try_from(self.0)?.to_sql(ty, w)
    }
}

define_kind! {
    #[doc = "Category of a stored food item."]
    enum Category {
        #[doc = "Packaged or raw grocery."]
        Grocery = 1,

        #[doc = "Prepared meal."]
        Cooked = 2,
    }
}

/// Error of debiting more than an [`Entry`] holds.
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
#[display(
    "`InventoryEntry(id: {entry_id})` holds {available}, but {requested} \
     requested"
)]
pub struct InsufficientStock {
    /// ID of the debited [`Entry`].
    #[error(not(source))]
    pub entry_id: Id,

    /// [`Quantity`] the [`Entry`] holds.
    #[error(not(source))]
    pub available: Quantity,

    /// [`Quantity`] requested to be debited.
    #[error(not(source))]
    pub requested: Quantity,
}

/// Error of crediting an [`Entry`] beyond the representable [`Quantity`].
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
#[display("`InventoryEntry(id: {_0})` quantity overflow")]
pub struct QuantityOverflow(#[error(not(source))] pub Id);

/// [`DateTime`] when an [`Entry`] was created.
pub type CreationDateTime = DateTimeOf<(Entry, unit::Creation)>;

#[cfg(test)]
mod spec {
    use common::{Date, DateTime};

    use super::{Category, Entry, Id, InsufficientStock, Name, Quantity};
    use crate::domain::user;

    fn entry(quantity: u32) -> Entry {
        Entry {
            id: Id::new(),
            owner_id: user::Id::new(),
            name: Name::new("Rice").unwrap(),
            expiry_date: Date::from_calendar_date(2026, 12, 1).unwrap(),
            quantity: Quantity::from(quantity),
            category: Category::Grocery,
            created_at: DateTime::now().coerce(),
        }
    }

    #[test]
    fn debits_up_to_zero() {
        let mut e = entry(5);

        e.debit(Quantity::from(3)).unwrap();
        assert_eq!(e.quantity, Quantity::from(2));

        e.debit(Quantity::from(2)).unwrap();
        assert!(e.quantity.is_zero());
    }

    #[test]
    fn rejects_overdraft_without_clamping() {
        let mut e = entry(2);

        let err = e.debit(Quantity::from(3)).unwrap_err();
        assert_eq!(
            err,
            InsufficientStock {
                entry_id: e.id,
                available: Quantity::from(2),
                requested: Quantity::from(3),
            },
        );
        assert_eq!(e.quantity, Quantity::from(2));
    }

    #[test]
    fn credits_back() {
        let mut e = entry(0);

        e.credit(Quantity::from(7)).unwrap();
        assert_eq!(e.quantity, Quantity::from(7));

        e.quantity = Quantity::from(u32::MAX);
        assert!(e.credit(Quantity::from(1)).is_err());
        assert_eq!(e.quantity, Quantity::from(u32::MAX));
    }

    #[test]
    fn validates_name() {
        assert!(Name::new("Bread").is_some());
        assert!(Name::new("").is_none());
        assert!(Name::new(" Bread").is_none());
        assert!(Name::new("x".repeat(257)).is_none());
    }
}
