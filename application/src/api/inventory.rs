//! [`InventoryEntry`]-related definitions.

use common::{Date, DateTime};
use derive_more::{AsRef, Display, From, Into};
use juniper::{
    graphql_object, GraphQLEnum, GraphQLInputObject, GraphQLScalar,
    InputValue, ScalarValue, Value,
};
use service::{domain, ledger};
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    Context,
};

/// Stock of a single food item held by a donor.
#[derive(Clone, Debug, From, Into)]
pub struct InventoryEntry(domain::inventory::Entry);

/// Stock of a single food item held by a donor.
#[graphql_object(context = Context)]
impl InventoryEntry {
    /// Unique identifier of this `InventoryEntry`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "InventoryEntry.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// `User` owning this `InventoryEntry`.
    pub fn owner_id(&self) -> api::user::Id {
        self.0.owner_id.into()
    }

    /// Name of the stored food.
    pub fn name(&self) -> Name {
        self.0.name.clone().into()
    }

    /// `Date` the stored food expires at.
    pub fn expiry_date(&self) -> Date {
        self.0.expiry_date
    }

    /// Quantity left in stock.
    pub fn quantity(&self) -> Quantity {
        self.0.quantity.into()
    }

    /// Category of the stored food.
    pub fn category(&self) -> Category {
        self.0.category.into()
    }

    /// `DateTime` when this `InventoryEntry` was created.
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }
}

/// Unique identifier of an `InventoryEntry`.
#[derive(Clone, Copy, Debug, Display, From, GraphQLScalar, Into)]
#[from(domain::inventory::Id)]
#[into(domain::inventory::Id)]
#[graphql(name = "InventoryEntryId", transparent)]
pub struct Id(Uuid);

/// Name of the food stored in an `InventoryEntry`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "InventoryEntryName",
    with = scalar::Via::<domain::inventory::Name>,
)]
pub struct Name(domain::inventory::Name);

/// Non-negative amount of food units.
#[derive(Clone, Copy, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "Quantity",
    to_output_with = Self::to_output,
    from_input_with = Self::from_input,
    parse_token(i32),
)]
pub struct Quantity(domain::inventory::Quantity);

impl Quantity {
    /// Converts this [`Quantity`] into an `Int` [`Value`].
    fn to_output<S: ScalarValue>(&self) -> Value<S> {
        Value::scalar(i32::try_from(u32::from(self.0)).unwrap_or(i32::MAX))
    }

    /// Parses a [`Quantity`] out of an `Int` [`InputValue`].
    fn from_input<S: ScalarValue>(input: &InputValue<S>) -> Result<Self, String> {
        let int = input
            .as_int_value()
            .ok_or_else(|| format!("Expected `Int` `Quantity`, found: {input}"))?;
        u32::try_from(int)
            .map(|q| Self(q.into()))
            .map_err(|_| format!("`Quantity` cannot be negative, found: {int}"))
    }
}

/// Category of food.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "FoodCategory")]
pub enum Category {
    /// Packaged or raw groceries.
    Grocery,

    /// Cooked meals.
    Cooked,
}

impl From<domain::inventory::Category> for Category {
    fn from(category: domain::inventory::Category) -> Self {
        use domain::inventory::Category as C;

        match category {
            C::Grocery => Self::Grocery,
            C::Cooked => Self::Cooked,
        }
    }
}

impl From<Category> for domain::inventory::Category {
    fn from(category: Category) -> Self {
        match category {
            Category::Grocery => Self::Grocery,
            Category::Cooked => Self::Cooked,
        }
    }
}

/// Quantity of an `InventoryEntry` to take out of stock.
#[derive(Clone, Copy, Debug, GraphQLInputObject)]
#[graphql(name = "InventoryLineInput")]
pub struct LineInput {
    /// ID of the `InventoryEntry` to take the food from.
    pub entry_id: Id,

    /// Quantity to take.
    pub quantity: Quantity,
}

impl From<LineInput> for ledger::Line {
    fn from(line: LineInput) -> Self {
        Self {
            entry_id: line.entry_id.into(),
            quantity: line.quantity.into(),
        }
    }
}
