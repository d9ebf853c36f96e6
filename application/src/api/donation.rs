//! [`Donation`]-related definitions.

use std::future;

use common::{Date, DateTime, Handler as _};
use derive_more::{AsRef, Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{
    graphql_object, GraphQLEnum, GraphQLInputObject, GraphQLObject,
    GraphQLScalar,
};
use service::{domain, query, read};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{api, api::scalar, AsError, Context, Error};

/// Batch of surplus food handed over by a donor.
#[derive(Clone, Debug)]
pub struct Donation {
    /// ID of this [`Donation`].
    id: Id,

    /// Underlying [`read::Donation`].
    donation: OnceCell<read::Donation>,
}

impl From<read::Donation> for Donation {
    fn from(donation: read::Donation) -> Self {
        Self {
            id: donation.id.into(),
            donation: OnceCell::new_with(Some(donation)),
        }
    }
}

impl Donation {
    /// Creates a new [`Donation`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Donation`] with the provided ID exists,
    /// otherwise accessing this [`Donation`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            donation: OnceCell::new(),
        }
    }

    /// Returns the underlying [`read::Donation`].
    ///
    /// # Errors
    ///
    /// Errors if the [`read::Donation`] doesn't exist.
    async fn donation(&self, ctx: &Context) -> Result<&read::Donation, Error> {
        let id = self.id.into();
        self.donation
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::donation::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|d| {
                        future::ready(d.ok_or_else(|| {
                            api::query::DonationError::NotExists.into()
                        }))
                    })
            })
            .await
    }
}

/// Batch of surplus food handed over by a donor.
#[graphql_object(context = Context)]
impl Donation {
    /// Unique identifier of this `Donation`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Donation.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// ID of the `User` who made this `Donation`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Donation.donorId",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn donor_id(
        &self,
        ctx: &Context,
    ) -> Result<api::user::Id, Error> {
        Ok(self.donation(ctx).await?.donor_id.into())
    }

    /// `DonationStatus` of this `Donation`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Donation.status",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn status(&self, ctx: &Context) -> Result<Status, Error> {
        Ok(self.donation(ctx).await?.status.into())
    }

    /// ID of the `User` who accepted this `Donation`, if any.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Donation.acceptedBy",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn accepted_by(
        &self,
        ctx: &Context,
    ) -> Result<Option<api::user::Id>, Error> {
        Ok(self.donation(ctx).await?.accepted_by.map(Into::into))
    }

    /// Indicates whether this `Donation` is under review by a recipient.
    ///
    /// A review lock expires on its own, so a `Donation` may be listed as
    /// locked while being free to lock again.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Donation.isLocked",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn is_locked(&self, ctx: &Context) -> Result<bool, Error> {
        Ok(self.donation(ctx).await?.is_locked())
    }

    /// `DateTime` when the review lock of this `Donation` was placed.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Donation.lockedAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn locked_at(
        &self,
        ctx: &Context,
    ) -> Result<Option<DateTime>, Error> {
        Ok(self
            .donation(ctx)
            .await?
            .lock
            .map(|l| l.locked_at.coerce()))
    }

    /// ID of the `User` holding the review lock of this `Donation`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Donation.lockedBy",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn locked_by(
        &self,
        ctx: &Context,
    ) -> Result<Option<api::user::Id>, Error> {
        Ok(self
            .donation(ctx)
            .await?
            .lock
            .map(|l| l.locked_by.into()))
    }

    /// `Pickup` location of this `Donation`, if set.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Donation.pickup",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn pickup(&self, ctx: &Context) -> Result<Option<Pickup>, Error> {
        Ok(self.donation(ctx).await?.pickup.clone().map(Into::into))
    }

    /// `DateTime` when this `Donation` was made.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Donation.donatedAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn donated_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.donation(ctx).await?.donated_at.coerce())
    }

    /// `DateTime` when this `Donation` was accepted.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Donation.acceptedAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn accepted_at(
        &self,
        ctx: &Context,
    ) -> Result<Option<DateTime>, Error> {
        Ok(self.donation(ctx).await?.accepted_at.map(|at| at.coerce()))
    }

    /// `DateTime` when this `Donation` was picked up.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Donation.pickedUpAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn picked_up_at(
        &self,
        ctx: &Context,
    ) -> Result<Option<DateTime>, Error> {
        Ok(self.donation(ctx).await?.picked_up_at.map(|at| at.coerce()))
    }

    /// `DonationItem`s of this `Donation`, in insertion order.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Donation.items",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn items(&self, ctx: &Context) -> Result<Vec<Item>, Error> {
        Ok(self
            .donation(ctx)
            .await?
            .items
            .iter()
            .cloned()
            .map(Item)
            .collect())
    }
}

/// Line of a `Donation`.
#[derive(Clone, Debug)]
pub struct Item(read::donation::Item);

/// Line of a `Donation`.
#[graphql_object(context = Context, name = "DonationItem")]
impl Item {
    /// ID of the `InventoryEntry` this `DonationItem` was taken from.
    pub fn entry_id(&self) -> api::inventory::Id {
        self.0.inventory_id.into()
    }

    /// Name of the donated food.
    pub fn name(&self) -> api::inventory::Name {
        self.0.name.clone().into()
    }

    /// Donated quantity.
    pub fn quantity(&self) -> api::inventory::Quantity {
        self.0.quantity.into()
    }

    /// `Date` the donated food expires at.
    pub fn expiry_date(&self) -> Date {
        self.0.expiry_date
    }

    /// Category of the donated food.
    pub fn category(&self) -> api::inventory::Category {
        self.0.category.into()
    }
}

/// Unique identifier of a `Donation`.
#[derive(Clone, Copy, Debug, Display, From, GraphQLScalar, Into)]
#[from(domain::donation::Id)]
#[into(domain::donation::Id)]
#[graphql(name = "DonationId", transparent)]
pub struct Id(Uuid);

/// Status of a `Donation`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "DonationStatus")]
pub enum Status {
    /// Open for review and acceptance.
    NotAccepted,

    /// Claimed by a recipient.
    Accepted,

    /// Picked up by the recipient.
    Completed,
}

impl From<domain::donation::Status> for Status {
    fn from(status: domain::donation::Status) -> Self {
        use domain::donation::Status as S;

        match status {
            S::NotAccepted => Self::NotAccepted,
            S::Accepted => Self::Accepted,
            S::Completed => Self::Completed,
        }
    }
}

/// Street address of a `Pickup` location.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "PickupAddress",
    with = scalar::Via::<domain::donation::Address>,
)]
pub struct Address(domain::donation::Address);

/// Place a `Donation` is picked up at.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(context = Context)]
pub struct Pickup {
    /// Latitude in degrees.
    pub lat: f64,

    /// Longitude in degrees.
    pub lng: f64,

    /// Human-readable street address.
    pub address: Address,
}

impl From<domain::donation::Pickup> for Pickup {
    fn from(pickup: domain::donation::Pickup) -> Self {
        Self {
            lat: pickup.lat.into(),
            lng: pickup.lng.into(),
            address: pickup.address.into(),
        }
    }
}

/// Place a `Donation` is picked up at.
#[derive(Clone, Debug, GraphQLInputObject)]
pub struct PickupInput {
    /// Latitude in degrees, within `[-90; 90]`.
    pub lat: f64,

    /// Longitude in degrees, within `[-180; 180]`.
    pub lng: f64,

    /// Human-readable street address.
    pub address: Address,
}

impl PickupInput {
    /// Converts this [`PickupInput`] into a [`domain::donation::Pickup`], if
    /// the coordinates are in range.
    #[must_use]
    pub fn into_domain(self) -> Option<domain::donation::Pickup> {
        Some(domain::donation::Pickup {
            lat: domain::donation::Latitude::new(self.lat)?,
            lng: domain::donation::Longitude::new(self.lng)?,
            address: self.address.into(),
        })
    }
}

/// Line of a `Donation` being accepted partially.
#[derive(Clone, Copy, Debug, GraphQLInputObject)]
#[graphql(name = "AcceptedLineInput")]
pub struct AcceptedLineInput {
    /// ID of the `InventoryEntry` the `DonationItem` was taken from.
    pub entry_id: api::inventory::Id,

    /// Quantity of the `DonationItem`, as seen by the recipient.
    pub available_quantity: api::inventory::Quantity,

    /// Quantity the recipient takes.
    pub accepted_quantity: api::inventory::Quantity,
}

impl From<AcceptedLineInput> for domain::donation::AcceptedLine {
    fn from(line: AcceptedLineInput) -> Self {
        Self {
            inventory_id: line.entry_id.into(),
            available: line.available_quantity.into(),
            accepted: line.accepted_quantity.into(),
        }
    }
}

/// Result of accepting a `Donation` partially.
#[derive(Debug, GraphQLObject)]
#[graphql(context = Context, name = "PartialAcceptance")]
pub struct PartialAcceptance {
    /// New accepted `Donation`, unless nothing was accepted.
    pub accepted: Option<Donation>,

    /// What is left of the original `Donation`, unless everything was
    /// accepted.
    pub residual: Option<Donation>,
}
