//! GraphQL [`Mutation`]s definitions.

use common::Date;
use juniper::graphql_object;
use service::{command, ledger, Command as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Adds a new `InventoryEntry` to the authenticated donor's stock.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_DONOR` - the authenticated `User` doesn't act as a donor;
    /// - `INVALID_QUANTITY` - the provided `Quantity` is zero.
    #[tracing::instrument(
        skip_all,
        fields(
            category = ?category,
            expiry_date = %expiry_date,
            gql.name = "addInventoryEntry",
            name = %name,
            otel.name = Self::SPAN_NAME,
            quantity = %quantity,
        ),
    )]
    pub async fn add_inventory_entry(
        name: api::inventory::Name,
        expiry_date: Date,
        quantity: api::inventory::Quantity,
        category: api::inventory::Category,
        ctx: &Context,
    ) -> Result<api::InventoryEntry, Error> {
        let caller = ctx.current_session().await?.caller();
        ctx.service()
            .execute(command::AddInventoryEntry {
                caller,
                name: name.into(),
                expiry_date,
                quantity: quantity.into(),
                category: category.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Takes the provided quantities out of the authenticated donor's stock
    /// without donating them.
    ///
    /// Either every line is taken, or none.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_DONOR` - the authenticated `User` doesn't act as a donor;
    /// - `NO_ITEMS` - no lines are provided;
    /// - `INVALID_QUANTITY` - a zero `Quantity` is provided;
    /// - `INVENTORY_ENTRY_NOT_EXISTS` - an `InventoryEntry` doesn't exist or
    ///                                  belongs to another donor;
    /// - `INSUFFICIENT_STOCK` - an `InventoryEntry` holds less than
    ///                          requested.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "removeInventory",
            lines = lines.len(),
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn remove_inventory(
        lines: Vec<api::inventory::LineInput>,
        ctx: &Context,
    ) -> Result<Vec<api::InventoryEntry>, Error> {
        let caller = ctx.current_session().await?.caller();
        Ok(ctx
            .service()
            .execute(command::RemoveInventory {
                caller,
                lines: lines.into_iter().map(Into::into).collect(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Donates the provided quantities of the authenticated donor's stock.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_DONOR` - the authenticated `User` doesn't act as a donor;
    /// - `NO_ITEMS` - no lines are provided;
    /// - `INVALID_QUANTITY` - a zero `Quantity` is provided;
    /// - `INVENTORY_ENTRY_NOT_EXISTS` - an `InventoryEntry` doesn't exist or
    ///                                  belongs to another donor;
    /// - `INSUFFICIENT_STOCK` - an `InventoryEntry` holds less than
    ///                          requested.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "donate",
            lines = lines.len(),
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn donate(
        lines: Vec<api::inventory::LineInput>,
        ctx: &Context,
    ) -> Result<api::Donation, Error> {
        let caller = ctx.current_session().await?.caller();
        let donation = ctx
            .service()
            .execute(command::Donate {
                caller,
                lines: lines.into_iter().map(Into::into).collect(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        #[expect(unsafe_code, reason = "just created")]
        let donation = unsafe { api::Donation::new_unchecked(donation.id) };
        Ok(donation)
    }

    /// Sets the `Pickup` location of the authenticated donor's `Donation`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_DONOR` - the authenticated `User` doesn't act as a donor;
    /// - `INVALID_PICKUP_LOCATION` - coordinates are out of range;
    /// - `DONATION_NOT_EXISTS` - the `Donation` doesn't exist;
    /// - `NOT_DONATION_OWNER` - the `Donation` is made by another donor;
    /// - `DONATION_ALREADY_ACCEPTED` - the `Donation` is accepted already.
    #[tracing::instrument(
        skip_all,
        fields(
            donation_id = %donation_id,
            gql.name = "setPickupLocation",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn set_pickup_location(
        donation_id: api::donation::Id,
        pickup: api::donation::PickupInput,
        ctx: &Context,
    ) -> Result<api::Donation, Error> {
        define_error! {
            enum PickupError {
                #[code = "INVALID_PICKUP_LOCATION"]
                #[status = BAD_REQUEST]
                #[message = "Latitude must be within [-90; 90] and \
                             longitude within [-180; 180]"]
                OutOfRange,
            }
        }

        let caller = ctx.current_session().await?.caller();
        let pickup = pickup
            .into_domain()
            .ok_or_else(|| PickupError::OutOfRange.into())
            .map_err(ctx.error())?;
        let donation = ctx
            .service()
            .execute(command::SetPickupLocation {
                caller,
                donation_id: donation_id.into(),
                pickup,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        #[expect(unsafe_code, reason = "just updated")]
        let donation = unsafe { api::Donation::new_unchecked(donation.id) };
        Ok(donation)
    }

    /// Removes the authenticated donor's `Donation`, putting its items back
    /// into stock.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_DONOR` - the authenticated `User` doesn't act as a donor;
    /// - `DONATION_NOT_EXISTS` - the `Donation` doesn't exist;
    /// - `NOT_DONATION_OWNER` - the `Donation` is made by another donor;
    /// - `DONATION_ALREADY_ACCEPTED` - the `Donation` is accepted already;
    /// - `DONATION_LOCKED` - the `Donation` is under review by a recipient.
    #[tracing::instrument(
        skip_all,
        fields(
            donation_id = %donation_id,
            gql.name = "removeDonation",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn remove_donation(
        donation_id: api::donation::Id,
        ctx: &Context,
    ) -> Result<api::donation::Id, Error> {
        let caller = ctx.current_session().await?.caller();
        ctx.service()
            .execute(command::RemoveDonation {
                caller,
                donation_id: donation_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|d| d.id.into())
    }

    /// Locks the `Donation` for review by the authenticated recipient.
    ///
    /// The lock expires on its own after a while.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_RECIPIENT` - the authenticated `User` doesn't act as a
    ///                     recipient;
    /// - `DONATION_NOT_EXISTS` - the `Donation` doesn't exist;
    /// - `DONATION_GONE` - the `Donation` is accepted already;
    /// - `DONATION_LOCKED` - the `Donation` is under review already.
    #[tracing::instrument(
        skip_all,
        fields(
            donation_id = %donation_id,
            gql.name = "lockDonation",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn lock_donation(
        donation_id: api::donation::Id,
        ctx: &Context,
    ) -> Result<api::Donation, Error> {
        let caller = ctx.current_session().await?.caller();
        let donation = ctx
            .service()
            .execute(command::LockDonation {
                caller,
                donation_id: donation_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        #[expect(unsafe_code, reason = "just locked")]
        let donation = unsafe { api::Donation::new_unchecked(donation.id) };
        Ok(donation)
    }

    /// Releases the review lock of the `Donation`.
    ///
    /// Succeeds if the `Donation` isn't locked or doesn't exist.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_RECIPIENT` - the authenticated `User` doesn't act as a
    ///                     recipient.
    #[tracing::instrument(
        skip_all,
        fields(
            donation_id = %donation_id,
            gql.name = "unlockDonation",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn unlock_donation(
        donation_id: api::donation::Id,
        ctx: &Context,
    ) -> Result<bool, Error> {
        let caller = ctx.current_session().await?.caller();
        ctx.service()
            .execute(command::UnlockDonation {
                caller,
                donation_id: donation_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|()| true)
    }

    /// Accepts the whole `Donation` by the authenticated recipient.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_RECIPIENT` - the authenticated `User` doesn't act as a
    ///                     recipient;
    /// - `DONATION_NOT_EXISTS` - the `Donation` doesn't exist;
    /// - `DONATION_ALREADY_ACCEPTED` - the `Donation` is accepted already;
    /// - `DONATION_LOCKED` - the `Donation` is under review by another
    ///                       recipient.
    #[tracing::instrument(
        skip_all,
        fields(
            donation_id = %donation_id,
            gql.name = "acceptDonation",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn accept_donation(
        donation_id: api::donation::Id,
        ctx: &Context,
    ) -> Result<api::Donation, Error> {
        let caller = ctx.current_session().await?.caller();
        let donation = ctx
            .service()
            .execute(command::AcceptDonation {
                caller,
                donation_id: donation_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        #[expect(unsafe_code, reason = "just accepted")]
        let donation = unsafe { api::Donation::new_unchecked(donation.id) };
        Ok(donation)
    }

    /// Accepts the provided quantities of the `Donation` by the
    /// authenticated recipient, leaving the rest open for others.
    ///
    /// Every line of the `Donation` must be provided with the quantity the
    /// recipient has seen.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_RECIPIENT` - the authenticated `User` doesn't act as a
    ///                     recipient;
    /// - `DONATION_NOT_EXISTS` - the `Donation` doesn't exist;
    /// - `DONATION_ALREADY_ACCEPTED` - the `Donation` is accepted already;
    /// - `ITEMS_MISMATCH` - the lines don't match the `Donation`'s items;
    /// - `ACCEPTED_EXCEEDS_AVAILABLE` - more than available is accepted.
    #[tracing::instrument(
        skip_all,
        fields(
            donation_id = %donation_id,
            gql.name = "acceptDonationPartially",
            lines = lines.len(),
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn accept_donation_partially(
        donation_id: api::donation::Id,
        lines: Vec<api::donation::AcceptedLineInput>,
        ctx: &Context,
    ) -> Result<api::donation::PartialAcceptance, Error> {
        let caller = ctx.current_session().await?.caller();
        let output = ctx
            .service()
            .execute(command::AcceptDonationPartially {
                caller,
                donation_id: donation_id.into(),
                lines: lines.into_iter().map(Into::into).collect(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        #[expect(unsafe_code, reason = "just split")]
        let lazy = |d: service::domain::Donation| unsafe {
            api::Donation::new_unchecked(d.id)
        };
        Ok(api::donation::PartialAcceptance {
            accepted: output.accepted.map(lazy),
            residual: output.residual.map(lazy),
        })
    }

    /// Hides the `Donation` from the authenticated recipient's lists.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_RECIPIENT` - the authenticated `User` doesn't act as a
    ///                     recipient;
    /// - `DONATION_NOT_EXISTS` - the `Donation` doesn't exist.
    #[tracing::instrument(
        skip_all,
        fields(
            donation_id = %donation_id,
            gql.name = "rejectDonation",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn reject_donation(
        donation_id: api::donation::Id,
        ctx: &Context,
    ) -> Result<api::Donation, Error> {
        let caller = ctx.current_session().await?.caller();
        let donation = ctx
            .service()
            .execute(command::RejectDonation {
                caller,
                donation_id: donation_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        #[expect(unsafe_code, reason = "just rejected")]
        let donation = unsafe { api::Donation::new_unchecked(donation.id) };
        Ok(donation)
    }

    /// Returns the `Donation` accepted by the authenticated recipient back
    /// to the open ones.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_RECIPIENT` - the authenticated `User` doesn't act as a
    ///                     recipient;
    /// - `DONATION_NOT_EXISTS` - the `Donation` doesn't exist;
    /// - `DONATION_NOT_ACCEPTED` - the `Donation` isn't accepted;
    /// - `NOT_ACCEPTOR` - the `Donation` is accepted by another recipient;
    /// - `DONATION_ALREADY_COMPLETED` - the `Donation` is picked up already.
    #[tracing::instrument(
        skip_all,
        fields(
            donation_id = %donation_id,
            gql.name = "revokeDonationAcceptance",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn revoke_donation_acceptance(
        donation_id: api::donation::Id,
        ctx: &Context,
    ) -> Result<api::Donation, Error> {
        let caller = ctx.current_session().await?.caller();
        let donation = ctx
            .service()
            .execute(command::RevokeDonationAcceptance {
                caller,
                donation_id: donation_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        #[expect(unsafe_code, reason = "just revoked")]
        let donation = unsafe { api::Donation::new_unchecked(donation.id) };
        Ok(donation)
    }

    /// Marks the `Donation` accepted by the authenticated recipient as
    /// picked up.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_RECIPIENT` - the authenticated `User` doesn't act as a
    ///                     recipient;
    /// - `DONATION_NOT_EXISTS` - the `Donation` doesn't exist;
    /// - `DONATION_NOT_ACCEPTED` - the `Donation` isn't accepted;
    /// - `NOT_ACCEPTOR` - the `Donation` is accepted by another recipient;
    /// - `DONATION_ALREADY_COMPLETED` - the `Donation` is picked up already.
    #[tracing::instrument(
        skip_all,
        fields(
            donation_id = %donation_id,
            gql.name = "completeDonation",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn complete_donation(
        donation_id: api::donation::Id,
        ctx: &Context,
    ) -> Result<api::Donation, Error> {
        let caller = ctx.current_session().await?.caller();
        let donation = ctx
            .service()
            .execute(command::CompleteDonation {
                caller,
                donation_id: donation_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        #[expect(unsafe_code, reason = "just completed")]
        let donation = unsafe { api::Donation::new_unchecked(donation.id) };
        Ok(donation)
    }
}

define_error! {
    enum DonationError {
        #[code = "DONATION_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Donation` does not exist"]
        NotExists,

        #[code = "NOT_DONATION_OWNER"]
        #[status = FORBIDDEN]
        #[message = "`Donation` is made by another donor"]
        NotOwner,

        #[code = "NOT_ACCEPTOR"]
        #[status = FORBIDDEN]
        #[message = "`Donation` is accepted by another recipient"]
        NotAcceptor,

        #[code = "DONATION_ALREADY_ACCEPTED"]
        #[status = CONFLICT]
        #[message = "`Donation` is accepted already"]
        AlreadyAccepted,

        #[code = "DONATION_LOCKED"]
        #[status = CONFLICT]
        #[message = "`Donation` is under review by a recipient"]
        Locked,

        #[code = "DONATION_LOCKED"]
        #[status = LOCKED]
        #[message = "`Donation` is under review by a recipient"]
        LockedForRemoval,

        #[code = "DONATION_NOT_ACCEPTED"]
        #[status = CONFLICT]
        #[message = "`Donation` is not accepted"]
        NotAccepted,

        #[code = "DONATION_ALREADY_COMPLETED"]
        #[status = CONFLICT]
        #[message = "`Donation` is picked up already"]
        AlreadyCompleted,

        #[code = "DONATION_GONE"]
        #[status = GONE]
        #[message = "`Donation` is taken by another recipient"]
        Gone,
    }
}

define_error! {
    enum LinesError {
        #[code = "NO_ITEMS"]
        #[status = BAD_REQUEST]
        #[message = "At least one line must be provided"]
        NoItems,

        #[code = "INVALID_QUANTITY"]
        #[status = BAD_REQUEST]
        #[message = "`Quantity` must be positive"]
        InvalidQuantity,
    }
}

impl AsError for ledger::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "INVENTORY_ENTRY_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`InventoryEntry` does not exist"]
                EntryNotExists,

                #[code = "INSUFFICIENT_STOCK"]
                #[status = UNPROCESSABLE_ENTITY]
                #[message = "`InventoryEntry` holds less than requested"]
                InsufficientStock,

                #[code = "QUANTITY_OVERFLOW"]
                #[status = BAD_REQUEST]
                #[message = "`Quantity` of `InventoryEntry` overflows"]
                QuantityOverflow,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::EntryNotExists(_) => Some(Error::EntryNotExists.into()),
            Self::InsufficientStock(_) => {
                Some(Error::InsufficientStock.into())
            }
            Self::InvalidQuantity(_) => Some(LinesError::InvalidQuantity.into()),
            Self::QuantityOverflow(_) => Some(Error::QuantityOverflow.into()),
        }
    }
}

impl AsError for command::add_inventory_entry::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InvalidQuantity => Some(LinesError::InvalidQuantity.into()),
            Self::Role(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::remove_inventory::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Ledger(e) => e.try_as_error(),
            Self::NoItems => Some(LinesError::NoItems.into()),
            Self::Role(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::donate::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Ledger(e) => e.try_as_error(),
            Self::NoItems => Some(LinesError::NoItems.into()),
            Self::Role(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::set_pickup_location::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::AlreadyAccepted(_) => {
                Some(DonationError::AlreadyAccepted.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::DonationNotExists(_) => Some(DonationError::NotExists.into()),
            Self::NotOwner(_) => Some(DonationError::NotOwner.into()),
            Self::Role(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::remove_donation::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::AlreadyAccepted(_) => {
                Some(DonationError::AlreadyAccepted.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::DonationNotExists(_) => Some(DonationError::NotExists.into()),
            Self::Ledger(e) => e.try_as_error(),
            Self::Locked(_) => Some(DonationError::LockedForRemoval.into()),
            Self::NotOwner(_) => Some(DonationError::NotOwner.into()),
            Self::Role(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::lock_donation::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::AlreadyAccepted(_) => Some(DonationError::Gone.into()),
            Self::Db(e) => e.try_as_error(),
            Self::DonationNotExists(_) => Some(DonationError::NotExists.into()),
            Self::Locked(_) => Some(DonationError::Locked.into()),
            Self::Role(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::unlock_donation::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Role(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::accept_donation::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::AlreadyAccepted(_) => {
                Some(DonationError::AlreadyAccepted.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::DonationNotExists(_) => Some(DonationError::NotExists.into()),
            Self::Locked(_) => Some(DonationError::Locked.into()),
            Self::Role(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::accept_donation_partially::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use service::domain::donation::SplitError;

        define_error! {
            enum Error {
                #[code = "ITEMS_MISMATCH"]
                #[status = BAD_REQUEST]
                #[message = "Provided lines don't match the `Donation` items"]
                ItemsMismatch,

                #[code = "ACCEPTED_EXCEEDS_AVAILABLE"]
                #[status = BAD_REQUEST]
                #[message = "Accepted quantity exceeds the available one"]
                AcceptedExceedsAvailable,
            }
        }

        match self {
            Self::AlreadyAccepted(_) => {
                Some(DonationError::AlreadyAccepted.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::DonationNotExists(_) => Some(DonationError::NotExists.into()),
            Self::Role(e) => e.try_as_error(),
            Self::Split(SplitError::ItemsMismatch(_)) => {
                Some(Error::ItemsMismatch.into())
            }
            Self::Split(SplitError::AcceptedExceedsAvailable(_)) => {
                Some(Error::AcceptedExceedsAvailable.into())
            }
        }
    }
}

impl AsError for command::reject_donation::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::DonationNotExists(_) => Some(DonationError::NotExists.into()),
            Self::Role(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::revoke_donation_acceptance::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::AlreadyCompleted(_) => {
                Some(DonationError::AlreadyCompleted.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::DonationNotExists(_) => Some(DonationError::NotExists.into()),
            Self::NotAccepted(_) => Some(DonationError::NotAccepted.into()),
            Self::NotAcceptor(_) => Some(DonationError::NotAcceptor.into()),
            Self::Role(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::complete_donation::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::AlreadyCompleted(_) => {
                Some(DonationError::AlreadyCompleted.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::DonationNotExists(_) => Some(DonationError::NotExists.into()),
            Self::NotAccepted(_) => Some(DonationError::NotAccepted.into()),
            Self::NotAcceptor(_) => Some(DonationError::NotAcceptor.into()),
            Self::Role(e) => e.try_as_error(),
        }
    }
}

#[cfg(test)]
mod spec {
    use http::StatusCode;
    use service::{
        command,
        domain::{
            donation,
            inventory::{self, InsufficientStock},
            user,
        },
        ledger,
    };

    use crate::AsError as _;

    #[test]
    fn lock_conflicts_differ_per_path() {
        let id = donation::Id::new();

        let on_lock =
            command::lock_donation::ExecutionError::Locked(id).as_error();
        assert_eq!(on_lock.code, "DONATION_LOCKED");
        assert_eq!(on_lock.status_code, StatusCode::CONFLICT);

        let on_remove =
            command::remove_donation::ExecutionError::Locked(id).as_error();
        assert_eq!(on_remove.code, "DONATION_LOCKED");
        assert_eq!(on_remove.status_code, StatusCode::LOCKED);

        let taken =
            command::lock_donation::ExecutionError::AlreadyAccepted(id)
                .as_error();
        assert_eq!(taken.code, "DONATION_GONE");
        assert_eq!(taken.status_code, StatusCode::GONE);
    }

    #[test]
    fn insufficient_stock_is_unprocessable() {
        let err = command::donate::ExecutionError::Ledger(
            ledger::ExecutionError::InsufficientStock(InsufficientStock {
                entry_id: inventory::Id::new(),
                available: inventory::Quantity::from(2),
                requested: inventory::Quantity::from(3),
            }),
        )
        .as_error();

        assert_eq!(err.code, "INSUFFICIENT_STOCK");
        assert_eq!(err.status_code, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn role_mismatch_is_forbidden() {
        let err = command::accept_donation::ExecutionError::Role(
            user::Caller::donor(user::Id::new())
                .require(user::Role::Recipient)
                .unwrap_err(),
        )
        .as_error();

        assert_eq!(err.code, "NOT_RECIPIENT");
        assert_eq!(err.status_code, StatusCode::FORBIDDEN);
    }

    #[test]
    fn foreign_acceptance_is_forbidden() {
        let id = donation::Id::new();

        let err = command::complete_donation::ExecutionError::NotAcceptor(id)
            .as_error();
        assert_eq!(err.code, "NOT_ACCEPTOR");
        assert_eq!(err.status_code, StatusCode::FORBIDDEN);

        let err = command::revoke_donation_acceptance::ExecutionError::
            NotAccepted(id)
        .as_error();
        assert_eq!(err.status_code, StatusCode::CONFLICT);
    }

    #[test]
    fn missing_and_invalid_are_client_errors() {
        let err = command::reject_donation::ExecutionError::DonationNotExists(
            donation::Id::new(),
        )
        .as_error();
        assert_eq!(err.status_code, StatusCode::NOT_FOUND);

        let err = command::add_inventory_entry::ExecutionError::InvalidQuantity
            .as_error();
        assert_eq!(err.code, "INVALID_QUANTITY");
        assert_eq!(err.status_code, StatusCode::BAD_REQUEST);
    }
}
