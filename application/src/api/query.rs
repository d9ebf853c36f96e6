//! GraphQL [`Query`]s definitions.

use juniper::graphql_object;
use service::{domain::user::Role, query, Query as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the currently authenticated `UserSession`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "mySession",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn my_session(
        ctx: &Context,
    ) -> Result<api::user::SessionInfo, Error> {
        Ok(ctx.current_session().await?.into())
    }

    /// Returns the `InventoryEntry`s of the authenticated donor still holding
    /// any stock, soonest expiring first.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_DONOR` - the authenticated `User` doesn't act as a donor.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "myInventory",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn my_inventory(
        ctx: &Context,
    ) -> Result<Vec<api::InventoryEntry>, Error> {
        let my_id = ctx
            .current_session()
            .await?
            .caller()
            .require(Role::Donor)
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        Ok(ctx
            .service()
            .execute(query::inventory::List::by(my_id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Returns all the `Donation`s made by the authenticated donor, newest
    /// first.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_DONOR` - the authenticated `User` doesn't act as a donor.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "myDonations",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn my_donations(
        ctx: &Context,
    ) -> Result<Vec<api::Donation>, Error> {
        let my_id = ctx
            .current_session()
            .await?
            .caller()
            .require(Role::Donor)
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        Self::list(query::donations::for_donor(my_id), ctx).await
    }

    /// Returns the `Donation`s open for the authenticated recipient, newest
    /// first.
    ///
    /// `Donation`s declined by the recipient are not listed, while the ones
    /// under review by other recipients are.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_RECIPIENT` - the authenticated `User` doesn't act as a
    ///                     recipient.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "availableDonations",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn available_donations(
        ctx: &Context,
    ) -> Result<Vec<api::Donation>, Error> {
        let my_id = Self::recipient(ctx).await?;

        Self::list(query::donations::available_for(my_id), ctx).await
    }

    /// Returns the not yet accepted `Donation`s for the authenticated
    /// recipient, newest first.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_RECIPIENT` - the authenticated `User` doesn't act as a
    ///                     recipient.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "unacceptedDonations",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn unaccepted_donations(
        ctx: &Context,
    ) -> Result<Vec<api::Donation>, Error> {
        let my_id = Self::recipient(ctx).await?;

        Self::list(query::donations::unaccepted_for(my_id), ctx).await
    }

    /// Returns the `Donation`s accepted by the authenticated recipient and
    /// not picked up yet, newest first.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_RECIPIENT` - the authenticated `User` doesn't act as a
    ///                     recipient.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "acceptedDonations",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn accepted_donations(
        ctx: &Context,
    ) -> Result<Vec<api::Donation>, Error> {
        let my_id = Self::recipient(ctx).await?;

        Self::list(query::donations::accepted_by(my_id), ctx).await
    }

    /// Returns the `Donation`s picked up by the authenticated recipient,
    /// latest picked up first.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_RECIPIENT` - the authenticated `User` doesn't act as a
    ///                     recipient.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "completedDonations",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn completed_donations(
        ctx: &Context,
    ) -> Result<Vec<api::Donation>, Error> {
        let my_id = Self::recipient(ctx).await?;

        Self::list(query::donations::completed_for(my_id), ctx).await
    }

    /// Returns the `Donation` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `DONATION_NOT_EXISTS` - the `Donation` with the specified ID does
    ///                           not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "donation",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn donation(
        id: api::donation::Id,
        ctx: &Context,
    ) -> Result<api::Donation, Error> {
        _ = ctx.current_session().await?;

        ctx.service()
            .execute(query::donation::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| DonationError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }
}

impl Query {
    /// Returns the ID of the authenticated recipient.
    ///
    /// # Errors
    ///
    /// Errors if the authenticated `User` doesn't act as a recipient.
    async fn recipient(
        ctx: &Context,
    ) -> Result<service::domain::user::Id, Error> {
        ctx.current_session()
            .await?
            .caller()
            .require(Role::Recipient)
            .map_err(AsError::into_error)
            .map_err(ctx.error())
    }

    /// Executes the provided [`query::donations::List`].
    async fn list(
        list: query::donations::List,
        ctx: &Context,
    ) -> Result<Vec<api::Donation>, Error> {
        Ok(ctx
            .service()
            .execute(list)
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .into_iter()
            .map(Into::into)
            .collect())
    }
}

define_error! {
    enum DonationError {
        #[code = "DONATION_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Donation` does not exist"]
        NotExists,
    }
}
