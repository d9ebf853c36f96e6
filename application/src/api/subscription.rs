//! GraphQL [`Subscription`]s definitions.

use common::DateTime;
use futures::{
    stream::{self, BoxStream},
    FutureExt as _, StreamExt as _,
};
use juniper::graphql_subscription;

use crate::{context::AuthError, Context, Error};

/// Root of all GraphQL subscriptions.
#[derive(Clone, Copy, Debug)]
pub struct Subscription;

impl Subscription {
    /// Name of the [`tracing::Span`] for the subscriptions.
    const SPAN_NAME: &'static str = "GraphQL subscription";
}

#[graphql_subscription(context = Context)]
impl Subscription {
    /// Waits for the authenticated `UserSession` to expire, then fails with
    /// the `AUTHORIZATION_REQUIRED` error.
    ///
    /// Clients use it to request a fresh token in time.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the subscription is not authenticated, or
    ///                              its `UserSession` has expired.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "waitSession",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn wait_session(
        &self,
        ctx: &Context,
    ) -> Result<BoxStream<'static, Result<bool, Error>>, Error> {
        let left = ctx
            .current_session()
            .await?
            .expires_at
            .saturating_duration_since(DateTime::now());

        Ok(stream::once(
            tokio::time::sleep(left)
                .map(|()| Err(AuthError::AuthorizationRequired.into())),
        )
        .boxed())
    }
}
