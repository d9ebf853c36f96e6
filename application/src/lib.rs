//! GraphQL API of the surplus food donation [`Service`], served over HTTP
//! and WebSocket.

#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod api;
pub mod args;
pub mod config;
mod context;
pub mod error;

use std::sync::Arc;

use axum::{
    extract::WebSocketUpgrade,
    response::{IntoResponse, Response},
    Extension, Json,
};
use derive_more::Debug;
use juniper::{
    http::{GraphQLBatchResponse, GraphQLResponse},
    DefaultScalarValue, IntoFieldError as _, ScalarValue,
};
use juniper_axum::{extract::JuniperRequest, subscriptions};
use juniper_graphql_ws::ConnectionConfig;
// Used in binary.
use axum_client_ip as _;
use refinery as _;
use tower_http as _;
use tracing_subscriber as _;

pub use self::{
    args::Args,
    config::Config,
    context::{Context, Session},
    error::{AsError, Error},
};

/// [`Service`] backed by Postgres.
///
/// [`Service`]: service::Service
pub type Service = service::Service<service::infra::Postgres>;

/// Maximum number of GraphQL operations run concurrently over a single
/// WebSocket connection.
const MAX_IN_FLIGHT_OPERATIONS: usize = 10;

/// Maximum size (in bytes) of a single WebSocket message.
const MAX_WS_MESSAGE_SIZE: usize = 1024;

/// HTTP response carrying a GraphQL execution result.
#[derive(Debug)]
pub struct GraphQlResponse<S = DefaultScalarValue>
where
    S: ScalarValue,
{
    /// [`http::StatusCode`] to respond with if the execution failed.
    pub error_status: http::StatusCode,

    /// Result of the GraphQL execution.
    #[debug(skip)]
    pub result: GraphQLBatchResponse<S>,
}

impl GraphQlResponse {
    /// Creates a [`GraphQlResponse`] failed with the provided [`Error`]
    /// before any GraphQL execution happened.
    #[must_use]
    pub fn failed(err: Error) -> Self {
        Self {
            error_status: err.status_code,
            result: GraphQLBatchResponse::Single(GraphQLResponse::error(
                err.into_field_error(),
            )),
        }
    }
}

impl<S> IntoResponse for GraphQlResponse<S>
where
    S: ScalarValue,
{
    fn into_response(self) -> Response {
        let status = if self.result.is_ok() {
            http::StatusCode::OK
        } else {
            self.error_status
        };
        (status, Json(self.result)).into_response()
    }
}

/// Executes a GraphQL request against the [`api::Schema`].
pub async fn graphql(
    Extension(schema): Extension<Arc<api::Schema>>,
    context: Context,
    JuniperRequest(request): JuniperRequest,
) -> GraphQlResponse {
    let result = request.execute(&*schema, &context).await;
    GraphQlResponse {
        error_status: context.error_status_code(),
        result,
    }
}

/// Serves GraphQL subscriptions over a WebSocket connection.
#[expect(
    clippy::unused_async,
    reason = "`async` is required to match signature"
)]
pub async fn subscriptions(
    Extension(schema): Extension<Arc<api::Schema>>,
    mut context: Context,
    ws: WebSocketUpgrade,
) -> Response {
    ws.protocols(["graphql-transport-ws", "graphql-ws"])
        .max_frame_size(MAX_WS_MESSAGE_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .write_buffer_size(MAX_WS_MESSAGE_SIZE / 2)
        .max_write_buffer_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| {
            subscriptions::serve_ws(socket, schema, move |vars| async move {
                context.authorize_with(&vars).map(|()| {
                    ConnectionConfig::new(context)
                        .with_max_in_flight_operations(MAX_IN_FLIGHT_OPERATIONS)
                })
            })
        })
}
