use std::{
    io,
    sync::{Arc, OnceLock},
    time,
};

use application::{api, config, graphql, subscriptions, Args, Config};
use axum::{
    extract::MatchedPath,
    routing::{get, on, MethodFilter},
    Extension, Router,
};
use axum_client_ip::InsecureClientIp;
use service::{
    infra::{postgres, Postgres},
    Service,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing as log;
use tracing_subscriber::{
    filter::filter_fn,
    fmt::MakeWriter,
    layer::{Layer, SubscriberExt as _},
    registry::LookupSpan,
    util::SubscriberInitExt as _,
};

/// Levels written to stderr instead of stdout.
const STDERR_LEVELS: &[log::Level] = &[log::Level::WARN, log::Level::ERROR];

/// Maximum level to log, once the [`Config`] is loaded.
static LOG_LEVEL: OnceLock<log::Level> = OnceLock::new();

postgres::embed_migrations!("../migrations");

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(output(io::stdout, false))
        .with(output(io::stderr, true))
        .init();

    _ = start().await;
}

/// Creates a compact log output into the provided `writer`, accepting either
/// the [`STDERR_LEVELS`] or all the others.
fn output<S, W>(writer: W, stderr: bool) -> impl Layer<S>
where
    S: log::Subscriber + for<'s> LookupSpan<'s>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .compact()
        .with_ansi(true)
        .with_thread_names(true)
        .with_writer(writer)
        .with_filter(filter_fn(move |meta| {
            meta.is_span()
                || (STDERR_LEVELS.contains(meta.level()) == stderr
                    && LOG_LEVEL.get().copied().unwrap_or(log::Level::INFO)
                        >= *meta.level())
        }))
}

async fn start() -> Result<(), ()> {
    let Args { config } = Args::parse().map_err(|e| {
        log::error!("failed to parse command line arguments: {e}");
    })?;

    let Config {
        postgres,
        service,
        server,
        log,
    } = Config::new(config).map_err(|e| {
        log::error!("failed to load `Config`: {e}");
    })?;

    LOG_LEVEL
        .set(log.level.into())
        .unwrap_or_else(|_| unreachable!("first initialization"));

    let mut postgres = Postgres::new(&postgres.into()).map_err(|e| {
        log::error!("failed to initialize `Postgres` client: {e}");
    })?;
    migrations::runner()
        .run_async(&mut postgres)
        .await
        .map_err(|e| {
            log::error!("failed to run database migrations: {e}");
        })?;

    log::info!(
        donation_lock_ttl = ?service.donation_lock_ttl,
        "starting donation service",
    );
    let service = Service::new(service.into(), postgres);

    let app = router(service, cors(&server.cors)?);

    let listener = TcpListener::bind((server.host.clone(), server.port))
        .await
        .map_err(|e| {
            log::error!(
                "failed to listen on `{}:{}`: {e}",
                server.host,
                server.port,
            );
        })?;

    log::info!("listening on `{}:{}`", server.host, server.port);

    axum::serve(listener, app)
        .await
        .map_err(|e| log::error!("webserver failed: {e}"))
}

/// Builds a [`CorsLayer`] allowing GraphQL requests from the configured
/// origins.
fn cors(conf: &config::Cors) -> Result<CorsLayer, ()> {
    let origins = if conf.origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            conf.origins
                .iter()
                .map(|origin| {
                    origin.parse::<http::header::HeaderValue>().map_err(|e| {
                        log::error!(
                            "`{origin}` is not a correct CORS origin: {e}",
                        );
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
        )
    };

    Ok(CorsLayer::new()
        .allow_methods([
            http::Method::GET,
            http::Method::OPTIONS,
            http::Method::POST,
        ])
        .allow_headers([
            http::header::AUTHORIZATION,
            http::header::CONTENT_TYPE,
        ])
        .allow_origin(origins))
}

/// Builds the HTTP [`Router`] serving the GraphQL API of the provided
/// [`Service`].
fn router(service: application::Service, cors: CorsLayer) -> Router {
    let schema = api::Schema::new(api::Query, api::Mutation, api::Subscription);

    Router::new()
        .route(
            "/graphql",
            on(MethodFilter::GET.or(MethodFilter::POST), graphql),
        )
        .route("/subscriptions", get(subscriptions))
        .layer(Extension(Arc::new(schema)))
        .layer(Extension(service))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|r: &http::Request<_>| {
                    log::info_span!(
                        "HTTP request",
                        http.client_ip = InsecureClientIp::from(
                            r.headers(),
                            r.extensions()
                        )
                            .map(|ip| ip.0.to_string())
                            .ok(),
                        http.method = r.method().as_str(),
                        http.route = r
                            .extensions()
                            .get::<MatchedPath>()
                            .map(MatchedPath::as_str),
                        http.target = r
                            .uri()
                            .path_and_query()
                            .map(http::uri::PathAndQuery::as_str),
                        http.status_code = log::field::Empty,
                    )
                })
                .on_response(
                    |r: &http::Response<_>,
                     dur: time::Duration,
                     span: &log::Span| {
                        _ = span.record(
                            "http.status_code",
                            log::field::display(r.status().as_u16()),
                        );

                        let duration = format!("{}ms", dur.as_millis());
                        if r.status().is_server_error() {
                            log::error!(%duration);
                        } else if r.status().is_client_error() {
                            log::warn!(%duration);
                        } else {
                            log::info!(%duration);
                        }
                    },
                ),
        )
}
