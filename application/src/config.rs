//! [`Config`]-related definitions.

use std::time;

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use serde::Deserialize;
use smart_default::SmartDefault;

/// Prefix of the environment variables overriding the [`Config`] file, like
/// `CONF.SERVICE.DONATION_LOCK_TTL=5m`.
const ENV_PREFIX: &str = "CONF";

/// Configuration of the whole application.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP [`Server`] configuration.
    pub server: Server,

    /// Donation [`Service`] configuration.
    pub service: Service,

    /// [`Postgres`] connection configuration.
    pub postgres: Postgres,

    /// [`Log`] configuration.
    pub log: Log,
}

impl Config {
    /// Loads the [`Config`] from the file at the provided `path` (if it
    /// exists), overridden by [`ENV_PREFIX`]ed environment variables.
    ///
    /// Anything not specified falls back to its default.
    ///
    /// # Errors
    ///
    /// If the file or the environment variables contain invalid values.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        let file = config::File::with_name(path.as_ref()).required(false);
        let env = config::Environment::with_prefix(ENV_PREFIX).separator(".");

        ConfigBuilder::<DefaultState>::default()
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()
    }
}

/// HTTP server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Address to listen on.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to listen on.
    #[default(8080)]
    pub port: u16,

    /// [`Cors`] policy of the GraphQL endpoints.
    pub cors: Cors,
}

/// [CORS] policy.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// Origins allowed to call the API, with `*` allowing any.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

/// Donation service configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Service {
    /// [JWT] secret shared with the identity service issuing the tokens.
    ///
    /// [JWT]: https://wikipedia.org/wiki/JSON_Web_Token
    #[default("secret".to_owned())]
    pub jwt_secret: String,

    /// Time a donation review lock stays active after being placed.
    #[default(time::Duration::from_secs(10 * 60))]
    #[serde(with = "humantime_serde")]
    pub donation_lock_ttl: time::Duration,
}

impl From<Service> for service::Config {
    fn from(conf: Service) -> Self {
        Self {
            jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(
                conf.jwt_secret.as_bytes(),
            ),
            donation_lock_ttl: conf.donation_lock_ttl,
        }
    }
}

/// Postgres connection configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host of the Postgres server.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port of the Postgres server.
    #[default(5432)]
    pub port: u16,

    /// Name of the database holding inventories and donations.
    #[default("postgres".to_owned())]
    pub dbname: String,

    /// Role to authenticate as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password of the [`Postgres::user`].
    #[default("postgres".to_owned())]
    pub password: String,

    /// Maximum number of pooled connections.
    ///
    /// Each open transaction occupies one of them until it ends.
    #[default(16)]
    pub max_connections: usize,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(conf: Postgres) -> Self {
        let mut pg = Self::new();
        pg.host = Some(conf.host);
        pg.port = Some(conf.port);
        pg.dbname = Some(conf.dbname);
        pg.user = Some(conf.user);
        pg.password = Some(conf.password);
        pg.pool = Some(service::infra::postgres::PoolConfig::new(
            conf.max_connections,
        ));
        pg
    }
}

/// Logging configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Maximum [`LogLevel`] to output.
    pub level: LogLevel,
}

/// Verbosity of the logs.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Every statement run against the database, among the rest.
    Trace,

    /// Details of every handled operation.
    Debug,

    /// Committed state changes and served requests.
    #[default]
    Info,

    /// Rejected requests.
    Warn,

    /// Failures only.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use config::{File, FileFormat};

    use super::{Config, LogLevel};

    fn parse(toml: &str) -> Config {
        config::Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn lock_ttl_defaults_to_ten_minutes() {
        assert_eq!(
            Config::default().service.donation_lock_ttl,
            Duration::from_secs(10 * 60),
        );
    }

    #[test]
    fn parses_human_readable_lock_ttl() {
        let conf = parse("[service]\ndonation_lock_ttl = \"15m\"");

        assert_eq!(conf.service.donation_lock_ttl, Duration::from_secs(15 * 60));
        assert_eq!(conf.server.port, 8080);
    }

    #[test]
    fn pool_size_reaches_postgres_config() {
        let conf = parse(
            "[postgres]\nmax_connections = 4\n\n[log]\nlevel = \"WARN\"",
        );
        assert!(matches!(conf.log.level, LogLevel::Warn));

        let pg = service::infra::postgres::Config::from(conf.postgres);
        assert_eq!(pg.pool.map(|p| p.max_size), Some(4));
        assert_eq!(pg.dbname.as_deref(), Some("postgres"));
    }
}
