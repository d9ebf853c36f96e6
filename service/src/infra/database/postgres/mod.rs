//! Postgres [`Database`] implementation.
//!
//! Row exclusivity is provided by `SELECT … FOR UPDATE` inside a [`Tx`], held
//! until the [`Tx`] is committed or dropped.

pub mod client;
pub mod connection;
mod impls;

use deadpool_postgres::Runtime;
use derive_more::{Deref, Display, Error as StdError, From};
use tokio_postgres::NoTls;
use tracerr::Traced;

use crate::infra::database;
#[cfg(doc)]
use crate::infra::Database;

pub use deadpool_postgres::{Config, PoolConfig};
pub use refinery::embed_migrations;

pub use self::{
    client::{NonTx, Tx},
    connection::Connection,
};

/// Postgres [`Database`] client.
#[derive(Clone, Debug, Deref)]
pub struct Postgres<C = NonTx>(C);

impl Postgres {
    /// Creates a new [`Postgres`] client connecting with the provided
    /// [`Config`].
    ///
    /// No connection is established until the first statement is run.
    ///
    /// # Errors
    ///
    /// If the connection pool cannot be created out of the provided
    /// [`Config`].
    pub fn new(conf: &Config) -> Result<Self, Traced<database::Error>> {
        conf.create_pool(Some(Runtime::Tokio1), NoTls)
            .map(|pool| Self(NonTx::from_pool(pool)))
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)
    }
}

/// Postgres database [`Error`].
#[derive(Debug, Display, StdError, From)]
pub enum Error {
    /// Statement failed.
    #[display("Statement failed: {_0}")]
    Connection(connection::Error),

    /// Connection pool cannot be created.
    #[display("Failed to create `connection::Pool`: {_0}")]
    PoolCreationError(connection::PoolCreationError),

    /// Connection cannot be checked out of the pool.
    #[display("Failed to check out `connection::Pooled`: {_0}")]
    PoolError(connection::PoolError),
}
