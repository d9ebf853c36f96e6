//! [`Database`] operations of [`Postgres`].

#![allow(
    clippy::items_after_statements,
    reason = "`const SQL` is declared next to its usage"
)]
#![allow(clippy::too_many_lines, reason = "SQL is verbose")]

mod donation;
mod inventory;

use async_trait::async_trait;
use common::operations::{Commit, Transact};
use refinery_core::{
    traits::r#async::{AsyncQuery, AsyncTransaction},
    AsyncMigrate, Migration,
};
use tracerr::Traced;

use crate::infra::{
    database::{self, postgres},
    Database,
};

use super::{client, connection::Pooled, NonTx, Postgres, Tx};

impl Database<Transact> for Postgres<NonTx> {
    type Ok = Postgres<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(Postgres(Tx::from_non_tx(self.0.clone())))
    }
}

/// Nested transactions are flattened into the outer one.
impl Database<Transact> for Postgres<Tx> {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Postgres<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        self.commit().await.map_err(tracerr::wrap!())
    }
}

impl Postgres {
    /// Checks out a dedicated [`Pooled`] connection to run migrations in.
    async fn migrator(&self) -> Result<Pooled, Traced<database::Error>> {
        client::checkout(&self.0.pool)
            .await
            .map_err(tracerr::wrap!())
    }
}

/// Converts a [`tokio_postgres::Error`] raised by a migration.
fn migration_error(e: tokio_postgres::Error) -> Traced<database::Error> {
    tracerr::map_from(tracerr::new!(postgres::Error::from(e)))
}

#[async_trait]
impl AsyncTransaction for Postgres {
    type Error = Traced<database::Error>;

    async fn execute(
        &mut self,
        queries: &[&str],
    ) -> Result<usize, Self::Error> {
        let mut conn = self.migrator().await?;
        AsyncTransaction::execute(&mut **conn, queries)
            .await
            .map_err(migration_error)
    }
}

#[async_trait]
impl AsyncQuery<Vec<Migration>> for Postgres {
    async fn query(
        &mut self,
        query: &str,
    ) -> Result<Vec<Migration>, <Self as AsyncTransaction>::Error> {
        let mut conn = self.migrator().await?;
        AsyncQuery::query(&mut **conn, query)
            .await
            .map_err(migration_error)
    }
}

impl AsyncMigrate for Postgres {}
