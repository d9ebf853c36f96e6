//! Raw pooled Postgres [`Connection`]s.

use std::{fmt, future::Future};

use futures::{FutureExt as _, TryFutureExt as _};
use ouroboros::self_referencing;
use tokio_postgres::{types::ToSql, Row};
use tracerr::Traced;
use tracing as log;

use crate::infra::database::{self, postgres};

pub use deadpool_postgres::{
    Client as Pooled, CreatePoolError as PoolCreationError, Pool, PoolError,
};
pub use tokio_postgres::Error;

/// Connection running SQL statements.
pub trait Connection {
    /// Runs the provided `sql` query and returns all the resulting rows.
    ///
    /// # Errors
    ///
    /// If the query fails.
    fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = Result<Vec<Row>, Traced<database::Error>>>;

    /// Runs the provided `sql` query and returns at most one resulting row.
    ///
    /// # Errors
    ///
    /// If the query fails or returns more than one row.
    fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = Result<Option<Row>, Traced<database::Error>>>;

    /// Runs the provided `sql` statement and returns the number of affected
    /// rows.
    ///
    /// # Errors
    ///
    /// If the statement fails.
    fn exec(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = Result<u64, Traced<database::Error>>>;
}

/// Open Postgres transaction owning the [`Pooled`] connection it runs in.
///
/// Rolls back when dropped uncommitted.
#[self_referencing]
pub struct Transaction {
    /// [`Pooled`] connection the transaction runs in.
    pooled: Pooled,

    /// Transaction itself, taken on commit.
    #[borrows(mut pooled)]
    #[not_covariant]
    inner: Option<deadpool_postgres::Transaction<'this>>,
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("inner", self.inner())
            .finish_non_exhaustive()
    }
}

impl Transaction {
    /// Begins a new [`Transaction`] in the provided [`Pooled`] connection.
    ///
    /// # Errors
    ///
    /// If Postgres refuses to begin the [`Transaction`].
    pub async fn begin(
        pooled: Pooled,
    ) -> Result<Self, Traced<database::Error>> {
        log::trace!("BEGIN");
        Self::try_new_async_send(pooled, |c| {
            c.transaction().map_ok(Some).boxed()
        })
        .await
        .map_err(tracerr::from_and_wrap!(=> postgres::Error))
        .map_err(tracerr::map_from)
    }

    /// Returns the open [`deadpool_postgres::Transaction`].
    fn inner(&self) -> &deadpool_postgres::Transaction<'_> {
        self.with_inner(|tx| tx.as_ref().expect("committed `Transaction`"))
    }

    /// Commits this [`Transaction`].
    ///
    /// # Errors
    ///
    /// If Postgres fails to commit this [`Transaction`].
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    pub async fn commit(mut self) -> Result<(), Traced<database::Error>> {
        log::trace!("COMMIT");
        #[expect(
            clippy::redundant_closure_for_method_calls,
            reason = "different variance, see \
                      https://doc.rust-lang.org/nomicon/subtyping.html#variance"
        )]
        self.with_inner_mut(|tx| tx.take())
            .expect("committed `Transaction`")
            .commit()
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

/// Implements [`Connection`] by running statements right in the
/// [`tokio_postgres`] client the provided expression evaluates to.
macro_rules! run_in {
    ($ty:ty, |$this:ident| $client:expr) => {
        impl Connection for $ty {
            async fn query(
                &self,
                sql: &str,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<Vec<Row>, Traced<database::Error>> {
                log::trace!(%sql, "query");
                let $this = self;
                $client
                    .query(sql, params)
                    .await
                    .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                    .map_err(tracerr::map_from)
            }

            async fn query_opt(
                &self,
                sql: &str,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<Option<Row>, Traced<database::Error>> {
                log::trace!(%sql, "query");
                let $this = self;
                $client
                    .query_opt(sql, params)
                    .await
                    .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                    .map_err(tracerr::map_from)
            }

            async fn exec(
                &self,
                sql: &str,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<u64, Traced<database::Error>> {
                log::trace!(%sql, "exec");
                let $this = self;
                $client
                    .execute(sql, params)
                    .await
                    .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                    .map_err(tracerr::map_from)
            }
        }
    };
}

run_in!(Pooled, |this| (***this));
run_in!(Transaction, |this| this.inner());
