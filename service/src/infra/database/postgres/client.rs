//! Lazily connected Postgres clients.
//!
//! Neither client takes a [`Pooled`] connection out of the [`Pool`] until
//! the first statement is run.

use std::{future::Future, sync::Arc};

use tokio::sync::{Mutex, RwLock, RwLockReadGuard};
use tokio_postgres::{types::ToSql, Row};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{
        self,
        connection::{Pool, Pooled, Transaction},
        Connection,
    },
};

/// Lazily initialized value shared between clones of a client.
type Slot<T> = Arc<RwLock<Option<T>>>;

/// Returns the value of the provided [`Slot`], initializing it with the
/// provided `init` if it's empty yet.
async fn get_or_init<T, F, Fut>(
    slot: &RwLock<Option<T>>,
    init: F,
) -> Result<RwLockReadGuard<'_, T>, Traced<database::Error>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, Traced<database::Error>>>,
{
    let read = slot.read().await;
    let guard = if read.is_some() {
        read
    } else {
        drop(read);

        let mut write = slot.write().await;
        if write.is_none() {
            *write = Some(init().await.map_err(tracerr::wrap!())?);
        }
        write.downgrade()
    };

    Ok(RwLockReadGuard::map(guard, |v| {
        v.as_ref().expect("cannot be emptied while guard is alive")
    }))
}

/// Takes a new [`Pooled`] connection out of the provided [`Pool`].
///
/// # Errors
///
/// If the [`Pool`] fails to provide a connection.
pub(crate) async fn checkout(
    pool: &Pool,
) -> Result<Pooled, Traced<database::Error>> {
    pool.get()
        .await
        .map_err(tracerr::from_and_wrap!(=> postgres::Error))
        .map_err(tracerr::map_from)
}

/// Non-transactional Postgres client.
///
/// Every statement is committed on its own.
#[derive(Clone, Debug)]
pub struct NonTx {
    /// [`Pool`] to check connections out of.
    pub(crate) pool: Pool,

    /// [`Pooled`] connection, once checked out.
    pooled: Slot<Pooled>,
}

impl NonTx {
    /// Creates a new [`NonTx`] client upon the provided [`Pool`].
    #[must_use]
    pub(crate) fn from_pool(pool: Pool) -> Self {
        Self {
            pool,
            pooled: Slot::default(),
        }
    }

    /// Returns the [`Pooled`] connection of this [`NonTx`] client, checking
    /// it out if needed.
    async fn pooled(
        &self,
    ) -> Result<RwLockReadGuard<'_, Pooled>, Traced<database::Error>> {
        get_or_init(&self.pooled, || checkout(&self.pool)).await
    }

    /// Takes the [`Pooled`] connection away from this [`NonTx`] client, if it
    /// has any.
    async fn release(&self) -> Option<Pooled> {
        self.pooled.write().await.take()
    }
}

/// Transactional Postgres client.
///
/// Clones share the same [`Transaction`], which is begun on the first
/// statement and rolled back if the last clone is dropped uncommitted.
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`Pool`] to check a connection out of, if the [`NonTx`] client has
    /// none.
    pool: Pool,

    /// [`NonTx`] client this [`Tx`] is started from, until its connection is
    /// reused.
    origin: Arc<Mutex<Option<NonTx>>>,

    /// Begun [`Transaction`].
    tx: Slot<Transaction>,
}

impl Tx {
    /// Starts a new [`Tx`] client upon the provided [`NonTx`] one.
    #[must_use]
    pub fn from_non_tx(client: NonTx) -> Self {
        Self {
            pool: client.pool.clone(),
            origin: Arc::new(Mutex::new(Some(client))),
            tx: Slot::default(),
        }
    }

    /// Returns the [`Transaction`] of this [`Tx`] client, beginning it if
    /// needed.
    async fn transaction(
        &self,
    ) -> Result<RwLockReadGuard<'_, Transaction>, Traced<database::Error>>
    {
        get_or_init(&self.tx, || async {
            let origin = self.origin.lock().await.take();
            let reused = match origin {
                Some(client) => client.release().await,
                None => None,
            };
            let pooled = match reused {
                Some(pooled) => pooled,
                None => checkout(&self.pool).await.map_err(tracerr::wrap!())?,
            };
            Transaction::begin(pooled).await.map_err(tracerr::wrap!())
        })
        .await
    }

    /// Commits this [`Tx`] client.
    ///
    /// Nothing is done if no statement has been run.
    ///
    /// # Errors
    ///
    /// If Postgres fails to commit the [`Transaction`].
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let Some(tx) = self.tx.write().await.take() else {
            return Ok(());
        };
        tx.commit().await.map_err(tracerr::wrap!())
    }
}

/// Implements [`Connection`] by running statements in the [`Connection`]
/// provided by the specified lazy accessor.
macro_rules! run_lazily_in {
    ($ty:ty, $accessor:ident) => {
        impl Connection for $ty {
            async fn query(
                &self,
                sql: &str,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<Vec<Row>, Traced<database::Error>> {
                self.$accessor()
                    .await
                    .map_err(tracerr::wrap!())?
                    .query(sql, params)
                    .await
                    .map_err(tracerr::wrap!())
            }

            async fn query_opt(
                &self,
                sql: &str,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<Option<Row>, Traced<database::Error>> {
                self.$accessor()
                    .await
                    .map_err(tracerr::wrap!())?
                    .query_opt(sql, params)
                    .await
                    .map_err(tracerr::wrap!())
            }

            async fn exec(
                &self,
                sql: &str,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<u64, Traced<database::Error>> {
                self.$accessor()
                    .await
                    .map_err(tracerr::wrap!())?
                    .exec(sql, params)
                    .await
                    .map_err(tracerr::wrap!())
            }
        }
    };
}

run_lazily_in!(NonTx, pooled);
run_lazily_in!(Tx, transaction);
