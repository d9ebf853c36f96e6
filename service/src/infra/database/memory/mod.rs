//! In-memory [`Database`] implementation.
//!
//! Mirrors the guarantees of the [`Postgres`] one: reads see committed data
//! only (plus own changes inside a [`Tx`]), a [`Lock`]ed row stays exclusive
//! until its [`Tx`] is committed or dropped, and a dropped [`Tx`] discards
//! all its changes.
//!
//! [`Lock`]: common::operations::Lock
//! [`Postgres`]: super::Postgres

mod impls;

use std::{
    collections::HashMap,
    future::Future,
    mem,
    sync::{Arc, Mutex as SyncMutex, PoisonError},
};

use derive_more::Deref;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::domain::{donation, inventory, Donation};
#[cfg(doc)]
use crate::infra::Database;

/// In-memory [`Database`] client.
#[derive(Clone, Debug, Deref)]
pub struct Memory<C = NonTx>(C);

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self(NonTx(Arc::default()))
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

/// Committed rows of a [`Memory`] database.
#[derive(Clone, Debug, Default)]
pub struct Tables {
    /// Stored [`Donation`]s.
    pub donations: HashMap<donation::Id, Donation>,

    /// Stored [`inventory::Entry`]s.
    pub inventory: HashMap<inventory::Id, inventory::Entry>,
}

impl Tables {
    /// Applies the provided [`Change`] to these [`Tables`].
    fn apply(&mut self, change: Change) {
        match change {
            Change::Donation(id, Some(d)) => {
                _ = self.donations.insert(id, d);
            }
            Change::Donation(id, None) => {
                _ = self.donations.remove(&id);
            }
            Change::Entry(e) => {
                _ = self.inventory.insert(e.id, e);
            }
        }
    }
}

/// Row of a [`Memory`] database.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Key {
    /// [`Donation`] row.
    Donation(donation::Id),

    /// [`inventory::Entry`] row.
    Entry(inventory::Id),
}

/// Single row change.
#[derive(Clone, Debug)]
pub enum Change {
    /// [`Donation`] is upserted, or deleted if [`None`].
    Donation(donation::Id, Option<Donation>),

    /// [`inventory::Entry`] is upserted.
    Entry(inventory::Entry),
}

impl Change {
    /// Returns the [`Key`] of the row this [`Change`] touches.
    #[must_use]
    pub const fn key(&self) -> Key {
        match self {
            Self::Donation(id, _) => Key::Donation(*id),
            Self::Entry(e) => Key::Entry(e.id),
        }
    }
}

/// Shared storage of a [`Memory`] database.
#[derive(Debug, Default)]
struct Store {
    /// Committed [`Tables`].
    tables: RwLock<Tables>,

    /// Row locks, created on demand.
    ///
    /// Contains only the rows being locked or waited for, plus the ones
    /// released since the last [`Store::row_lock()`] call.
    locks: SyncMutex<HashMap<Key, Arc<Mutex<()>>>>,
}

impl Store {
    /// Returns the lock of the row with the provided [`Key`], forgetting the
    /// released ones.
    fn row_lock(&self, key: Key) -> Arc<Mutex<()>> {
        let mut locks =
            self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Held and awaited locks are shared with their guards and waiters.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(locks.entry(key).or_default())
    }
}

/// Generic [`Memory`] database connection.
pub trait Connection {
    /// Locks the row with the provided [`Key`] until the end of the current
    /// transaction, if any.
    fn lock(&self, key: Key) -> impl Future<Output = ()>;

    /// Reads the [`Tables`] visible to this [`Connection`] with the provided
    /// function.
    fn select<F, T>(&self, f: F) -> impl Future<Output = T>
    where
        F: FnOnce(&Tables) -> T;

    /// Writes the provided [`Change`].
    fn write(&self, change: Change) -> impl Future<Output = ()>;
}

/// Non-transactional [`Memory`] [`Connection`].
///
/// Every write is committed at once.
#[derive(Clone, Debug)]
pub struct NonTx(Arc<Store>);

impl Connection for NonTx {
    async fn lock(&self, _: Key) {
        // Nothing to hold the lock until.
    }

    async fn select<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&Tables) -> T,
    {
        f(&*self.0.tables.read().await)
    }

    async fn write(&self, change: Change) {
        let row = self.0.row_lock(change.key()).lock_owned().await;
        self.0.tables.write().await.apply(change);
        drop(row);
    }
}

/// Transactional [`Memory`] [`Connection`].
///
/// Clones share the same transaction.
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`Store`] this [`Tx`] is committed into.
    store: Arc<Store>,

    /// [`TxState`] of this [`Tx`].
    state: Arc<SyncMutex<TxState>>,
}

/// State of a [`Tx`].
#[derive(Debug, Default)]
struct TxState {
    /// Row locks held by the [`Tx`].
    held: HashMap<Key, OwnedMutexGuard<()>>,

    /// Uncommitted [`Change`]s, in order.
    changes: Vec<Change>,
}

impl Tx {
    /// Starts a new [`Tx`] upon the provided [`NonTx`] connection.
    #[must_use]
    pub fn from_non_tx(client: &NonTx) -> Self {
        Self {
            store: Arc::clone(&client.0),
            state: Arc::default(),
        }
    }

    /// Returns the [`TxState`] of this [`Tx`].
    fn state(&self) -> std::sync::MutexGuard<'_, TxState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Commits this [`Tx`], releasing all the row locks it holds.
    pub async fn commit(&self) {
        let state = mem::take(&mut *self.state());
        let mut tables = self.store.tables.write().await;
        for change in state.changes {
            tables.apply(change);
        }
        drop(tables);
        drop(state.held);
    }
}

impl Connection for Tx {
    async fn lock(&self, key: Key) {
        if self.state().held.contains_key(&key) {
            return;
        }
        let guard = self.store.row_lock(key).lock_owned().await;
        _ = self.state().held.insert(key, guard);
    }

    async fn select<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&Tables) -> T,
    {
        let changes = self.state().changes.clone();
        let committed = self.store.tables.read().await;
        if changes.is_empty() {
            return f(&committed);
        }

        let mut tables = committed.clone();
        drop(committed);
        for change in changes {
            tables.apply(change);
        }
        f(&tables)
    }

    async fn write(&self, change: Change) {
        self.state().changes.push(change);
    }
}

#[cfg(test)]
mod spec {
    use std::{sync::Arc, time::Duration};

    use common::{Date, DateTime};

    use super::{Change, Connection as _, Key, Memory, Tx};
    use crate::domain::{inventory, user};

    fn entry(quantity: u32) -> inventory::Entry {
        inventory::Entry {
            id: inventory::Id::new(),
            owner_id: user::Id::new(),
            name: inventory::Name::new("Apples").unwrap(),
            expiry_date: Date::from_calendar_date(2026, 11, 11).unwrap(),
            quantity: quantity.into(),
            category: inventory::Category::Grocery,
            created_at: DateTime::now().coerce(),
        }
    }

    async fn quantity(db: &Memory, id: inventory::Id) -> Option<u32> {
        db.select(|t| t.inventory.get(&id).map(|e| e.quantity.into()))
            .await
    }

    #[tokio::test]
    async fn commits_staged_changes() {
        let db = Memory::new();
        let e = entry(3);
        let tx = Tx::from_non_tx(&db);

        tx.write(Change::Entry(e.clone())).await;
        assert_eq!(tx.select(|t| t.inventory.len()).await, 1);
        assert_eq!(quantity(&db, e.id).await, None);

        tx.commit().await;
        assert_eq!(quantity(&db, e.id).await, Some(3));
    }

    #[tokio::test]
    async fn discards_dropped() {
        let db = Memory::new();
        let e = entry(3);

        let tx = Tx::from_non_tx(&db);
        tx.lock(Key::Entry(e.id)).await;
        tx.write(Change::Entry(e.clone())).await;
        drop(tx);

        assert_eq!(quantity(&db, e.id).await, None);
        // Lock is released as well.
        let tx = Tx::from_non_tx(&db);
        tokio::time::timeout(Duration::from_secs(1), tx.lock(Key::Entry(e.id)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn row_lock_is_exclusive_until_commit() {
        let db = Memory::new();
        let key = Key::Entry(inventory::Id::new());

        let first = Tx::from_non_tx(&db);
        first.lock(key).await;
        first.lock(key).await;

        let second = Arc::new(Tx::from_non_tx(&db));
        let waiting = tokio::spawn({
            let second = Arc::clone(&second);
            async move { second.lock(key).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiting.is_finished());

        first.commit().await;
        tokio::time::timeout(Duration::from_secs(1), waiting)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn forgets_released_row_locks() {
        let db = Memory::new();
        let (released, held) = (
            Key::Entry(inventory::Id::new()),
            Key::Entry(inventory::Id::new()),
        );

        let tx = Tx::from_non_tx(&db);
        tx.lock(released).await;
        tx.commit().await;

        let tx = Tx::from_non_tx(&db);
        tx.lock(held).await;

        let locks = db.0.0.locks.lock().unwrap();
        assert_eq!(locks.keys().copied().collect::<Vec<_>>(), [held]);
    }
}
