//! Storage operations, executed by a [`Handler`] of the storage.
//!
//! Within a [`Transact`]ed storage, the operations observe the changes made
//! earlier in the same transaction, and become visible to others only once
//! [`Commit`]ted.

use std::marker::PhantomData;

use crate::Handler;

/// Stores a new value.
#[derive(Clone, Copy, Debug)]
pub struct Insert<T>(pub T);

/// Overwrites a stored value.
#[derive(Clone, Copy, Debug)]
pub struct Update<T>(pub T);

/// Removes a stored value.
#[derive(Clone, Copy, Debug)]
pub struct Delete<T>(pub T);

/// Reads stored values.
#[derive(Clone, Copy, Debug)]
pub struct Select<T>(pub T);

/// Takes an exclusive lock on stored values, held until the transaction
/// ends.
///
/// Blocks while another transaction holds the same lock.
#[derive(Clone, Copy, Debug)]
pub struct Lock<T>(pub T);

/// Starts a transaction, returning a [`Transacted`] storage.
#[derive(Clone, Copy, Debug)]
pub struct Transact;

/// Storage running inside a transaction started by [`Transact`].
pub type Transacted<T> = <T as Handler<Transact>>::Ok;

/// Makes the changes of a [`Transacted`] storage durable and visible.
///
/// Dropping a [`Transacted`] storage without [`Commit`] discards them.
#[derive(Clone, Copy, Debug)]
pub struct Commit;

/// Selector of a `W`hat by the provided key `B`.
#[derive(Clone, Copy, Debug)]
pub struct By<W, B> {
    /// Key to select by.
    key: B,

    /// Selected type.
    _what: PhantomData<W>,
}

impl<W, B> By<W, B> {
    /// Selects a `W`hat by the provided `key`.
    #[must_use]
    pub fn new(key: B) -> Self {
        Self {
            key,
            _what: PhantomData,
        }
    }

    /// Returns the key to select by.
    #[must_use]
    pub fn into_inner(self) -> B {
        self.key
    }
}
