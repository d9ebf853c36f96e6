//! [`Database`] back-ends.
//!
//! [`Postgres`] is the production one, while [`Memory`] keeps everything in
//! process, honoring the same locking and transaction semantics.

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use derive_more::{Display, Error as StdError, From};

pub use self::memory::Memory;
#[cfg(feature = "postgres")]
pub use self::postgres::Postgres;

/// Storage [`operations`] executed by a back-end.
///
/// [`operations`]: common::operations
pub use common::Handler as Database;

/// Failure of a [`Database`] back-end.
///
/// [`Memory`] never fails, so it has no variant here.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// [`Postgres`] failure.
    #[cfg(feature = "postgres")]
    Postgres(postgres::Error),
}
