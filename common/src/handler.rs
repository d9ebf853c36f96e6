//! [`Handler`] abstraction.

use std::future::Future;

/// Asynchronous handler of `Args`.
///
/// Commands, queries and storage operations are all [`Handler`]s, so they
/// compose by trait bounds only.
pub trait Handler<Args = ()> {
    /// Result of a successful handling.
    type Ok;

    /// Error of a failed handling.
    type Err;

    /// Handles the provided `args`.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}
