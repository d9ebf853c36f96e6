//! [`Query`] definitions.
//!
//! Queries read committed state only, without taking any locks.

pub mod donation;
pub mod donations;
pub mod inventory;

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    infra::{database, Database},
    Service,
};

/// [`Query`] of the [`Service`].
pub use common::Handler as Query;

/// [`Query`] looking up a `W`hat in the [`Database`] by some key.
#[derive(Clone, Copy, Debug)]
pub struct Lookup<T>(T);

impl<W, B> Lookup<By<W, B>> {
    /// Looks up a `W`hat by the provided `key`.
    #[must_use]
    pub fn by(key: B) -> Self {
        Self(By::new(key))
    }
}

impl<Db, Clk, W, B> Query<Lookup<By<W, B>>> for Service<Db, Clk>
where
    Db: Database<Select<By<W, B>>, Ok = W, Err = Traced<database::Error>>,
{
    type Ok = W;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lookup(key): Lookup<By<W, B>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.database()
            .execute(Select(key))
            .await
            .map_err(tracerr::wrap!())
    }
}
