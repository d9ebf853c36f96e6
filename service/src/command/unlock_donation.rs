//! [`Command`] for unlocking a [`Donation`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::donation::Lock as DonationLock;
use crate::{
    domain::{
        donation,
        user::{self, Caller, Role},
        Donation,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for lifting a review [`DonationLock`] from a [`Donation`].
///
/// Idempotent: unlocking an unlocked or missing [`Donation`] succeeds.
#[derive(Clone, Copy, Debug)]
pub struct UnlockDonation {
    /// Recipient cancelling the review.
    pub caller: Caller,

    /// ID of the [`Donation`] to unlock.
    pub donation_id: donation::Id,
}

impl<Db, Clk> Command<UnlockDonation> for Service<Db, Clk>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Donation, donation::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Donation>, donation::Id>>,
            Ok = Option<Donation>,
            Err = Traced<database::Error>,
        > + Database<Update<Donation>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UnlockDonation,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UnlockDonation {
            caller,
            donation_id,
        } = cmd;

        _ = caller
            .require(Role::Recipient)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<Donation, _>::new(donation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let Some(mut donation) = tx
            .execute(Select(By::<Option<Donation>, _>::new(donation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|d| d.lock.is_some())
        else {
            return Ok(());
        };

        donation.unlock();
        tx.execute(Update(donation))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::debug!("`Donation(id: {donation_id})` unlocked");

        Ok(())
    }
}

/// Error of [`UnlockDonation`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Caller`] is not a recipient.
    #[display("{_0}")]
    Role(user::RoleError),
}
