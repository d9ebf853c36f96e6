//! [`Command`] for locking a [`Donation`] for review.

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Clock,
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

/// [`Command`] for placing a review [`DonationLock`] on a
/// [`donation::Status::NotAccepted`] [`Donation`].
///
/// The [`DonationLock`] is advisory: it only keeps other recipients from
/// reviewing the same [`Donation`] at the same time. A [`DonationLock`]
/// older than [`Config::donation_lock_ttl`] is reclaimed silently.
///
/// [`Config::donation_lock_ttl`]: crate::Config::donation_lock_ttl
#[derive(Clone, Copy, Debug)]
pub struct LockDonation {
    /// Recipient reviewing the [`Donation`].
    pub caller: Caller,

    /// ID of the [`Donation`] to lock.
    pub donation_id: donation::Id,
}

impl<Db, Clk> Command<LockDonation> for Service<Db, Clk>
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
    Clk: Clock,
{
    type Ok = Donation;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: LockDonation) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let LockDonation {
            caller,
            donation_id,
        } = cmd;

        let recipient_id = caller
            .require(Role::Recipient)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid two recipients taking the same lock.
        tx.execute(Lock(By::<Donation, _>::new(donation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut donation = tx
            .execute(Select(By::<Option<Donation>, _>::new(donation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::DonationNotExists(donation_id))
            .map_err(tracerr::wrap!())?;
        if donation.status != donation::Status::NotAccepted {
            return Err(tracerr::new!(E::AlreadyAccepted(donation_id)));
        }

        let now = self.now();
        if donation
            .active_lock(now, self.config().donation_lock_ttl)
            .is_some()
        {
            log::debug!(
                "`Donation(id: {donation_id})` lock refused to `{recipient_id}`",
            );
            return Err(tracerr::new!(E::Locked(donation_id)));
        }

        donation.lock(recipient_id, now);
        tx.execute(Update(donation.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::debug!("`Donation(id: {donation_id})` locked by `{recipient_id}`");

        Ok(donation)
    }
}

/// Error of [`LockDonation`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Donation`] is not open for acceptance anymore.
    #[display("`Donation(id: {_0})` is already accepted")]
    #[from(ignore)]
    AlreadyAccepted(#[error(not(source))] donation::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Donation`] doesn't exist.
    #[display("`Donation(id: {_0})` does not exist")]
    #[from(ignore)]
    DonationNotExists(#[error(not(source))] donation::Id),

    /// [`Donation`] is under review by another recipient.
    #[display("`Donation(id: {_0})` is locked for review")]
    #[from(ignore)]
    Locked(#[error(not(source))] donation::Id),

    /// [`Caller`] is not a recipient.
    #[display("{_0}")]
    Role(user::RoleError),
}
