//! [`Command`] for accepting a whole [`Donation`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Clock,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

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

/// [`Command`] for accepting a whole [`donation::Status::NotAccepted`]
/// [`Donation`].
///
/// Of many recipients racing for the same [`Donation`] only the first one
/// to commit succeeds.
#[derive(Clone, Copy, Debug)]
pub struct AcceptDonation {
    /// Recipient accepting the [`Donation`].
    pub caller: Caller,

    /// ID of the [`Donation`] to accept.
    pub donation_id: donation::Id,
}

impl<Db, Clk> Command<AcceptDonation> for Service<Db, Clk>
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

    async fn execute(
        &self,
        cmd: AcceptDonation,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AcceptDonation {
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

        // Status must be re-checked under the lock, as another recipient may
        // have committed since this one has seen the `Donation`.
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
            .is_some_and(|l| l.locked_by != recipient_id)
        {
            return Err(tracerr::new!(E::Locked(donation_id)));
        }

        donation.accept(recipient_id, now);
        tx.execute(Update(donation.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!("`Donation(id: {donation_id})` accepted by `{recipient_id}`");

        Ok(donation)
    }
}

/// Error of [`AcceptDonation`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Donation`] is accepted already.
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
