//! [`Command`] for completing a [`Donation`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Clock,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        donation::{self, Status},
        user::{self, Caller, Role},
        Donation,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for marking a [`Status::Accepted`] [`Donation`] as picked up
/// by the recipient who accepted it.
#[derive(Clone, Copy, Debug)]
pub struct CompleteDonation {
    /// Recipient who accepted the [`Donation`].
    pub caller: Caller,

    /// ID of the picked up [`Donation`].
    pub donation_id: donation::Id,
}

impl<Db, Clk> Command<CompleteDonation> for Service<Db, Clk>
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
        cmd: CompleteDonation,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CompleteDonation {
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

        tx.execute(Lock(By::<Donation, _>::new(donation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut donation = tx
            .execute(Select(By::<Option<Donation>, _>::new(donation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::DonationNotExists(donation_id))
            .map_err(tracerr::wrap!())?;
        match donation.status {
            Status::NotAccepted => {
                return Err(tracerr::new!(E::NotAccepted(donation_id)));
            }
            Status::Accepted | Status::Completed
                if donation.accepted_by != Some(recipient_id) =>
            {
                return Err(tracerr::new!(E::NotAcceptor(donation_id)));
            }
            Status::Completed => {
                return Err(tracerr::new!(E::AlreadyCompleted(donation_id)));
            }
            Status::Accepted => {}
        }

        donation.complete(self.now());
        tx.execute(Update(donation.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!("`Donation(id: {donation_id})` picked up by `{recipient_id}`");

        Ok(donation)
    }
}

/// Error of [`CompleteDonation`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Donation`] is picked up already.
    #[display("`Donation(id: {_0})` is already completed")]
    #[from(ignore)]
    AlreadyCompleted(#[error(not(source))] donation::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Donation`] doesn't exist.
    #[display("`Donation(id: {_0})` does not exist")]
    #[from(ignore)]
    DonationNotExists(#[error(not(source))] donation::Id),

    /// [`Donation`] is not accepted.
    #[display("`Donation(id: {_0})` is not accepted")]
    #[from(ignore)]
    NotAccepted(#[error(not(source))] donation::Id),

    /// [`Donation`] is accepted by another recipient.
    #[display("`Donation(id: {_0})` is accepted by another recipient")]
    #[from(ignore)]
    NotAcceptor(#[error(not(source))] donation::Id),

    /// [`Caller`] is not a recipient.
    #[display("{_0}")]
    Role(user::RoleError),
}
