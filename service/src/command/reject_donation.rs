//! [`Command`] for rejecting a [`Donation`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
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

/// [`Command`] for declining a [`Donation`], hiding it from the listings of
/// the rejecting recipient.
///
/// Never changes [`donation::Status`]. Rejecting twice is a no-op.
#[derive(Clone, Copy, Debug)]
pub struct RejectDonation {
    /// Recipient declining the [`Donation`].
    pub caller: Caller,

    /// ID of the [`Donation`] to decline.
    pub donation_id: donation::Id,
}

impl<Db, Clk> Command<RejectDonation> for Service<Db, Clk>
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
    type Ok = Donation;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RejectDonation,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RejectDonation {
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

        // Avoid losing concurrent rejections.
        tx.execute(Lock(By::<Donation, _>::new(donation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut donation = tx
            .execute(Select(By::<Option<Donation>, _>::new(donation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::DonationNotExists(donation_id))
            .map_err(tracerr::wrap!())?;
        if !donation.reject(recipient_id) {
            return Ok(donation);
        }

        tx.execute(Update(donation.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::debug!("`Donation(id: {donation_id})` rejected by `{recipient_id}`");

        Ok(donation)
    }
}

/// Error of [`RejectDonation`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Donation`] doesn't exist.
    #[display("`Donation(id: {_0})` does not exist")]
    #[from(ignore)]
    DonationNotExists(#[error(not(source))] donation::Id),

    /// [`Caller`] is not a recipient.
    #[display("{_0}")]
    Role(user::RoleError),
}
