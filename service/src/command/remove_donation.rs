//! [`Command`] for removing a [`Donation`].

use common::{
    operations::{
        By, Commit, Delete, Lock, Select, Transact, Transacted, Update,
    },
    Clock,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        donation, inventory,
        user::{self, Caller, Role},
        Donation,
    },
    infra::{database, Database},
    ledger::{self, Credit, Ledger},
    Service,
};

use super::Command;

/// [`Command`] for removing a [`donation::Status::NotAccepted`] [`Donation`]
/// by its donor, putting its items back into stock.
#[derive(Clone, Copy, Debug)]
pub struct RemoveDonation {
    /// Donor who made the [`Donation`].
    pub caller: Caller,

    /// ID of the [`Donation`] to remove.
    pub donation_id: donation::Id,
}

impl<Db, Clk> Command<RemoveDonation> for Service<Db, Clk>
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
        > + Database<
            Delete<By<Donation, donation::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<inventory::Entry, inventory::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<inventory::Entry>, inventory::Id>>,
            Ok = Option<inventory::Entry>,
            Err = Traced<database::Error>,
        > + Database<
            Update<inventory::Entry>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Commit, Ok = (), Err = Traced<database::Error>>,
    Clk: Clock,
{
    type Ok = Donation;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RemoveDonation,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RemoveDonation {
            caller,
            donation_id,
        } = cmd;

        let donor_id = caller
            .require(Role::Donor)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<Donation, _>::new(donation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let donation = tx
            .execute(Select(By::<Option<Donation>, _>::new(donation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::DonationNotExists(donation_id))
            .map_err(tracerr::wrap!())?;
        if donation.donor_id != donor_id {
            return Err(tracerr::new!(E::NotOwner(donation_id)));
        }
        if donation.status != donation::Status::NotAccepted {
            return Err(tracerr::new!(E::AlreadyAccepted(donation_id)));
        }
        if donation
            .active_lock(self.now(), self.config().donation_lock_ttl)
            .is_some()
        {
            return Err(tracerr::new!(E::Locked(donation_id)));
        }

        Ledger::new(&tx)
            .execute(Credit {
                owner_id: donor_id,
                lines: donation
                    .items
                    .iter()
                    .map(|i| ledger::Line {
                        entry_id: i.inventory_id,
                        quantity: i.quantity,
                    })
                    .collect(),
            })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Delete(By::<Donation, _>::new(donation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!("`Donation(id: {donation_id})` removed by its donor");

        Ok(donation)
    }
}

/// Error of [`RemoveDonation`] [`Command`] execution.
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

    /// [`Ledger`] refused to restore the stock.
    #[display("{_0}")]
    Ledger(ledger::ExecutionError),

    /// [`Donation`] is under review by a recipient.
    #[display("`Donation(id: {_0})` is locked for review")]
    #[from(ignore)]
    Locked(#[error(not(source))] donation::Id),

    /// [`Donation`] is made by another donor.
    #[display("`Donation(id: {_0})` is made by another donor")]
    #[from(ignore)]
    NotOwner(#[error(not(source))] donation::Id),

    /// [`Caller`] is not a donor.
    #[display("{_0}")]
    Role(user::RoleError),
}
