//! [`Command`] for setting a [`donation::Pickup`] location.

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

/// [`Command`] for setting a [`donation::Pickup`] location of a
/// [`donation::Status::NotAccepted`] [`Donation`].
#[derive(Clone, Debug)]
pub struct SetPickupLocation {
    /// Donor who made the [`Donation`].
    pub caller: Caller,

    /// ID of the [`Donation`] to set the location of.
    pub donation_id: donation::Id,

    /// New [`donation::Pickup`] location.
    pub pickup: donation::Pickup,
}

impl<Db, Clk> Command<SetPickupLocation> for Service<Db, Clk>
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
        cmd: SetPickupLocation,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SetPickupLocation {
            caller,
            donation_id,
            pickup,
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

        let mut donation = tx
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

        donation.pickup = Some(pickup);
        tx.execute(Update(donation.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::debug!("`Donation(id: {donation_id})` pickup location set");

        Ok(donation)
    }
}

/// Error of [`SetPickupLocation`] [`Command`] execution.
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

    /// [`Donation`] is made by another donor.
    #[display("`Donation(id: {_0})` is made by another donor")]
    #[from(ignore)]
    NotOwner(#[error(not(source))] donation::Id),

    /// [`Caller`] is not a donor.
    #[display("{_0}")]
    Role(user::RoleError),
}
