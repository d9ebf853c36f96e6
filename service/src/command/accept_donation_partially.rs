//! [`Command`] for accepting a part of a [`Donation`].

use common::{
    operations::{
        By, Commit, Delete, Insert, Lock, Select, Transact, Transacted, Update,
    },
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

/// [`Command`] for splitting the accepted part off a
/// [`donation::Status::NotAccepted`] [`Donation`] into a new
/// [`donation::Status::Accepted`] one.
///
/// The residual [`Donation`] is removed once nothing is left in it, and is
/// unlocked and made visible to the [`Caller`] again otherwise.
///
/// Unlike [`AcceptDonation`], a [`DonationLock`] of another recipient is not
/// checked here.
///
/// [`AcceptDonation`]: super::AcceptDonation
#[derive(Clone, Debug)]
pub struct AcceptDonationPartially {
    /// Recipient accepting the [`Donation`].
    pub caller: Caller,

    /// ID of the [`Donation`] to split.
    pub donation_id: donation::Id,

    /// Every line of the [`Donation`] with the accepted quantity.
    pub lines: Vec<donation::AcceptedLine>,
}

/// Result of an [`AcceptDonationPartially`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// New [`donation::Status::Accepted`] [`Donation`], unless nothing is
    /// accepted.
    pub accepted: Option<Donation>,

    /// What is left of the original [`Donation`], unless everything is
    /// accepted.
    pub residual: Option<Donation>,
}

impl<Db, Clk> Command<AcceptDonationPartially> for Service<Db, Clk>
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
        > + Database<Insert<Donation>, Ok = (), Err = Traced<database::Error>>
        + Database<Update<Donation>, Ok = (), Err = Traced<database::Error>>
        + Database<
            Delete<By<Donation, donation::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Commit, Ok = (), Err = Traced<database::Error>>,
    Clk: Clock,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AcceptDonationPartially,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AcceptDonationPartially {
            caller,
            donation_id,
            lines,
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

        let mut residual = tx
            .execute(Select(By::<Option<Donation>, _>::new(donation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::DonationNotExists(donation_id))
            .map_err(tracerr::wrap!())?;
        if residual.status != donation::Status::NotAccepted {
            return Err(tracerr::new!(E::AlreadyAccepted(donation_id)));
        }

        let accepted = residual
            .split(&lines, recipient_id, self.now())
            .map_err(tracerr::from_and_wrap!(=> E))?;

        if let Some(accepted) = &accepted {
            tx.execute(Insert(accepted.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
        }
        let residual = if residual.items.is_empty() {
            tx.execute(Delete(By::<Donation, _>::new(donation_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            None
        } else {
            tx.execute(Update(residual.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            Some(residual)
        };

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!(
            "`Donation(id: {donation_id})` split by `{recipient_id}`: \
             accepted as {}, {}",
            accepted
                .as_ref()
                .map_or_else(|| "nothing".into(), |d| d.id.to_string()),
            if residual.is_some() { "residual kept" } else { "removed" },
        );

        Ok(Output { accepted, residual })
    }
}

/// Error of [`AcceptDonationPartially`] [`Command`] execution.
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

    /// [`Caller`] is not a recipient.
    #[display("{_0}")]
    Role(user::RoleError),

    /// Provided lines don't fit the [`Donation`].
    #[display("{_0}")]
    Split(donation::SplitError),
}
