//! [`Command`] for making a new [`Donation`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted, Update},
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
    ledger::{self, Debit, Ledger},
    Service,
};

use super::Command;

/// [`Command`] for making a new [`Donation`] out of the stock of a donor.
///
/// Stock is debited and the [`Donation`] is stored in the same transaction.
#[derive(Clone, Debug)]
pub struct Donate {
    /// Donor making the [`Donation`].
    pub caller: Caller,

    /// [`ledger::Line`]s to donate.
    pub lines: Vec<ledger::Line>,
}

impl<Db, Clk> Command<Donate> for Service<Db, Clk>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
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
        > + Database<Insert<Donation>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
    Clk: Clock,
{
    type Ok = Donation;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: Donate) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let Donate { caller, lines } = cmd;

        let donor_id = caller
            .require(Role::Donor)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        let lines = ledger::merge(lines).map_err(tracerr::from_and_wrap!(=> E))?;
        if lines.is_empty() {
            return Err(tracerr::new!(E::NoItems));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let debited = Ledger::new(&tx)
            .execute(Debit {
                owner_id: donor_id,
                lines: lines.clone(),
            })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let items = lines
            .iter()
            .filter_map(|l| {
                debited.get(&l.entry_id).map(|entry| donation::Item {
                    inventory_id: l.entry_id,
                    quantity: l.quantity,
                    expiry_date: entry.expiry_date,
                    category: entry.category,
                })
            })
            .collect();
        let donation = Donation::new(donor_id, items, self.now());

        tx.execute(Insert(donation.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!(
            "`Donation(id: {})` of {} items made by `{donor_id}`",
            donation.id,
            donation.items.len(),
        );

        Ok(donation)
    }
}

/// Error of [`Donate`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Ledger`] refused the debit.
    #[display("{_0}")]
    #[from]
    Ledger(ledger::ExecutionError),

    /// No lines are provided.
    #[display("`Donation` must contain at least one item")]
    NoItems,

    /// [`Caller`] is not a donor.
    #[display("{_0}")]
    #[from]
    Role(user::RoleError),
}
