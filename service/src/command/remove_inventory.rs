//! [`Command`] for removing stock from [`inventory::Entry`]s.

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        inventory,
        user::{self, Caller, Role},
    },
    infra::{database, Database},
    ledger::{self, Debit, Ledger},
    Service,
};

use super::Command;

/// [`Command`] for removing stock from [`inventory::Entry`]s of a donor
/// without donating it, all or nothing.
#[derive(Clone, Debug)]
pub struct RemoveInventory {
    /// Donor owning the [`inventory::Entry`]s.
    pub caller: Caller,

    /// [`ledger::Line`]s to remove.
    pub lines: Vec<ledger::Line>,
}

impl<Db, Clk> Command<RemoveInventory> for Service<Db, Clk>
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
        > + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    /// Changed [`inventory::Entry`]s in their updated state.
    type Ok = Vec<inventory::Entry>;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RemoveInventory,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RemoveInventory { caller, lines } = cmd;

        let owner_id = caller
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

        let mut debited = Ledger::new(&tx)
            .execute(Debit {
                owner_id,
                lines: lines.clone(),
            })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!("`{owner_id}` removed {} inventory lines", lines.len());

        Ok(lines
            .iter()
            .filter_map(|l| debited.remove(&l.entry_id))
            .collect())
    }
}

/// Error of [`RemoveInventory`] [`Command`] execution.
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
    #[display("No inventory lines provided")]
    NoItems,

    /// [`Caller`] is not a donor.
    #[display("{_0}")]
    #[from]
    Role(user::RoleError),
}
