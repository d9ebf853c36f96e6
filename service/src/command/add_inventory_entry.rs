//! [`Command`] for adding a new [`inventory::Entry`].

use common::{operations::Insert, Clock, Date};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        inventory,
        user::{self, Caller, Role},
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for adding a new [`inventory::Entry`].
#[derive(Clone, Debug)]
pub struct AddInventoryEntry {
    /// Donor adding the [`inventory::Entry`].
    pub caller: Caller,

    /// [`inventory::Name`] of the stored item.
    pub name: inventory::Name,

    /// [`Date`] the stored item expires at.
    pub expiry_date: Date,

    /// [`inventory::Quantity`] in stock.
    pub quantity: inventory::Quantity,

    /// [`inventory::Category`] of the stored item.
    pub category: inventory::Category,
}

impl<Db, Clk> Command<AddInventoryEntry> for Service<Db, Clk>
where
    Db: Database<
        Insert<inventory::Entry>,
        Ok = (),
        Err = Traced<database::Error>,
    >,
    Clk: Clock,
{
    type Ok = inventory::Entry;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AddInventoryEntry,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AddInventoryEntry {
            caller,
            name,
            expiry_date,
            quantity,
            category,
        } = cmd;

        let owner_id = caller
            .require(Role::Donor)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        if quantity.is_zero() {
            return Err(tracerr::new!(E::InvalidQuantity));
        }

        let entry = inventory::Entry {
            id: inventory::Id::new(),
            owner_id,
            name,
            expiry_date,
            quantity,
            category,
            created_at: self.now().coerce(),
        };
        self.database()
            .execute(Insert(entry.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::debug!("`InventoryEntry(id: {})` added by `{owner_id}`", entry.id);

        Ok(entry)
    }
}

/// Error of [`AddInventoryEntry`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Zero [`inventory::Quantity`] is provided.
    #[display("`InventoryEntry` quantity must be positive")]
    InvalidQuantity,

    /// [`Caller`] is not a donor.
    #[display("{_0}")]
    #[from]
    Role(user::RoleError),
}
