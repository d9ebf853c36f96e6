//! Inventory [`Ledger`] definitions.

use std::collections::{BTreeMap, HashMap};

use common::{
    operations::{By, Lock, Select, Update},
    Handler,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{inventory, user},
    infra::{database, Database},
};

/// Guarded debits and credits of [`inventory::Entry`]s.
///
/// Never opens or commits a transaction on its own: all the changes it makes
/// are part of the transaction it's created upon.
#[derive(Clone, Copy, Debug)]
pub struct Ledger<'tx, Tx>(&'tx Tx);

impl<'tx, Tx> Ledger<'tx, Tx> {
    /// Creates a new [`Ledger`] operating within the provided transaction.
    #[must_use]
    pub const fn new(tx: &'tx Tx) -> Self {
        Self(tx)
    }
}

/// Single [`inventory::Entry`] change.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Line {
    /// ID of the changed [`inventory::Entry`].
    pub entry_id: inventory::Id,

    /// [`inventory::Quantity`] to change the [`inventory::Entry`] by.
    pub quantity: inventory::Quantity,
}

/// Merges [`Line`]s of the same [`inventory::Entry`] together, preserving
/// the order [`inventory::Entry`]s are first seen in.
///
/// # Errors
///
/// - [`ExecutionError::InvalidQuantity`] if any [`Line`] is of zero
///   [`inventory::Quantity`].
/// - [`ExecutionError::QuantityOverflow`] if the merged
///   [`inventory::Quantity`] cannot be represented.
pub fn merge<I>(lines: I) -> Result<Vec<Line>, ExecutionError>
where
    I: IntoIterator<Item = Line>,
{
    use ExecutionError as E;

    let mut positions = HashMap::<inventory::Id, usize>::new();
    let mut merged = Vec::<Line>::new();
    for line in lines {
        if line.quantity.is_zero() {
            return Err(E::InvalidQuantity(line.entry_id));
        }
        if let Some(&pos) = positions.get(&line.entry_id) {
            let quantity = &mut merged[pos].quantity;
            *quantity = quantity.checked_add(line.quantity).ok_or(
                E::QuantityOverflow(inventory::QuantityOverflow(line.entry_id)),
            )?;
        } else {
            _ = positions.insert(line.entry_id, merged.len());
            merged.push(line);
        }
    }
    Ok(merged)
}

/// Takes stock out of the [`inventory::Entry`]s of a donor, all or nothing.
#[derive(Clone, Debug)]
pub struct Debit {
    /// ID of the donor owning the debited [`inventory::Entry`]s.
    pub owner_id: user::Id,

    /// [`Line`]s to debit.
    pub lines: Vec<Line>,
}

/// Puts stock back into the [`inventory::Entry`]s of a donor, all or nothing.
#[derive(Clone, Debug)]
pub struct Credit {
    /// ID of the donor owning the credited [`inventory::Entry`]s.
    pub owner_id: user::Id,

    /// [`Line`]s to credit.
    pub lines: Vec<Line>,
}

impl<Tx> Handler<Debit> for Ledger<'_, Tx>
where
    Tx: Database<
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
        >,
{
    /// Debited [`inventory::Entry`]s in their updated state.
    type Ok = HashMap<inventory::Id, inventory::Entry>;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, debit: Debit) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let Debit { owner_id, lines } = debit;

        let mut debited = HashMap::with_capacity(lines.len());
        for (entry_id, quantity) in sorted(lines).map_err(tracerr::wrap!())? {
            let mut entry = self
                .select_locked(owner_id, entry_id)
                .await
                .map_err(tracerr::wrap!())?;
            entry
                .debit(quantity)
                .map_err(tracerr::from_and_wrap!(=> E))?;

            self.0
                .execute(Update(entry.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            _ = debited.insert(entry_id, entry);
        }
        Ok(debited)
    }
}

impl<Tx> Handler<Credit> for Ledger<'_, Tx>
where
    Tx: Database<
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
        >,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(&self, credit: Credit) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let Credit { owner_id, lines } = credit;

        for (entry_id, quantity) in sorted(lines).map_err(tracerr::wrap!())? {
            let mut entry = self
                .select_locked(owner_id, entry_id)
                .await
                .map_err(tracerr::wrap!())?;
            entry
                .credit(quantity)
                .map_err(tracerr::from_and_wrap!(=> E))?;

            self.0
                .execute(Update(entry))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
        }
        Ok(())
    }
}

impl<Tx> Ledger<'_, Tx>
where
    Tx: Database<
            Lock<By<inventory::Entry, inventory::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<inventory::Entry>, inventory::Id>>,
            Ok = Option<inventory::Entry>,
            Err = Traced<database::Error>,
        >,
{
    /// Locks and re-reads the [`inventory::Entry`] of the provided owner.
    async fn select_locked(
        &self,
        owner_id: user::Id,
        entry_id: inventory::Id,
    ) -> Result<inventory::Entry, Traced<ExecutionError>> {
        use ExecutionError as E;

        self.0
            .execute(Lock(By::new(entry_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        self.0
            .execute(Select(By::<Option<inventory::Entry>, _>::new(entry_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|e| e.owner_id == owner_id)
            .ok_or(E::EntryNotExists(entry_id))
            .map_err(tracerr::wrap!())
    }
}

/// Merges the provided [`Line`]s and orders them by [`inventory::Id`], so
/// concurrent [`Ledger`] operations lock [`inventory::Entry`]s in the same
/// order.
fn sorted(
    lines: Vec<Line>,
) -> Result<BTreeMap<inventory::Id, inventory::Quantity>, Traced<ExecutionError>>
{
    Ok(merge(lines)
        .map_err(tracerr::wrap!())?
        .into_iter()
        .map(|l| (l.entry_id, l.quantity))
        .collect())
}

/// Error of a [`Ledger`] operation.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`inventory::Entry`] doesn't exist or is owned by someone else.
    #[display("`InventoryEntry(id: {_0})` does not exist")]
    #[from(ignore)]
    EntryNotExists(#[error(not(source))] inventory::Id),

    /// Not enough stock to debit.
    #[display("Insufficient stock: {_0}")]
    InsufficientStock(inventory::InsufficientStock),

    /// Zero [`inventory::Quantity`] is requested.
    #[display("Zero quantity requested for `InventoryEntry(id: {_0})`")]
    #[from(ignore)]
    InvalidQuantity(#[error(not(source))] inventory::Id),

    /// Resulting [`inventory::Quantity`] cannot be represented.
    #[display("{_0}")]
    QuantityOverflow(inventory::QuantityOverflow),
}

#[cfg(test)]
mod spec {
    use super::{merge, ExecutionError, Line};
    use crate::domain::inventory;

    #[test]
    fn merges_duplicates_in_first_seen_order() {
        let (a, b) = (inventory::Id::new(), inventory::Id::new());
        let line = |entry_id, q: u32| Line {
            entry_id,
            quantity: q.into(),
        };

        let merged = merge([line(b, 1), line(a, 2), line(b, 3)]).unwrap();

        assert_eq!(merged, [line(b, 4), line(a, 2)]);
    }

    #[test]
    fn rejects_zero_quantity() {
        let a = inventory::Id::new();

        let err = merge([Line {
            entry_id: a,
            quantity: inventory::Quantity::ZERO,
        }])
        .unwrap_err();

        assert!(matches!(err, ExecutionError::InvalidQuantity(id) if id == a));
    }
}
