//! [`Database`] implementations of [`Memory`].

use std::cmp::Reverse;

use common::operations::{
    By, Commit, Delete, Insert, Lock, Select, Transact, Update,
};
use tracerr::Traced;

use super::{Change, Connection, Key, Memory, NonTx, Tables, Tx};
use crate::{
    domain::{donation, inventory, user, Donation},
    infra::{database, Database},
    read::{self, donation::list::Selector},
};

impl Database<Transact> for Memory<NonTx> {
    type Ok = Memory<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(Memory(Tx::from_non_tx(&self.0)))
    }
}

impl Database<Transact> for Memory<Tx> {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        self.0.commit().await;
        Ok(())
    }
}

impl<C> Database<Select<By<Option<inventory::Entry>, inventory::Id>>>
    for Memory<C>
where
    C: Connection,
{
    type Ok = Option<inventory::Entry>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<inventory::Entry>, inventory::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        Ok(self.select(|t| t.inventory.get(&id).cloned()).await)
    }
}

impl<C> Database<Select<By<Vec<inventory::Entry>, user::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Vec<inventory::Entry>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<inventory::Entry>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let owner_id = by.into_inner();

        let mut entries = self
            .select(|t| {
                t.inventory
                    .values()
                    .filter(|e| e.owner_id == owner_id && !e.quantity.is_zero())
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .await;
        entries.sort_by_key(|e| (e.expiry_date, e.created_at, e.id));
        Ok(entries)
    }
}

impl<C> Database<Insert<inventory::Entry>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(entry): Insert<inventory::Entry>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(Change::Entry(entry)).await;
        Ok(())
    }
}

impl<C> Database<Update<inventory::Entry>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(entry): Update<inventory::Entry>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(Change::Entry(entry)).await;
        Ok(())
    }
}

impl<C> Database<Lock<By<inventory::Entry, inventory::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<inventory::Entry, inventory::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.lock(Key::Entry(by.into_inner())).await;
        Ok(())
    }
}

impl<C> Database<Select<By<Option<Donation>, donation::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Option<Donation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Donation>, donation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        Ok(self.select(|t| t.donations.get(&id).cloned()).await)
    }
}

impl<C> Database<Insert<Donation>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(donation): Insert<Donation>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(Change::Donation(donation.id, Some(donation)))
            .await;
        Ok(())
    }
}

impl<C> Database<Update<Donation>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(donation): Update<Donation>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(Change::Donation(donation.id, Some(donation)))
            .await;
        Ok(())
    }
}

impl<C> Database<Delete<By<Donation, donation::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Donation, donation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(Change::Donation(by.into_inner(), None)).await;
        Ok(())
    }
}

impl<C> Database<Lock<By<Donation, donation::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Donation, donation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.lock(Key::Donation(by.into_inner())).await;
        Ok(())
    }
}

impl<C> Database<Select<By<Vec<read::Donation>, Selector>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Vec<read::Donation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<read::Donation>, Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        use donation::Status as S;

        let selector = by.into_inner();
        let matches = |d: &Donation| match selector {
            Selector::ForDonor(id) => d.donor_id == id,
            Selector::AvailableFor(id) => d.is_available_for(id),
            Selector::AcceptedBy(id) => {
                d.status == S::Accepted && d.accepted_by == Some(id)
            }
            Selector::CompletedFor(id) => {
                d.status == S::Completed && d.accepted_by == Some(id)
            }
        };

        let mut list = self
            .select(|t| {
                t.donations
                    .values()
                    .filter(|d| matches(d))
                    .filter_map(|d| project(t, d))
                    .collect::<Vec<_>>()
            })
            .await;
        if matches!(selector, Selector::CompletedFor(_)) {
            list.sort_by_key(|d| (Reverse(d.picked_up_at), d.id));
        } else {
            list.sort_by_key(|d| (Reverse(d.donated_at), d.id));
        }
        Ok(list)
    }
}

impl<C> Database<Select<By<Option<read::Donation>, donation::Id>>>
    for Memory<C>
where
    C: Connection,
{
    type Ok = Option<read::Donation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<read::Donation>, donation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        Ok(self
            .select(|t| t.donations.get(&id).and_then(|d| project(t, d)))
            .await)
    }
}

/// Joins the provided [`Donation`] with the [`inventory::Entry`]s of its
/// items.
///
/// Items of missing [`inventory::Entry`]s are skipped, and a [`Donation`]
/// left without items isn't projected at all.
fn project(tables: &Tables, donation: &Donation) -> Option<read::Donation> {
    let items = donation
        .items
        .iter()
        .filter_map(|i| {
            let entry = tables.inventory.get(&i.inventory_id)?;
            Some(read::donation::Item {
                inventory_id: i.inventory_id,
                name: entry.name.clone(),
                quantity: i.quantity,
                expiry_date: i.expiry_date,
                category: i.category,
            })
        })
        .collect::<Vec<_>>();
    if items.is_empty() {
        return None;
    }

    Some(read::Donation {
        id: donation.id,
        donor_id: donation.donor_id,
        status: donation.status,
        accepted_by: donation.accepted_by,
        lock: donation.lock,
        pickup: donation.pickup.clone(),
        donated_at: donation.donated_at,
        accepted_at: donation.accepted_at,
        picked_up_at: donation.picked_up_at,
        items,
    })
}
