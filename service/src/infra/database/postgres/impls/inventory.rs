//! [`inventory::Entry`]-related [`Database`] implementations.

use common::operations::{By, Insert, Lock, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{inventory, user},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Builds an [`inventory::Entry`] out of the provided [`Row`].
fn entry_from_row(row: &Row) -> inventory::Entry {
    inventory::Entry {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        name: row.get("name"),
        expiry_date: row.get("expiry_date"),
        quantity: row.get("quantity"),
        category: row.get("category"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<inventory::Entry>, inventory::Id>>>
    for Postgres<C>
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

        const SQL: &str = "\
            SELECT id, owner_id, name, \
                   expiry_date, quantity, category, \
                   created_at \
            FROM inventory \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(entry_from_row))
    }
}

impl<C> Database<Select<By<Vec<inventory::Entry>, user::Id>>> for Postgres<C>
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

        const SQL: &str = "\
            SELECT id, owner_id, name, \
                   expiry_date, quantity, category, \
                   created_at \
            FROM inventory \
            WHERE owner_id = $1::UUID \
              AND quantity > 0 \
            ORDER BY expiry_date ASC, created_at ASC, id ASC";
        Ok(self
            .query(SQL, &[&owner_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(entry_from_row)
            .collect())
    }
}

impl<C> Database<Insert<inventory::Entry>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Update<inventory::Entry>,
        Ok = (),
        Err = Traced<database::Error>,
    >,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(entry): Insert<inventory::Entry>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(entry)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<inventory::Entry>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(entry): Update<inventory::Entry>,
    ) -> Result<Self::Ok, Self::Err> {
        let inventory::Entry {
            id,
            owner_id,
            name,
            expiry_date,
            quantity,
            category,
            created_at,
        } = entry;

        const SQL: &str = "\
            INSERT INTO inventory (\
                id, owner_id, name, \
                expiry_date, quantity, category, \
                created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::VARCHAR, \
                $4::DATE, $5::INT4, $6::INT2, \
                $7::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET name = EXCLUDED.name, \
                expiry_date = EXCLUDED.expiry_date, \
                quantity = EXCLUDED.quantity, \
                category = EXCLUDED.category";
        self.exec(
            SQL,
            &[
                &id,
                &owner_id,
                &name,
                &expiry_date,
                &quantity,
                &category,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<inventory::Entry, inventory::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<inventory::Entry, inventory::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM inventory \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
