//! [`Donation`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Lock, Select, Update};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{donation, user, Donation},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::{self, donation::list::Selector},
};

/// Columns of the `donations` table, prefixed with `d.`.
const DONATION_COLUMNS: &str = "\
    d.id, d.donor_id, d.status, \
    d.accepted_by, d.rejected_by, \
    d.is_locked, d.locked_at, d.locked_by, \
    d.pickup_lat, d.pickup_lng, d.pickup_address, \
    d.donated_at, d.accepted_at, d.picked_up_at";

/// Reads a [`donation::Lock`] out of the provided [`Row`].
fn lock_from_row(row: &Row) -> Option<donation::Lock> {
    if !row.get::<_, bool>("is_locked") {
        return None;
    }
    Some(donation::Lock {
        locked_by: row.get::<_, Option<user::Id>>("locked_by")?,
        locked_at: row.get::<_, Option<donation::LockDateTime>>("locked_at")?,
    })
}

/// Reads a [`donation::Pickup`] location out of the provided [`Row`].
fn pickup_from_row(row: &Row) -> Option<donation::Pickup> {
    Some(donation::Pickup {
        lat: donation::Latitude::new(row.get::<_, Option<f64>>("pickup_lat")?)?,
        lng: donation::Longitude::new(
            row.get::<_, Option<f64>>("pickup_lng")?,
        )?,
        address: row.get::<_, Option<donation::Address>>("pickup_address")?,
    })
}

/// Builds a [`read::Donation`] without items out of the provided [`Row`].
fn header_from_row(row: &Row) -> read::Donation {
    read::Donation {
        id: row.get("id"),
        donor_id: row.get("donor_id"),
        status: row.get("status"),
        accepted_by: row.get("accepted_by"),
        lock: lock_from_row(row),
        pickup: pickup_from_row(row),
        donated_at: row.get("donated_at"),
        accepted_at: row.get("accepted_at"),
        picked_up_at: row.get("picked_up_at"),
        items: Vec::new(),
    }
}

impl<C> Database<Select<By<Option<Donation>, donation::Id>>> for Postgres<C>
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

        let sql = format!(
            "SELECT {DONATION_COLUMNS} \
             FROM donations AS d \
             WHERE d.id = $1::UUID",
        );
        let Some(row) = self
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(None);
        };

        const ITEMS_SQL: &str = "\
            SELECT inventory_id, quantity, expiry_date, category \
            FROM donation_items \
            WHERE donation_id = $1::UUID \
            ORDER BY seq ASC";
        let items = self
            .query(ITEMS_SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| donation::Item {
                inventory_id: row.get("inventory_id"),
                quantity: row.get("quantity"),
                expiry_date: row.get("expiry_date"),
                category: row.get("category"),
            })
            .collect();

        Ok(Some(Donation {
            id,
            donor_id: row.get("donor_id"),
            status: row.get("status"),
            accepted_by: row.get("accepted_by"),
            rejected_by: row
                .get::<_, Vec<user::Id>>("rejected_by")
                .into_iter()
                .collect(),
            lock: lock_from_row(&row),
            pickup: pickup_from_row(&row),
            items,
            donated_at: row.get("donated_at"),
            accepted_at: row.get("accepted_at"),
            picked_up_at: row.get("picked_up_at"),
        }))
    }
}

impl<C> Database<Insert<Donation>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Donation>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(donation): Insert<Donation>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(donation))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Donation>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(donation): Update<Donation>,
    ) -> Result<Self::Ok, Self::Err> {
        let Donation {
            id,
            donor_id,
            status,
            accepted_by,
            rejected_by,
            lock,
            pickup,
            items,
            donated_at,
            accepted_at,
            picked_up_at,
        } = donation;

        let rejected_by = rejected_by.into_iter().sorted().collect_vec();
        let is_locked = lock.is_some();
        let locked_at = lock.map(|l| l.locked_at);
        let locked_by = lock.map(|l| l.locked_by);
        let pickup_lat = pickup.as_ref().map(|p| f64::from(p.lat));
        let pickup_lng = pickup.as_ref().map(|p| f64::from(p.lng));
        let pickup_address = pickup.map(|p| p.address);

        const SQL: &str = "\
            INSERT INTO donations (\
                id, donor_id, status, \
                accepted_by, rejected_by, \
                is_locked, locked_at, locked_by, \
                pickup_lat, pickup_lng, pickup_address, \
                donated_at, accepted_at, picked_up_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::INT2, \
                $4::UUID, $5::UUID[], \
                $6::BOOL, $7::TIMESTAMPTZ, $8::UUID, \
                $9::FLOAT8, $10::FLOAT8, $11::VARCHAR, \
                $12::TIMESTAMPTZ, $13::TIMESTAMPTZ, $14::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET status = EXCLUDED.status, \
                accepted_by = EXCLUDED.accepted_by, \
                rejected_by = EXCLUDED.rejected_by, \
                is_locked = EXCLUDED.is_locked, \
                locked_at = EXCLUDED.locked_at, \
                locked_by = EXCLUDED.locked_by, \
                pickup_lat = EXCLUDED.pickup_lat, \
                pickup_lng = EXCLUDED.pickup_lng, \
                pickup_address = EXCLUDED.pickup_address, \
                accepted_at = EXCLUDED.accepted_at, \
                picked_up_at = EXCLUDED.picked_up_at";
        self.exec(
            SQL,
            &[
                &id,
                &donor_id,
                &status,
                &accepted_by,
                &rejected_by,
                &is_locked,
                &locked_at,
                &locked_by,
                &pickup_lat,
                &pickup_lng,
                &pickup_address,
                &donated_at,
                &accepted_at,
                &picked_up_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())?;

        const DELETE_ITEMS_SQL: &str = "\
            DELETE FROM donation_items \
            WHERE donation_id = $1::UUID";
        self.exec(DELETE_ITEMS_SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?;

        // One by one, as `seq` keeps the insertion order.
        const INSERT_ITEM_SQL: &str = "\
            INSERT INTO donation_items (\
                donation_id, inventory_id, \
                quantity, expiry_date, category\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, \
                $3::INT4, $4::DATE, $5::INT2\
            )";
        for item in items {
            self.exec(
                INSERT_ITEM_SQL,
                &[
                    &id,
                    &item.inventory_id,
                    &item.quantity,
                    &item.expiry_date,
                    &item.category,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?;
        }

        Ok(())
    }
}

impl<C> Database<Delete<By<Donation, donation::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Donation, donation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        // `donation_items` are removed by `ON DELETE CASCADE`.
        const SQL: &str = "\
            DELETE FROM donations \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Donation, donation::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Donation, donation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM donations \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Select<By<Vec<read::Donation>, Selector>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<read::Donation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<read::Donation>, Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        let (user_id, status, filter, order) = match by.into_inner() {
            Selector::ForDonor(id) => {
                (id, None, "d.donor_id = $1::UUID", "d.donated_at DESC")
            }
            Selector::AvailableFor(id) => (
                id,
                Some(donation::Status::NotAccepted),
                "d.status = $2::INT2 \
                 AND NOT ($1::UUID = ANY(d.rejected_by))",
                "d.donated_at DESC",
            ),
            Selector::AcceptedBy(id) => (
                id,
                Some(donation::Status::Accepted),
                "d.status = $2::INT2 AND d.accepted_by = $1::UUID",
                "d.donated_at DESC",
            ),
            Selector::CompletedFor(id) => (
                id,
                Some(donation::Status::Completed),
                "d.status = $2::INT2 AND d.accepted_by = $1::UUID",
                "d.picked_up_at DESC",
            ),
        };

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&user_id];
        if let Some(status) = &status {
            ps.push(status);
        }

        self.select_projections(filter, order, &ps)
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Select<By<Option<read::Donation>, donation::Id>>>
    for Postgres<C>
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
            .select_projections("d.id = $1::UUID", "d.donated_at DESC", &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .pop())
    }
}

impl<C> Postgres<C>
where
    C: Connection,
{
    /// Selects [`read::Donation`]s matching the provided `filter` in the
    /// provided `order`.
    async fn select_projections(
        &self,
        filter: &str,
        order: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<read::Donation>, Traced<database::Error>> {
        let sql = format!(
            "SELECT {DONATION_COLUMNS}, \
                    i.inventory_id, e.name, \
                    i.quantity, i.expiry_date, i.category \
             FROM donations AS d \
             INNER JOIN donation_items AS i ON i.donation_id = d.id \
             INNER JOIN inventory AS e ON e.id = i.inventory_id \
             WHERE {filter} \
             ORDER BY {order}, d.id ASC, i.seq ASC",
        );
        let rows = self
            .query(&sql, params)
            .await
            .map_err(tracerr::wrap!())?;

        Ok(read::donation::group(rows.iter().map(|row| {
            (
                header_from_row(row),
                read::donation::Item {
                    inventory_id: row.get("inventory_id"),
                    name: row.get("name"),
                    quantity: row.get("quantity"),
                    expiry_date: row.get("expiry_date"),
                    category: row.get("category"),
                },
            )
        })))
    }
}
