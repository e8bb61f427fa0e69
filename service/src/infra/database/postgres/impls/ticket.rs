//! [`Ticket`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Lock, Select, Update},
    DateTime, Money,
};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{ticket, Ticket},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Reads a [`Ticket`] out of the provided [`Row`].
fn ticket(row: &Row) -> Ticket {
    Ticket {
        id: row.get("id"),
        car_number: row.get("car_number"),
        owner_id: row.get("owner_id"),
        user_id: row.get("user_id"),
        user_email: row.get("user_email"),
        payment: row.get("payment_id"),
        image: row.get("image_path"),
        location: row.get("location"),
        city: row.get("city"),
        from: row.get("starts_at"),
        to: row.get("ends_at"),
        amount: Money {
            amount: row.get("amount"),
            currency: row.get("amount_currency"),
        },
        status: row.get("status"),
        refund_id: row.get("refund_id"),
        created_at: row.get("created_at"),
    }
}

/// Builds a `WHERE` clause out of the provided [`read::ticket::Filter`],
/// pushing its parameters into `ps`.
fn filtering<'a>(
    filter: &'a read::ticket::Filter,
    ps: &mut Vec<&'a (dyn ToSql + Sync)>,
) -> String {
    let read::ticket::Filter { user_id, owner_id } = filter;

    let user_idx = user_id.as_ref().map(|id| {
        ps.push(id);
        ps.len()
    });
    let owner_idx = owner_id.as_ref().map(|id| {
        ps.push(id);
        ps.len()
    });

    format!(
        "WHERE true \
               {user_filtering} \
               {owner_filtering}",
        user_filtering = user_idx.into_iter().format_with("", |i, f| {
            f(&format_args!("AND user_id = ${i}::UUID"))
        }),
        owner_filtering = owner_idx.into_iter().format_with("", |i, f| {
            f(&format_args!("AND owner_id = ${i}::UUID"))
        }),
    )
}

impl<C> Database<Select<By<Option<Ticket>, ticket::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Ticket>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Ticket>, ticket::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: ticket::Id = by.into_inner();

        const SQL: &str = "\
            SELECT * \
            FROM tickets \
            WHERE id = $1::UUID";
        self.query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.as_ref().map(ticket))
    }
}

impl<C> Database<Select<By<Vec<Ticket>, read::ticket::Filter>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Ticket>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Ticket>, read::ticket::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();

        let mut ps = vec![];
        let sql = format!(
            "SELECT * \
             FROM tickets \
             {filtering} \
             ORDER BY created_at, id",
            filtering = filtering(&filter, &mut ps),
        );
        Ok(self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(ticket)
            .collect())
    }
}

impl<C> Database<Select<By<read::ticket::TotalCount, read::ticket::Filter>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::ticket::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::ticket::TotalCount, read::ticket::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();

        let mut ps = vec![];
        let sql = format!(
            "SELECT COUNT(*)::INT4 \
             FROM tickets \
             {filtering}",
            filtering = filtering(&filter, &mut ps),
        );
        self.query_opt(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.expect("always exists").get::<_, i32>(0).into())
    }
}

impl<C> Database<Insert<Ticket>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Ticket>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(ticket): Insert<Ticket>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(ticket)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Ticket>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(ticket): Update<Ticket>,
    ) -> Result<Self::Ok, Self::Err> {
        let Ticket {
            id,
            car_number,
            owner_id,
            user_id,
            user_email,
            payment,
            image,
            location,
            city,
            from,
            to,
            amount,
            status,
            refund_id,
            created_at,
        } = ticket;

        const SQL: &str = "\
            INSERT INTO tickets (\
                id, car_number, owner_id, user_id, user_email, \
                payment_id, image_path, location, city, \
                starts_at, ends_at, amount, amount_currency, \
                status, refund_id, created_at \
            ) VALUES (\
                $1::UUID, $2::VARCHAR, $3::UUID, $4::UUID, $5::VARCHAR, \
                $6::VARCHAR, $7::VARCHAR, $8::VARCHAR, $9::INT2, \
                $10::TIMESTAMPTZ, $11::TIMESTAMPTZ, \
                $12::NUMERIC, $13::INT2, $14::INT2, $15::VARCHAR, \
                $16::TIMESTAMPTZ \
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET status = EXCLUDED.status, \
                refund_id = EXCLUDED.refund_id";
        self.exec(
            SQL,
            &[
                &id,
                &car_number,
                &owner_id,
                &user_id,
                &user_email,
                &payment,
                &image,
                &location,
                &city,
                &from,
                &to,
                &amount.amount,
                &amount.currency,
                &status,
                &refund_id,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<By<read::ticket::Expired, DateTime>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = read::ticket::Expired;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(by): Update<By<read::ticket::Expired, DateTime>>,
    ) -> Result<Self::Ok, Self::Err> {
        let now: DateTime = by.into_inner();

        const SQL: &str = "\
            UPDATE tickets \
            SET status = $1::INT2 \
            WHERE status = $2::INT2 \
              AND ends_at < $3::TIMESTAMPTZ";
        self.exec(
            SQL,
            &[&ticket::Status::Expired, &ticket::Status::Upcoming, &now],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(read::ticket::Expired::from)
    }
}

impl<C> Database<Lock<By<Ticket, ticket::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Ticket, ticket::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: ticket::Id = by.into_inner();

        const SQL: &str = "\
            INSERT INTO tickets_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO NOTHING";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
