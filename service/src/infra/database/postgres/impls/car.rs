//! [`Car`]-related [`Database`] implementations.

use common::operations::{
    By, CompareAndSwap, Delete, Insert, Lock, Select, Update,
};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{car, Car},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

use super::{vehicle, VehicleParams};

/// Reads a [`Car`] out of the provided [`Row`].
fn car(row: &Row) -> Car {
    Car {
        id: row.get("id"),
        number: row.get("car_number"),
        owner_email: row.get("owner_email"),
        vehicle: vehicle(row),
        image: row.get("image_path"),
        available_from: row.get("available_from"),
        available_to: row.get("available_to"),
        city: row.get("city"),
        status: row.get("status"),
        rating: row.get("rating"),
        reviews_count: u32::try_from(row.get::<_, i32>("reviews_count"))
            .expect("`reviews_count` overflow")
            .into(),
        created_at: row.get("created_at"),
    }
}

/// Builds a `WHERE` clause out of the provided [`read::car::Filter`],
/// pushing its parameters into `ps`.
fn filtering<'a>(
    filter: &'a read::car::Filter,
    ps: &mut Vec<&'a (dyn ToSql + Sync)>,
) -> String {
    let read::car::Filter { owner_email, offer } = filter;

    let owner_idx = owner_email.as_ref().map(|e| {
        ps.push(e);
        ps.len()
    });
    let offer_idx = offer.as_ref().map(|o| {
        ps.push(&o.city);
        ps.push(&o.from);
        ps.push(&o.to);
        ps.push(&car::Status::Available);
        ps.len() - 3
    });

    format!(
        "WHERE true \
               {owner_filtering} \
               {offer_filtering}",
        owner_filtering = owner_idx.into_iter().format_with("", |i, f| {
            f(&format_args!("AND owner_email = ${i}::VARCHAR"))
        }),
        offer_filtering = offer_idx.into_iter().format_with("", |i, f| {
            f(&format_args!(
                "AND city = ${i}::INT2 \
                 AND available_to >= ${}::DATE \
                 AND available_from <= ${}::DATE \
                 AND status = ${}::INT2",
                i + 1,
                i + 2,
                i + 3,
            ))
        }),
    )
}

impl<C> Database<Select<By<Option<Car>, car::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Car>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Car>, car::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: car::Id = by.into_inner();

        const SQL: &str = "\
            SELECT * \
            FROM cars \
            WHERE id = $1::UUID";
        self.query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.as_ref().map(car))
    }
}

impl<C> Database<Select<By<Option<Car>, car::Number>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Car>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Car>, car::Number>>,
    ) -> Result<Self::Ok, Self::Err> {
        let number: car::Number = by.into_inner();

        const SQL: &str = "\
            SELECT * \
            FROM cars \
            WHERE car_number = $1::VARCHAR";
        self.query_opt(SQL, &[&number])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.as_ref().map(car))
    }
}

impl<C> Database<Select<By<Vec<Car>, read::car::Filter>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Car>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Car>, read::car::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();

        let mut ps = vec![];
        let sql = format!(
            "SELECT * \
             FROM cars \
             {filtering} \
             ORDER BY created_at, id",
            filtering = filtering(&filter, &mut ps),
        );
        Ok(self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(car)
            .collect())
    }
}

impl<C> Database<Select<By<read::car::TotalCount, read::car::Filter>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::car::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::car::TotalCount, read::car::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();

        let mut ps = vec![];
        let sql = format!(
            "SELECT COUNT(*)::INT4 \
             FROM cars \
             {filtering}",
            filtering = filtering(&filter, &mut ps),
        );
        self.query_opt(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.expect("always exists").get::<_, i32>(0).into())
    }
}

impl<C> Database<Insert<Car>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Car>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(car): Insert<Car>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(car)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Car>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(car): Update<Car>,
    ) -> Result<Self::Ok, Self::Err> {
        let Car {
            id,
            number,
            owner_email,
            vehicle,
            image,
            available_from,
            available_to,
            city,
            status,
            rating,
            reviews_count,
            created_at,
        } = car;
        let VehicleParams {
            year,
            seats,
            doors,
            passengers,
        } = VehicleParams::new(&vehicle);
        let reviews_count = i32::try_from(u32::from(reviews_count))
            .expect("`reviews_count` overflow");

        const SQL: &str = "\
            INSERT INTO cars (\
                id, car_number, owner_email, \
                model, model_year, seats, doors, passengers, \
                transmission, fuel_type, air_conditioning, \
                price_per_day, price_currency, \
                image_path, available_from, available_to, city, status, \
                rating, reviews_count, created_at \
            ) VALUES (\
                $1::UUID, $2::VARCHAR, $3::VARCHAR, \
                $4::VARCHAR, $5::INT2, $6::INT2, $7::INT2, $8::INT2, \
                $9::INT2, $10::INT2, $11::BOOLEAN, \
                $12::NUMERIC, $13::INT2, \
                $14::VARCHAR, $15::DATE, $16::DATE, $17::INT2, $18::INT2, \
                $19::NUMERIC, $20::INT4, $21::TIMESTAMPTZ \
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET car_number = EXCLUDED.car_number, \
                owner_email = EXCLUDED.owner_email, \
                model = EXCLUDED.model, \
                model_year = EXCLUDED.model_year, \
                seats = EXCLUDED.seats, \
                doors = EXCLUDED.doors, \
                passengers = EXCLUDED.passengers, \
                transmission = EXCLUDED.transmission, \
                fuel_type = EXCLUDED.fuel_type, \
                air_conditioning = EXCLUDED.air_conditioning, \
                price_per_day = EXCLUDED.price_per_day, \
                price_currency = EXCLUDED.price_currency, \
                image_path = EXCLUDED.image_path, \
                available_from = EXCLUDED.available_from, \
                available_to = EXCLUDED.available_to, \
                city = EXCLUDED.city, \
                status = EXCLUDED.status, \
                rating = EXCLUDED.rating, \
                reviews_count = EXCLUDED.reviews_count";
        self.exec(
            SQL,
            &[
                &id,
                &number,
                &owner_email,
                &vehicle.model,
                &year,
                &seats,
                &doors,
                &passengers,
                &vehicle.transmission,
                &vehicle.fuel,
                &vehicle.air_conditioning,
                &vehicle.price_per_day.amount,
                &vehicle.price_per_day.currency,
                &image,
                &available_from,
                &available_to,
                &city,
                &status,
                &rating,
                &reviews_count,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<CompareAndSwap<car::Number, car::Status>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Car>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        CompareAndSwap { key, current, new }: CompareAndSwap<
            car::Number,
            car::Status,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            UPDATE cars \
            SET status = $3::INT2 \
            WHERE car_number = $1::VARCHAR \
              AND status = $2::INT2 \
            RETURNING *";
        self.query_opt(SQL, &[&key, &current, &new])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.as_ref().map(car))
    }
}

impl<C> Database<Delete<By<Car, car::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Car, car::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: car::Id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM cars \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Car, car::Number>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Car, car::Number>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let number: car::Number = by.into_inner();

        const SQL: &str = "\
            INSERT INTO car_numbers_lock \
            VALUES ($1::VARCHAR) \
            ON CONFLICT (car_number) DO NOTHING";
        self.exec(SQL, &[&number])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
