//! [`ListingRequest`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Lock, Select, Update};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        car,
        listing_request::{self, Documents, Owner},
        ListingRequest,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

use super::{vehicle, VehicleParams};

/// Reads a [`ListingRequest`] out of the provided [`Row`].
fn listing_request(row: &Row) -> ListingRequest {
    ListingRequest {
        id: row.get("id"),
        car_number: row.get("car_number"),
        owner: Owner {
            name: row.get("owner_name"),
            email: row.get("owner_email"),
            phone: row.get("owner_phone"),
        },
        vehicle: vehicle(row),
        documents: Documents {
            image: row.get("image_path"),
            insurance: row.get("insurance_path"),
            registration: row.get("registration_path"),
        },
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

impl<C> Database<Select<By<Option<ListingRequest>, listing_request::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<ListingRequest>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<ListingRequest>, listing_request::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: listing_request::Id = by.into_inner();

        const SQL: &str = "\
            SELECT * \
            FROM listing_requests \
            WHERE id = $1::UUID";
        self.query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.as_ref().map(listing_request))
    }
}

impl<C> Database<Select<By<Option<ListingRequest>, car::Number>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<ListingRequest>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<ListingRequest>, car::Number>>,
    ) -> Result<Self::Ok, Self::Err> {
        let number: car::Number = by.into_inner();

        const SQL: &str = "\
            SELECT * \
            FROM listing_requests \
            WHERE car_number = $1::VARCHAR";
        self.query_opt(SQL, &[&number])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.as_ref().map(listing_request))
    }
}

impl<C>
    Database<Select<By<Vec<ListingRequest>, read::listing_request::Filter>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<ListingRequest>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Vec<ListingRequest>, read::listing_request::Filter>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::listing_request::Filter {
            status,
            owner_email,
        } = by.into_inner();

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];
        let status_idx = status.as_ref().map(|s| {
            ps.push(s);
            ps.len()
        });
        let owner_idx = owner_email.as_ref().map(|e| {
            ps.push(e);
            ps.len()
        });

        let sql = format!(
            "SELECT * \
             FROM listing_requests \
             WHERE true \
                   {status_filtering} \
                   {owner_filtering} \
             ORDER BY created_at, id",
            status_filtering = status_idx.into_iter().format_with("", |i, f| {
                f(&format_args!("AND status = ${i}::INT2"))
            }),
            owner_filtering = owner_idx.into_iter().format_with("", |i, f| {
                f(&format_args!("AND owner_email = ${i}::VARCHAR"))
            }),
        );
        Ok(self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(listing_request)
            .collect())
    }
}

impl<C> Database<Insert<ListingRequest>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Update<ListingRequest>,
        Ok = (),
        Err = Traced<database::Error>,
    >,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(request): Insert<ListingRequest>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(request))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<ListingRequest>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(request): Update<ListingRequest>,
    ) -> Result<Self::Ok, Self::Err> {
        let ListingRequest {
            id,
            car_number,
            owner,
            vehicle,
            documents,
            available_from,
            available_to,
            city,
            status,
            rating,
            reviews_count,
            created_at,
        } = request;
        let VehicleParams {
            year,
            seats,
            doors,
            passengers,
        } = VehicleParams::new(&vehicle);
        let reviews_count = i32::try_from(u32::from(reviews_count))
            .expect("`reviews_count` overflow");

        const SQL: &str = "\
            INSERT INTO listing_requests (\
                id, car_number, \
                owner_name, owner_email, owner_phone, \
                model, model_year, seats, doors, passengers, \
                transmission, fuel_type, air_conditioning, \
                price_per_day, price_currency, \
                image_path, insurance_path, registration_path, \
                available_from, available_to, city, status, \
                rating, reviews_count, created_at \
            ) VALUES (\
                $1::UUID, $2::VARCHAR, \
                $3::VARCHAR, $4::VARCHAR, $5::VARCHAR, \
                $6::VARCHAR, $7::INT2, $8::INT2, $9::INT2, $10::INT2, \
                $11::INT2, $12::INT2, $13::BOOLEAN, \
                $14::NUMERIC, $15::INT2, \
                $16::VARCHAR, $17::VARCHAR, $18::VARCHAR, \
                $19::VARCHAR, $20::VARCHAR, $21::INT2, $22::INT2, \
                $23::NUMERIC, $24::INT4, $25::TIMESTAMPTZ \
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET car_number = EXCLUDED.car_number, \
                owner_name = EXCLUDED.owner_name, \
                owner_email = EXCLUDED.owner_email, \
                owner_phone = EXCLUDED.owner_phone, \
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
                insurance_path = EXCLUDED.insurance_path, \
                registration_path = EXCLUDED.registration_path, \
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
                &car_number,
                &owner.name,
                &owner.email,
                &owner.phone,
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
                &documents.image,
                &documents.insurance,
                &documents.registration,
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

impl<C> Database<Delete<By<ListingRequest, listing_request::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<ListingRequest, listing_request::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: listing_request::Id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM listing_requests \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Delete<By<ListingRequest, car::Number>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<ListingRequest, car::Number>>,
    ) -> Result<Self::Ok, Self::Err> {
        let number: car::Number = by.into_inner();

        const SQL: &str = "\
            DELETE FROM listing_requests \
            WHERE car_number = $1::VARCHAR";
        self.exec(SQL, &[&number])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<ListingRequest, listing_request::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<ListingRequest, listing_request::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: listing_request::Id = by.into_inner();

        const SQL: &str = "\
            INSERT INTO listing_requests_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO NOTHING";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
