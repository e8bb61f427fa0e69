//! [`Review`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tracerr::Traced;

use crate::{
    domain::{car, review, Review},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Insert<Review>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(review): Insert<Review>,
    ) -> Result<Self::Ok, Self::Err> {
        let Review {
            id,
            car_id,
            author_id,
            author_name,
            rating,
            text,
            created_at,
        } = review;
        let rating = i16::from(u8::from(rating));

        const SQL: &str = "\
            INSERT INTO reviews (\
                id, car_id, author_id, author_name, \
                rating, text, created_at \
            ) VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::VARCHAR, \
                $5::INT2, $6::VARCHAR, $7::TIMESTAMPTZ \
            )";
        self.exec(
            SQL,
            &[
                &id,
                &car_id,
                &author_id,
                &author_name,
                &rating,
                &text,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Select<By<Vec<Review>, car::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Review>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Review>, car::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let car_id: car::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, car_id, author_id, author_name, \
                   rating, text, created_at \
            FROM reviews \
            WHERE car_id = $1::UUID \
            ORDER BY created_at, id";
        Ok(self
            .query(SQL, &[&car_id])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| Review {
                id: row.get("id"),
                car_id: row.get("car_id"),
                author_id: row.get("author_id"),
                author_name: row.get("author_name"),
                rating: review::Rating::new(row.get::<_, i16>("rating"))
                    .expect("`rating` out of range"),
                text: row.get("text"),
                created_at: row.get("created_at"),
            })
            .collect())
    }
}
