//! [`Database`] implementations.

#![allow(
    clippy::items_after_statements,
    reason = "`const SQL` after statements"
)]
#![allow(clippy::too_many_lines, reason = "SQL-related code a bit verbose")]

mod car;
mod document;
mod listing_request;
mod review;
mod ticket;

use async_trait::async_trait;
use common::{
    operations::{Commit, Transact},
    Money,
};
use refinery_core::{
    traits::r#async::{AsyncQuery, AsyncTransaction},
    AsyncMigrate, Migration,
};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        vehicle::{Doors, ModelYear, Passengers, Seats},
        Vehicle,
    },
    infra::{database, postgres, Database},
};

use super::{NonTx, Postgres, Tx};

impl Database<Transact> for Postgres<NonTx> {
    type Ok = Postgres<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(Postgres(Tx::from_non_tx(self.0.clone())))
    }
}

impl Database<Transact> for Postgres<Tx> {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Postgres<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        self.commit().await.map_err(tracerr::wrap!())
    }
}

/// [`Vehicle`] columns as bound statement parameters.
struct VehicleParams {
    /// `model_year` column.
    year: i16,

    /// `seats` column.
    seats: i16,

    /// `doors` column.
    doors: i16,

    /// `passengers` column.
    passengers: i16,
}

impl VehicleParams {
    /// Converts the numeric characteristics of the provided [`Vehicle`].
    fn new(v: &Vehicle) -> Self {
        Self {
            year: i16::try_from(u16::from(v.year)).expect("`year` overflow"),
            seats: i16::from(u8::from(v.seats)),
            doors: i16::from(u8::from(v.doors)),
            passengers: i16::from(u8::from(v.passengers)),
        }
    }
}

/// Reads [`Vehicle`] columns of the provided [`Row`].
fn vehicle(row: &Row) -> Vehicle {
    let year = u16::try_from(row.get::<_, i16>("model_year"))
        .expect("`model_year` overflow");
    #[expect(unsafe_code, reason = "validated before being stored")]
    let year = unsafe { ModelYear::new_unchecked(year) };

    Vehicle {
        model: row.get("model"),
        year,
        seats: Seats::new(row.get::<_, i16>("seats"))
            .expect("`seats` out of range"),
        doors: Doors::new(row.get::<_, i16>("doors"))
            .expect("`doors` out of range"),
        passengers: Passengers::new(row.get::<_, i16>("passengers"))
            .expect("`passengers` out of range"),
        transmission: row.get("transmission"),
        fuel: row.get("fuel_type"),
        air_conditioning: row.get("air_conditioning"),
        price_per_day: Money {
            amount: row.get("price_per_day"),
            currency: row.get("price_currency"),
        },
    }
}

#[async_trait]
impl AsyncTransaction for Postgres {
    type Error = Traced<database::Error>;

    async fn execute(
        &mut self,
        queries: &[&str],
    ) -> Result<usize, Self::Error> {
        let mut conn = self
            .0
            .pool
            .get()
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)?;
        AsyncTransaction::execute(&mut **conn, queries)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

#[async_trait]
impl AsyncQuery<Vec<Migration>> for Postgres {
    async fn query(
        &mut self,
        query: &str,
    ) -> Result<Vec<Migration>, <Self as AsyncTransaction>::Error> {
        let mut conn = self
            .0
            .pool
            .get()
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)?;
        AsyncQuery::query(&mut **conn, query)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

impl AsyncMigrate for Postgres {}
