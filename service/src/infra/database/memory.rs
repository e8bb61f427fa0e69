//! In-memory [`Database`] implementation.
//!
//! Keeps everything in a single process. Transactions share the same state
//! and locks serialize nothing, so it suits tests and local runs only.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use common::{
    operations::{
        By, Commit, CompareAndSwap, Delete, Insert, Lock, Select, Transact,
        Update,
    },
    DateTime,
};
use derive_more::{Display, Error as StdError};
use tracerr::Traced;

use crate::{
    domain::{
        car, document, listing_request, ticket, Car, ListingRequest, Review,
        Ticket,
    },
    infra::{database, Database},
    read,
};

/// In-memory [`Database`].
#[derive(Clone, Debug, Default)]
pub struct Memory(Arc<Mutex<State>>);

/// Stored records of a [`Memory`] database, in insertion order.
#[derive(Debug, Default)]
struct State {
    /// Stored [`ListingRequest`]s.
    requests: Vec<ListingRequest>,

    /// Stored [`Car`]s.
    cars: Vec<Car>,

    /// Stored [`Ticket`]s.
    tickets: Vec<Ticket>,

    /// Stored [`Review`]s.
    reviews: Vec<Review>,
}

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the [`State`] of this [`Memory`] database.
    fn state(&self) -> MutexGuard<'_, State> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// [`Memory`] database error.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// Unique constraint is violated.
    #[display("Unique constraint `{_0}` is violated")]
    UniqueViolation(#[error(not(source))] &'static str),
}

impl Error {
    /// Checks whether this [`Error`] is a unique constraint violation.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }
}

/// Replaces the record with the same ID in `records`, or appends it.
fn upsert<T>(records: &mut Vec<T>, record: T, same: impl Fn(&T) -> bool) {
    if let Some(r) = records.iter_mut().find(|r| same(r)) {
        *r = record;
    } else {
        records.push(record);
    }
}

/// Returns the error of violating the provided unique `constraint`.
fn violation(constraint: &'static str) -> Traced<database::Error> {
    tracerr::new!(database::Error::from(Error::UniqueViolation(constraint)))
}

impl Database<Transact> for Memory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl<K> Database<Lock<K>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Lock<K>) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Database<Select<By<Option<ListingRequest>, listing_request::Id>>>
    for Memory
{
    type Ok = Option<ListingRequest>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<ListingRequest>, listing_request::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.state().requests.iter().find(|r| r.id == id).cloned())
    }
}

impl Database<Select<By<Option<ListingRequest>, car::Number>>> for Memory {
    type Ok = Option<ListingRequest>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<ListingRequest>, car::Number>>,
    ) -> Result<Self::Ok, Self::Err> {
        let number = by.into_inner();
        Ok(self
            .state()
            .requests
            .iter()
            .find(|r| r.car_number == number)
            .cloned())
    }
}

impl Database<Select<By<Vec<ListingRequest>, read::listing_request::Filter>>>
    for Memory
{
    type Ok = Vec<ListingRequest>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Vec<ListingRequest>, read::listing_request::Filter>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();
        Ok(self
            .state()
            .requests
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }
}

impl Database<Insert<ListingRequest>> for Memory {
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

impl Database<Update<ListingRequest>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(request): Update<ListingRequest>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state();
        if state
            .requests
            .iter()
            .any(|r| r.car_number == request.car_number && r.id != request.id)
        {
            return Err(violation("listing_requests_car_number_key"));
        }
        let id = request.id;
        upsert(&mut state.requests, request, |r| r.id == id);
        Ok(())
    }
}

impl Database<Delete<By<ListingRequest, listing_request::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<ListingRequest, listing_request::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.state().requests.retain(|r| r.id != id);
        Ok(())
    }
}

impl Database<Delete<By<ListingRequest, car::Number>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<ListingRequest, car::Number>>,
    ) -> Result<Self::Ok, Self::Err> {
        let number = by.into_inner();
        self.state().requests.retain(|r| r.car_number != number);
        Ok(())
    }
}

impl Database<Select<By<Option<Car>, car::Id>>> for Memory {
    type Ok = Option<Car>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Car>, car::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.state().cars.iter().find(|c| c.id == id).cloned())
    }
}

impl Database<Select<By<Option<Car>, car::Number>>> for Memory {
    type Ok = Option<Car>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Car>, car::Number>>,
    ) -> Result<Self::Ok, Self::Err> {
        let number = by.into_inner();
        Ok(self.state().cars.iter().find(|c| c.number == number).cloned())
    }
}

impl Database<Select<By<Vec<Car>, read::car::Filter>>> for Memory {
    type Ok = Vec<Car>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Car>, read::car::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();
        Ok(self
            .state()
            .cars
            .iter()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect())
    }
}

impl Database<Select<By<read::car::TotalCount, read::car::Filter>>> for Memory {
    type Ok = read::car::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::car::TotalCount, read::car::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();
        let count =
            self.state().cars.iter().filter(|c| filter.matches(c)).count();
        Ok(i32::try_from(count).unwrap_or(i32::MAX).into())
    }
}

impl Database<Insert<Car>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(car): Insert<Car>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(car)).await.map_err(tracerr::wrap!())
    }
}

impl Database<Update<Car>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(car): Update<Car>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state();
        if state
            .cars
            .iter()
            .any(|c| c.number == car.number && c.id != car.id)
        {
            return Err(violation("cars_car_number_key"));
        }
        let id = car.id;
        upsert(&mut state.cars, car, |c| c.id == id);
        Ok(())
    }
}

impl Database<CompareAndSwap<car::Number, car::Status>> for Memory {
    type Ok = Option<Car>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        CompareAndSwap { key, current, new }: CompareAndSwap<
            car::Number,
            car::Status,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self
            .state()
            .cars
            .iter_mut()
            .find(|c| c.number == key && c.status == current)
            .map(|c| {
                c.status = new;
                c.clone()
            }))
    }
}

impl Database<Delete<By<Car, car::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Car, car::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.state().cars.retain(|c| c.id != id);
        Ok(())
    }
}

impl Database<Select<By<Option<Ticket>, ticket::Id>>> for Memory {
    type Ok = Option<Ticket>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Ticket>, ticket::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.state().tickets.iter().find(|t| t.id == id).cloned())
    }
}

impl Database<Select<By<Vec<Ticket>, read::ticket::Filter>>> for Memory {
    type Ok = Vec<Ticket>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Ticket>, read::ticket::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();
        Ok(self
            .state()
            .tickets
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect())
    }
}

impl Database<Select<By<read::ticket::TotalCount, read::ticket::Filter>>>
    for Memory
{
    type Ok = read::ticket::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::ticket::TotalCount, read::ticket::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();
        let count =
            self.state().tickets.iter().filter(|t| filter.matches(t)).count();
        Ok(i32::try_from(count).unwrap_or(i32::MAX).into())
    }
}

impl Database<Insert<Ticket>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(ticket): Insert<Ticket>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(ticket)).await.map_err(tracerr::wrap!())
    }
}

impl Database<Update<Ticket>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(ticket): Update<Ticket>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = ticket.id;
        upsert(&mut self.state().tickets, ticket, |t| t.id == id);
        Ok(())
    }
}

impl Database<Update<By<read::ticket::Expired, DateTime>>> for Memory {
    type Ok = read::ticket::Expired;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(by): Update<By<read::ticket::Expired, DateTime>>,
    ) -> Result<Self::Ok, Self::Err> {
        let now = by.into_inner();
        let mut expired = 0;
        for t in &mut self.state().tickets {
            if t.is_overdue(now) {
                t.status = ticket::Status::Expired;
                expired += 1;
            }
        }
        Ok(read::ticket::Expired::from(expired))
    }
}

impl Database<Insert<Review>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(review): Insert<Review>,
    ) -> Result<Self::Ok, Self::Err> {
        self.state().reviews.push(review);
        Ok(())
    }
}

impl Database<Select<By<Vec<Review>, car::Id>>> for Memory {
    type Ok = Vec<Review>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Review>, car::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let car_id = by.into_inner();
        Ok(self
            .state()
            .reviews
            .iter()
            .filter(|r| r.car_id == car_id)
            .cloned()
            .collect())
    }
}

impl Database<Select<By<read::document::Referenced, document::Path>>>
    for Memory
{
    type Ok = read::document::Referenced;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::document::Referenced, document::Path>>,
    ) -> Result<Self::Ok, Self::Err> {
        let path = by.into_inner();
        let state = self.state();
        Ok((state.cars.iter().any(|c| c.image == path)
            || state.tickets.iter().any(|t| t.image == path)
            || state
                .requests
                .iter()
                .any(|r| r.documents.iter().any(|p| *p == path)))
        .into())
    }
}
