//! [`Car`]-related definitions.

use common::{Date, DateTime, Handler as _};
use derive_more::{Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLInputObject, GraphQLScalar};
use service::{
    command, domain,
    domain::validation::{CarEdit, CarForm},
    query,
};
use uuid::Uuid;

use crate::{api, api::scalar, AsError, Context, Error};

/// Car listed on the platform.
#[derive(Clone, Debug, From)]
pub struct Car(domain::Car);

/// Car listed on the platform.
#[graphql_object(context = Context)]
impl Car {
    /// Unique identifier of this `Car`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Registration number of this `Car`.
    #[must_use]
    pub fn car_number(&self) -> &str {
        self.0.number.as_ref()
    }

    /// Email of the owner of this `Car`.
    #[must_use]
    pub fn owner_email(&self) -> &str {
        self.0.owner_email.as_ref()
    }

    /// Characteristics of this `Car`.
    #[must_use]
    pub fn vehicle(&self) -> api::Vehicle {
        self.0.vehicle.clone().into()
    }

    /// Stored photo of this `Car`.
    #[must_use]
    pub fn image(&self) -> &str {
        self.0.image.as_ref()
    }

    /// `Date` since which this `Car` may be booked.
    #[must_use]
    pub fn from(&self) -> Date {
        self.0.available_from.coerce()
    }

    /// `Date` until which this `Car` may be booked.
    #[must_use]
    pub fn to(&self) -> Date {
        self.0.available_to.coerce()
    }

    /// City this `Car` is permitted to be driven in.
    #[must_use]
    pub fn permitted_city(&self) -> &str {
        self.0.city.as_str()
    }

    /// Availability status of this `Car`.
    #[must_use]
    pub fn status(&self) -> Status {
        self.0.status.into()
    }

    /// Average rating of this `Car`, with one decimal place.
    #[must_use]
    pub fn rating(&self) -> scalar::Decimal {
        rust_decimal::Decimal::from(self.0.rating).into()
    }

    /// Number of reviews of this `Car`.
    #[must_use]
    pub fn reviews_count(&self) -> i32 {
        i32::try_from(u32::from(self.0.reviews_count)).unwrap_or(i32::MAX)
    }

    /// `DateTime` when this `Car` was listed.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }

    /// Reviews left for this `Car`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Car.reviews",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn reviews(
        &self,
        ctx: &Context,
    ) -> Result<Vec<api::Review>, Error> {
        ctx.service()
            .execute(query::review::OfCar::by(self.0.id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|rs| rs.into_iter().map(Into::into).collect())
    }
}

/// Unique identifier of a `Car`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::car::Id)]
#[into(domain::car::Id)]
#[graphql(name = "CarId", transparent)]
pub struct Id(Uuid);

/// Availability status of a `Car`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "CarStatus")]
pub enum Status {
    /// May be booked.
    Available,

    /// Booked by an upcoming ticket.
    Busy,
}

impl From<domain::car::Status> for Status {
    fn from(status: domain::car::Status) -> Self {
        use domain::car::Status as S;
        match status {
            S::Available => Self::Available,
            S::Busy => Self::Busy,
        }
    }
}

/// Details of a car listed directly.
#[derive(Clone, Debug, GraphQLInputObject)]
#[graphql(name = "CarInput")]
pub struct Input {
    /// Email of the car owner.
    pub email: Option<String>,

    /// Model name of the car.
    pub car_model: Option<String>,

    /// Registration number of the car, like `AB-1234`.
    pub car_number: Option<String>,

    /// Year the car model was manufactured.
    pub model_year: Option<i32>,

    /// Indicator whether the car has air conditioning.
    pub air_conditioning: Option<bool>,

    /// Number of passengers the car takes.
    pub passengers: Option<i32>,

    /// Number of seats.
    pub seats: Option<i32>,

    /// Number of doors.
    pub doors: Option<i32>,

    /// Transmission, either `Auto` or `Manual`.
    pub transmission: Option<String>,

    /// Fuel type, one of `Petrol`, `Diesel` or `Electric`.
    pub fuel_type: Option<String>,

    /// Rental price per day.
    pub price_per_day: Option<scalar::Decimal>,

    /// Start of the availability, in `DD-MM-YYYY` format.
    pub from: Option<String>,

    /// End of the availability, in `DD-MM-YYYY` format.
    pub to: Option<String>,

    /// City the car is permitted to be driven in.
    pub permitted_city: Option<String>,
}

impl From<Input> for CarForm {
    fn from(input: Input) -> Self {
        Self {
            email: input.email,
            car_model: input.car_model,
            car_number: input.car_number,
            model_year: input.model_year,
            air_conditioning: input.air_conditioning,
            passengers: input.passengers,
            seats: input.seats,
            doors: input.doors,
            transmission: input.transmission,
            fuel_type: input.fuel_type,
            price_per_day: input.price_per_day.map(Into::into),
            from: input.from,
            to: input.to,
            permitted_city: input.permitted_city,
        }
    }
}

/// Partial edit of a listed car.
///
/// Only the provided fields are changed.
#[derive(Clone, Debug, Default, GraphQLInputObject)]
#[graphql(name = "CarEditInput")]
pub struct EditInput {
    /// New registration number.
    pub car_number: Option<String>,

    /// New model name.
    pub car_model: Option<String>,

    /// New model year.
    pub model_year: Option<i32>,

    /// New air conditioning indicator.
    pub air_conditioning: Option<bool>,

    /// New number of passengers.
    pub passengers: Option<i32>,

    /// New number of seats.
    pub seats: Option<i32>,

    /// New number of doors.
    pub doors: Option<i32>,

    /// New transmission.
    pub transmission: Option<String>,

    /// New fuel type.
    pub fuel_type: Option<String>,

    /// New rental price per day.
    pub price_per_day: Option<scalar::Decimal>,

    /// New start of the availability, in `DD-MM-YYYY` format.
    pub from: Option<String>,

    /// New end of the availability, in `DD-MM-YYYY` format.
    pub to: Option<String>,

    /// New permitted city.
    pub permitted_city: Option<String>,
}

impl From<EditInput> for CarEdit {
    fn from(input: EditInput) -> Self {
        Self {
            car_number: input.car_number,
            car_model: input.car_model,
            model_year: input.model_year,
            air_conditioning: input.air_conditioning,
            passengers: input.passengers,
            seats: input.seats,
            doors: input.doors,
            transmission: input.transmission,
            fuel_type: input.fuel_type,
            price_per_day: input.price_per_day.map(Into::into),
            from: input.from,
            to: input.to,
            permitted_city: input.permitted_city,
        }
    }
}

impl AsError for command::create_car::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::CarAlreadyListed(_) => Some(Error::conflict(self)),
            Self::Db(e) => e.try_as_error(),
            Self::Invalid(e) => e.try_as_error(),
            Self::Storage(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::update_car::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::CarNumberOccupied(_) => Some(Error::conflict(self)),
            Self::Db(e) => e.try_as_error(),
            Self::Invalid(e) => e.try_as_error(),
            Self::NotExists(_) => Some(Error::not_found(self)),
            Self::Storage(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::delete_car::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotExists(_) => Some(Error::not_found(self)),
        }
    }
}
