//! [`ListingRequest`]-related definitions.

use common::DateTime;
use derive_more::{Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLInputObject, GraphQLScalar};
use service::{command, domain, domain::validation::ListingForm};
use uuid::Uuid;

use crate::{api, api::scalar, AsError, Context, Error};

/// Request of a car owner to list a car on the platform.
#[derive(Clone, Debug, From)]
pub struct ListingRequest(domain::ListingRequest);

/// Request of a car owner to list a car on the platform.
#[graphql_object(context = Context)]
impl ListingRequest {
    /// Unique identifier of this `ListingRequest`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Registration number of the requested car.
    #[must_use]
    pub fn car_number(&self) -> &str {
        self.0.car_number.as_ref()
    }

    /// Name of the car owner.
    #[must_use]
    pub fn owner_name(&self) -> &str {
        self.0.owner.name.as_ref()
    }

    /// Email of the car owner.
    #[must_use]
    pub fn owner_email(&self) -> &str {
        self.0.owner.email.as_ref()
    }

    /// Phone of the car owner.
    #[must_use]
    pub fn owner_phone(&self) -> &str {
        self.0.owner.phone.as_ref()
    }

    /// Characteristics of the requested car.
    #[must_use]
    pub fn vehicle(&self) -> api::Vehicle {
        self.0.vehicle.clone().into()
    }

    /// Stored photo of the car.
    #[must_use]
    pub fn image(&self) -> &str {
        self.0.documents.image.as_ref()
    }

    /// Stored insurance policy of the car.
    #[must_use]
    pub fn insurance(&self) -> &str {
        self.0.documents.insurance.as_ref()
    }

    /// Stored registration certificate of the car.
    #[must_use]
    pub fn rc_book(&self) -> &str {
        self.0.documents.registration.as_ref()
    }

    /// Start of the requested availability, in `DD-MM-YYYY` format.
    #[must_use]
    pub fn from(&self) -> &str {
        self.0.available_from.as_ref()
    }

    /// End of the requested availability, in `DD-MM-YYYY` format.
    #[must_use]
    pub fn to(&self) -> &str {
        self.0.available_to.as_ref()
    }

    /// City the car is permitted to be driven in.
    #[must_use]
    pub fn permitted_city(&self) -> &str {
        self.0.city.as_str()
    }

    /// Approval status of this `ListingRequest`.
    #[must_use]
    pub fn status(&self) -> Status {
        self.0.status.into()
    }

    /// `DateTime` when this `ListingRequest` was submitted.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }
}

/// Unique identifier of a `ListingRequest`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::listing_request::Id)]
#[into(domain::listing_request::Id)]
#[graphql(name = "ListingRequestId", transparent)]
pub struct Id(Uuid);

/// Approval status of a `ListingRequest`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "ListingRequestStatus")]
pub enum Status {
    /// Awaiting a decision.
    Pending,

    /// Approved, and the car has been listed.
    Approved,

    /// Rejected.
    Disapproved,
}

impl From<domain::listing_request::Status> for Status {
    fn from(status: domain::listing_request::Status) -> Self {
        use domain::listing_request::Status as S;
        match status {
            S::Pending => Self::Pending,
            S::Approved => Self::Approved,
            S::Disapproved => Self::Disapproved,
        }
    }
}

impl From<Status> for domain::listing_request::Status {
    fn from(status: Status) -> Self {
        match status {
            Status::Pending => Self::Pending,
            Status::Approved => Self::Approved,
            Status::Disapproved => Self::Disapproved,
        }
    }
}

/// Details of a car submitted for listing.
#[derive(Clone, Debug, GraphQLInputObject)]
#[graphql(name = "ListingRequestInput")]
pub struct Input {
    /// Name of the car owner.
    pub name: Option<String>,

    /// Email of the car owner.
    pub email: Option<String>,

    /// Phone of the car owner.
    pub phone: Option<String>,

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

impl From<Input> for ListingForm {
    fn from(input: Input) -> Self {
        Self {
            name: input.name,
            email: input.email,
            phone: input.phone,
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

/// Outcome of listing the cars of approved `ListingRequest`s.
#[derive(Clone, Debug, From)]
pub struct Materialized(command::materialize_approved_listings::Materialized);

/// Outcome of listing the cars of approved `ListingRequest`s.
#[graphql_object(name = "MaterializedListings", context = Context)]
impl Materialized {
    /// Newly listed `Car`s.
    #[must_use]
    pub fn created(&self) -> Vec<api::Car> {
        self.0.created.iter().cloned().map(Into::into).collect()
    }

    /// Number of newly listed `Car`s.
    #[must_use]
    pub fn created_count(&self) -> i32 {
        i32::try_from(self.0.created.len()).unwrap_or(i32::MAX)
    }

    /// `ListingRequest`s skipped due to their malformed availability period.
    #[must_use]
    pub fn skipped(&self) -> Vec<Id> {
        self.0.skipped.iter().copied().map(Into::into).collect()
    }
}

impl AsError for command::submit_listing_request::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::CarNumberOccupied(_) => Some(Error::conflict(self)),
            Self::Db(e) => e.try_as_error(),
            Self::Invalid(e) => e.try_as_error(),
            Self::Storage(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::approve_listing_request::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::CarAlreadyListed(_) => Some(Error::conflict(self)),
            Self::Db(e) => e.try_as_error(),
            Self::InvalidPeriod(_) => Some(Error::validation(self)),
            Self::NotExists(_) => Some(Error::not_found(self)),
        }
    }
}

impl AsError for command::disapprove_listing_request::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotExists(_) => Some(Error::not_found(self)),
        }
    }
}

impl AsError for command::delete_listing_request::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotExists(_) => Some(Error::not_found(self)),
        }
    }
}

#[cfg(test)]
mod spec {
    use service::{
        command::approve_listing_request::ExecutionError,
        domain::{car, listing_request},
    };

    use crate::AsError as _;

    #[test]
    fn approval_failures_keep_their_kind() {
        let id = listing_request::Id::new();
        let err = ExecutionError::NotExists(id).into_error();
        assert_eq!(err.code, "NOT_FOUND");
        assert_eq!(err.status_code, http::StatusCode::NOT_FOUND);
        assert!(err.message.contains(&id.to_string()), "{}", err.message);

        let number = car::Number::parse("ab-1234").unwrap();
        let err = ExecutionError::CarAlreadyListed(number).into_error();
        assert_eq!(err.code, "CONFLICT");
        assert!(err.message.contains("AB-1234"), "{}", err.message);

        let err = ExecutionError::InvalidPeriod(
            listing_request::InvalidPeriod::Reversed,
        )
        .into_error();
        assert_eq!(err.code, "VALIDATION_ERROR");
    }
}
