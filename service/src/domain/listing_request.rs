//! [`ListingRequest`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, Date, DateOf, DateTimeOf};
use derive_more::{AsRef, Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{car, document, user, Car, City, Vehicle};

/// Renter's request to list a car on the platform, awaiting an approval.
#[derive(Clone, Debug)]
pub struct ListingRequest {
    /// ID of this [`ListingRequest`].
    pub id: Id,

    /// Registration number of the car to list.
    pub car_number: car::Number,

    /// [`Owner`] of the car to list.
    pub owner: Owner,

    /// [`Vehicle`] characteristics of the car to list.
    pub vehicle: Vehicle,

    /// Stored [`Documents`] of the car to list.
    pub documents: Documents,

    /// Requested start of the car availability.
    pub available_from: RequestedDate,

    /// Requested end of the car availability.
    pub available_to: RequestedDate,

    /// [`City`] the car is permitted to be driven in.
    pub city: City,

    /// [`Status`] of this [`ListingRequest`].
    pub status: Status,

    /// Rating to carry over to the listed car.
    pub rating: car::Rating,

    /// Number of reviews to carry over to the listed car.
    pub reviews_count: car::ReviewsCount,

    /// [`DateTime`] when this [`ListingRequest`] was created.
    pub created_at: CreationDateTime,
}

impl ListingRequest {
    /// Parses the requested availability period of this [`ListingRequest`].
    ///
    /// # Errors
    ///
    /// If any of the dates cannot be parsed, or the period ends before it
    /// starts.
    pub fn availability(
        &self,
    ) -> Result<(car::AvailableFrom, car::AvailableTo), InvalidPeriod> {
        let from: car::AvailableFrom = self.available_from.parse()?;
        let to: car::AvailableTo = self.available_to.parse()?;
        if to.coerce::<()>() <= from.coerce() {
            return Err(InvalidPeriod::Reversed);
        }
        Ok((from, to))
    }

    /// Creates a new available [`Car`] out of this [`ListingRequest`].
    ///
    /// # Errors
    ///
    /// If the requested availability period is invalid.
    pub fn to_car(&self) -> Result<Car, InvalidPeriod> {
        let (available_from, available_to) = self.availability()?;
        Ok(Car {
            id: car::Id::new(),
            number: self.car_number.clone(),
            owner_email: self.owner.email.clone(),
            vehicle: self.vehicle.clone(),
            image: self.documents.image.clone(),
            available_from,
            available_to,
            city: self.city,
            status: car::Status::Available,
            rating: self.rating,
            reviews_count: self.reviews_count,
            created_at: DateTimeOf::now(),
        })
    }

    /// Mirrors the provided [`car::Changes`] onto this [`ListingRequest`].
    pub fn mirror(&mut self, changes: &car::Changes) {
        let car::Changes {
            number,
            model,
            year,
            seats,
            doors,
            passengers,
            transmission,
            fuel,
            air_conditioning,
            price_per_day,
            image,
            available_from,
            available_to,
            city,
        } = changes;
        let v = &mut self.vehicle;

        if let Some(n) = number {
            self.car_number = n.clone();
        }
        if let Some(m) = model {
            v.model = m.clone();
        }
        v.year = year.unwrap_or(v.year);
        v.seats = seats.unwrap_or(v.seats);
        v.doors = doors.unwrap_or(v.doors);
        v.passengers = passengers.unwrap_or(v.passengers);
        v.transmission = transmission.unwrap_or(v.transmission);
        v.fuel = fuel.unwrap_or(v.fuel);
        v.air_conditioning = air_conditioning.unwrap_or(v.air_conditioning);
        v.price_per_day = price_per_day.unwrap_or(v.price_per_day);
        if let Some(i) = image {
            self.documents.image = i.clone();
        }
        if let Some(d) = available_from {
            self.available_from = RequestedDate::from_date(*d);
        }
        if let Some(d) = available_to {
            self.available_to = RequestedDate::from_date(*d);
        }
        self.city = city.unwrap_or(self.city);
    }
}

/// ID of a [`ListingRequest`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Contact details of a car owner.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Owner {
    /// Name of the owner.
    pub name: user::Name,

    /// Email of the owner.
    pub email: user::Email,

    /// Phone of the owner.
    pub phone: user::Phone,
}

/// Stored documents attached to a [`ListingRequest`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Documents {
    /// Photo of the car.
    pub image: document::Path,

    /// Insurance policy of the car.
    pub insurance: document::Path,

    /// Registration certificate of the car.
    pub registration: document::Path,
}

impl Documents {
    /// Iterates over all the stored [`document::Path`]s.
    pub fn iter(&self) -> impl Iterator<Item = &document::Path> {
        [&self.image, &self.insurance, &self.registration].into_iter()
    }
}

/// Date of a [`ListingRequest`] kept in its `DD-MM-YYYY` textual form.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct RequestedDate(String);

impl RequestedDate {
    /// Creates a new [`RequestedDate`] without parsing it.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `date` has been received in
    /// `DD-MM-YYYY` format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(date: impl Into<String>) -> Self {
        Self(date.into())
    }

    /// Creates a new [`RequestedDate`] representing the provided [`Date`].
    #[must_use]
    pub fn from_date<Of: ?Sized>(date: DateOf<Of>) -> Self {
        Self(date.to_dmy())
    }

    /// Parses this [`RequestedDate`] into a [`Date`].
    ///
    /// # Errors
    ///
    /// If this [`RequestedDate`] is not a valid `DD-MM-YYYY` date.
    pub fn parse<Of: ?Sized>(&self) -> Result<DateOf<Of>, InvalidPeriod> {
        Date::from_dmy(&self.0)
            .map(DateOf::coerce)
            .map_err(|_| InvalidPeriod::Unparseable(self.clone()))
    }
}

/// Error of a [`ListingRequest`] availability period.
#[derive(Clone, Debug, Display, Error)]
pub enum InvalidPeriod {
    /// Date cannot be parsed.
    #[display("`{_0}` is not a `DD-MM-YYYY` date")]
    Unparseable(#[error(not(source))] RequestedDate),

    /// Period ends before it starts.
    #[display("`to` date must be after `from` date")]
    Reversed,
}

define_kind! {
    #[doc = "Approval status of a [`ListingRequest`]."]
    enum Status {
        #[doc = "Awaiting a decision."]
        Pending = 1 => "pending",

        #[doc = "Approved, so the car has been listed."]
        Approved = 2 => "approved",

        #[doc = "Rejected."]
        Disapproved = 3 => "disapproved",
    }
}

impl Status {
    /// Indicates whether this [`Status`] admits no further transitions.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self != Self::Pending
    }
}

/// [`DateTime`] when a [`ListingRequest`] was created.
pub type CreationDateTime = DateTimeOf<(ListingRequest, unit::Creation)>;

#[cfg(test)]
pub(crate) mod spec {
    use common::{DateTime, Money};
    use rust_decimal::Decimal;

    use crate::domain::{
        car, document, user,
        vehicle::{
            Doors, FuelType, Model, ModelYear, Passengers, Seats, Transmission,
        },
        City, Vehicle,
    };

    use super::{
        Documents, Id, InvalidPeriod, ListingRequest, Owner, RequestedDate,
        Status,
    };

    /// Creates a pending [`ListingRequest`] with the provided car number and
    /// availability period.
    #[expect(unsafe_code, reason = "test values are valid")]
    pub(crate) fn request(
        number: &str,
        from: &str,
        to: &str,
    ) -> ListingRequest {
        ListingRequest {
            id: Id::new(),
            car_number: car::Number::parse(number).unwrap(),
            owner: Owner {
                name: user::Name::new("Kavin").unwrap(),
                email: user::Email::new("kavin@example.com").unwrap(),
                phone: user::Phone::new("9876543210").unwrap(),
            },
            vehicle: Vehicle {
                model: Model::new("Swift").unwrap(),
                year: unsafe { ModelYear::new_unchecked(2022) },
                seats: Seats::new(5).unwrap(),
                doors: Doors::new(4).unwrap(),
                passengers: Passengers::new(5).unwrap(),
                transmission: Transmission::Manual,
                fuel: FuelType::Petrol,
                air_conditioning: true,
                price_per_day: Money::inr(Decimal::from(1500)),
            },
            documents: Documents {
                image: document::Path::from(format!("image/{number}.png")),
                insurance: format!("insurance/{number}.pdf").into(),
                registration: format!("rc_book/{number}.pdf").into(),
            },
            available_from: unsafe { RequestedDate::new_unchecked(from) },
            available_to: unsafe { RequestedDate::new_unchecked(to) },
            city: City::Chennai,
            status: Status::Pending,
            rating: car::Rating::default(),
            reviews_count: car::ReviewsCount::default(),
            created_at: DateTime::now().coerce(),
        }
    }

    #[test]
    fn becomes_available_car() {
        let req = request("AB-1234", "01-01-2025", "05-01-2025");

        let car = req.to_car().unwrap();

        assert_eq!(car.number, req.car_number);
        assert_eq!(car.status, car::Status::Available);
        assert_eq!(car.owner_email, req.owner.email);
        assert_eq!(car.vehicle, req.vehicle);
        assert_eq!(car.image, req.documents.image);
        assert_eq!(car.available_from.to_dmy(), "01-01-2025");
        assert_eq!(car.available_to.to_dmy(), "05-01-2025");
    }

    #[test]
    fn rejects_bad_period() {
        let req = request("AB-1234", "1st of Jan", "05-01-2025");
        assert!(matches!(req.to_car(), Err(InvalidPeriod::Unparseable(_))));

        let req = request("AB-1234", "05-01-2025", "05-01-2025");
        assert!(matches!(req.to_car(), Err(InvalidPeriod::Reversed)));

        let req = request("AB-1234", "06-01-2025", "05-01-2025");
        assert!(matches!(req.availability(), Err(InvalidPeriod::Reversed)));
    }

    #[test]
    fn mirrors_only_present_changes() {
        let mut req = request("AB-1234", "01-01-2025", "05-01-2025");
        let before = req.clone();

        req.mirror(&car::Changes {
            price_per_day: Some(Money::inr(Decimal::from(2000))),
            city: Some(City::Goa),
            available_to: Some(
                common::Date::from_dmy("10-01-2025").unwrap().coerce(),
            ),
            ..car::Changes::default()
        });

        assert_eq!(req.vehicle.price_per_day.amount, Decimal::from(2000));
        assert_eq!(req.city, City::Goa);
        assert_eq!(AsRef::<str>::as_ref(&req.available_to), "10-01-2025");
        assert_eq!(req.available_from, before.available_from);
        assert_eq!(req.vehicle.model, before.vehicle.model);
        assert_eq!(req.car_number, before.car_number);
        assert_eq!(req.status, Status::Pending);
    }

    #[test]
    fn terminal_statuses() {
        assert!(!Status::Pending.is_terminal());
        assert!(Status::Approved.is_terminal());
        assert!(Status::Disapproved.is_terminal());
    }
}
