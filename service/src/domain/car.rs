//! [`Car`] definitions.

use std::sync::LazyLock;

#[cfg(doc)]
use common::{Date, DateTime};
use common::{define_kind, unit, DateOf, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::ListingRequest;
use crate::domain::{
    document,
    review,
    user,
    vehicle::{
        Doors, FuelType, Model, ModelYear, Passengers, Seats, Transmission,
    },
    City, Vehicle,
};

/// Car listed on the platform and available for booking.
#[derive(Clone, Debug)]
pub struct Car {
    /// ID of this [`Car`].
    pub id: Id,

    /// Registration [`Number`] of this [`Car`].
    pub number: Number,

    /// [`user::Email`] of this [`Car`]'s owner.
    pub owner_email: user::Email,

    /// [`Vehicle`] characteristics of this [`Car`].
    pub vehicle: Vehicle,

    /// Stored photo of this [`Car`].
    pub image: document::Path,

    /// [`Date`] since which this [`Car`] may be booked.
    pub available_from: AvailableFrom,

    /// [`Date`] until which this [`Car`] may be booked.
    pub available_to: AvailableTo,

    /// [`City`] this [`Car`] is permitted to be driven in.
    pub city: City,

    /// [`Status`] of this [`Car`].
    pub status: Status,

    /// Average [`Rating`] of this [`Car`].
    pub rating: Rating,

    /// Number of reviews of this [`Car`].
    pub reviews_count: ReviewsCount,

    /// [`DateTime`] when this [`Car`] was created.
    pub created_at: CreationDateTime,
}

impl Car {
    /// Indicates whether this [`Car`] may be booked in the provided [`City`]
    /// for some part of the provided period.
    #[must_use]
    pub fn is_offered(
        &self,
        city: City,
        from: AvailableFrom,
        to: AvailableTo,
    ) -> bool {
        self.status == Status::Available
            && self.city == city
            && self.available_from.coerce::<()>() <= to.coerce()
            && self.available_to.coerce::<()>() >= from.coerce()
    }
}

/// ID of a [`Car`].
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

/// Registration number of a [`Car`], like `AB-1234`.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Number(String);

impl Number {
    /// Creates a new [`Number`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `number` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    /// Creates a new [`Number`] if the given `number` is valid.
    #[must_use]
    pub fn new(number: impl Into<String>) -> Option<Self> {
        let number = number.into();
        Self::check(&number).then_some(Self(number))
    }

    /// Creates a new [`Number`] out of the provided raw `input`, trimming it
    /// and upper-casing it first.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        Self::new(input.trim().to_uppercase())
    }

    /// Checks whether the given `number` is a valid [`Number`].
    fn check(number: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Number`] format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[A-Z]{2}-\d{4}$").expect("valid regex")
        });

        REGEX.is_match(number.as_ref())
    }
}

impl FromStr for Number {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or("invalid `car::Number`")
    }
}

define_kind! {
    #[doc = "Availability status of a [`Car`]."]
    enum Status {
        #[doc = "[`Car`] may be booked."]
        Available = 1 => "available",

        #[doc = "[`Car`] is booked by an upcoming ticket."]
        Busy = 2 => "busy",
    }
}

/// Average rating of a [`Car`], in `0.0..=5.0` range with one decimal place.
#[derive(Clone, Copy, Debug, Default, Display, Eq, Into, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Rating(Decimal);

impl Rating {
    /// Creates a new [`Rating`] without checking it.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `rating` is in range.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub const unsafe fn new_unchecked(rating: Decimal) -> Self {
        Self(rating)
    }

    /// Calculates the mean of the provided [`review::Rating`]s, rounded to one
    /// decimal place, along with their count.
    #[must_use]
    pub fn mean(
        ratings: impl IntoIterator<Item = review::Rating>,
    ) -> (Self, ReviewsCount) {
        let (sum, count) = ratings
            .into_iter()
            .fold((0_u64, 0_u32), |(sum, count), r| {
                (sum + u64::from(u8::from(r)), count + 1)
            });
        if count == 0 {
            return (Self::default(), ReviewsCount(0));
        }

        let mean = (Decimal::from(sum) / Decimal::from(count))
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
        (Self(mean), ReviewsCount(count))
    }
}

/// Number of reviews of a [`Car`].
#[derive(Clone, Copy, Debug, Default, Display, Eq, From, Into, PartialEq)]
pub struct ReviewsCount(u32);

/// Partial edit of a [`Car`].
///
/// Every present field replaces the one of the [`Car`] and of each
/// [`ListingRequest`] sharing its [`Number`].
#[derive(Clone, Debug, Default)]
pub struct Changes {
    /// New registration [`Number`].
    pub number: Option<Number>,

    /// New [`Model`].
    pub model: Option<Model>,

    /// New [`ModelYear`].
    pub year: Option<ModelYear>,

    /// New number of [`Seats`].
    pub seats: Option<Seats>,

    /// New number of [`Doors`].
    pub doors: Option<Doors>,

    /// New number of [`Passengers`].
    pub passengers: Option<Passengers>,

    /// New [`Transmission`].
    pub transmission: Option<Transmission>,

    /// New [`FuelType`].
    pub fuel: Option<FuelType>,

    /// New air conditioning indicator.
    pub air_conditioning: Option<bool>,

    /// New price per day.
    pub price_per_day: Option<Money>,

    /// New stored photo.
    pub image: Option<document::Path>,

    /// New start of availability.
    pub available_from: Option<AvailableFrom>,

    /// New end of availability.
    pub available_to: Option<AvailableTo>,

    /// New permitted [`City`].
    pub city: Option<City>,
}

impl Changes {
    /// Applies these [`Changes`] to the provided [`Car`].
    pub fn apply(&self, car: &mut Car) {
        let v = &mut car.vehicle;
        if let Some(n) = &self.number {
            car.number = n.clone();
        }
        if let Some(m) = &self.model {
            v.model = m.clone();
        }
        v.year = self.year.unwrap_or(v.year);
        v.seats = self.seats.unwrap_or(v.seats);
        v.doors = self.doors.unwrap_or(v.doors);
        v.passengers = self.passengers.unwrap_or(v.passengers);
        v.transmission = self.transmission.unwrap_or(v.transmission);
        v.fuel = self.fuel.unwrap_or(v.fuel);
        v.air_conditioning =
            self.air_conditioning.unwrap_or(v.air_conditioning);
        v.price_per_day = self.price_per_day.unwrap_or(v.price_per_day);
        if let Some(i) = &self.image {
            car.image = i.clone();
        }
        car.available_from = self.available_from.unwrap_or(car.available_from);
        car.available_to = self.available_to.unwrap_or(car.available_to);
        car.city = self.city.unwrap_or(car.city);
    }
}

/// [`Date`] since which a [`Car`] is available.
pub type AvailableFrom = DateOf<(Car, unit::Start)>;

/// [`Date`] until which a [`Car`] is available.
pub type AvailableTo = DateOf<(Car, unit::End)>;

/// [`DateTime`] when a [`Car`] was created.
pub type CreationDateTime = DateTimeOf<(Car, unit::Creation)>;

#[cfg(test)]
mod spec {
    use rust_decimal::Decimal;

    use crate::domain::review;

    use super::{Number, Rating};

    fn ratings(rs: &[u8]) -> Vec<review::Rating> {
        rs.iter().map(|r| review::Rating::new(*r).unwrap()).collect()
    }

    #[test]
    fn number_is_normalized() {
        assert_eq!(AsRef::<str>::as_ref(&Number::parse(" ab-1234 ").unwrap()), "AB-1234");
        assert!(Number::parse("AB1234").is_none());
        assert!(Number::parse("ABC-1234").is_none());
        assert!(Number::parse("AB-123").is_none());
        assert!(Number::parse("A1-1234").is_none());
        assert!(Number::new("ab-1234").is_none());
    }

    #[test]
    fn mean_rating_has_one_decimal() {
        let (rating, count) = Rating::mean(ratings(&[5, 4, 4]));
        assert_eq!(Decimal::from(rating), "4.3".parse::<Decimal>().unwrap());
        assert_eq!(u32::from(count), 3);

        let (rating, _) = Rating::mean(ratings(&[5, 4]));
        assert_eq!(Decimal::from(rating), "4.5".parse::<Decimal>().unwrap());

        let (rating, _) = Rating::mean(ratings(&[1, 2, 2]));
        assert_eq!(Decimal::from(rating), "1.7".parse::<Decimal>().unwrap());
    }

    #[test]
    fn mean_of_nothing_is_zero() {
        let (rating, count) = Rating::mean(Vec::new());
        assert_eq!(Decimal::from(rating), Decimal::ZERO);
        assert_eq!(u32::from(count), 0);
    }
}
