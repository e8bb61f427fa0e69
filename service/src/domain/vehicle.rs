//! [`Vehicle`] definitions shared by listing requests and listed cars.

use std::ops::RangeInclusive;

use common::{define_kind, Date, Money};
use derive_more::{AsRef, Display, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};

/// Descriptive characteristics of a car.
///
/// Listing requests and cars keep their own copies of these.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Vehicle {
    /// [`Model`] of this [`Vehicle`].
    pub model: Model,

    /// [`ModelYear`] of this [`Vehicle`].
    pub year: ModelYear,

    /// Number of seats in this [`Vehicle`].
    pub seats: Seats,

    /// Number of doors of this [`Vehicle`].
    pub doors: Doors,

    /// Number of passengers this [`Vehicle`] takes.
    pub passengers: Passengers,

    /// [`Transmission`] of this [`Vehicle`].
    pub transmission: Transmission,

    /// [`FuelType`] of this [`Vehicle`].
    pub fuel: FuelType,

    /// Indicator whether this [`Vehicle`] has an air conditioner.
    pub air_conditioning: bool,

    /// Rental price of this [`Vehicle`] per day.
    pub price_per_day: Money,
}

/// Model name of a [`Vehicle`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Model(String);

impl Model {
    /// Creates a new [`Model`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `model` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(model: impl Into<String>) -> Self {
        Self(model.into())
    }

    /// Creates a new [`Model`] if the given `model` is valid.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Option<Self> {
        let model = model.into();
        Self::check(&model).then_some(Self(model))
    }

    /// Checks whether the given `model` is a valid [`Model`].
    fn check(model: &str) -> bool {
        model.trim() == model && !model.is_empty() && model.len() <= 128
    }
}

/// Defines a numeric characteristic of a [`Vehicle`] limited to a range.
macro_rules! define_bounded {
    ($(#[doc = $doc:literal])* $name:ident($int:ty) in $range:expr) => {
        $(#[doc = $doc])*
        #[derive(Clone, Copy, Debug, Display, Eq, Into, PartialEq)]
        pub struct $name($int);

        impl $name {
            /// Range of valid values.
            pub const RANGE: RangeInclusive<$int> = $range;

            /// Creates a new value if the given `value` lies in the
            /// [`RANGE`](Self::RANGE).
            #[must_use]
            pub fn new(value: impl TryInto<$int>) -> Option<Self> {
                let value = value.try_into().ok()?;
                Self::RANGE.contains(&value).then_some(Self(value))
            }

            /// Creates a new value without checking its range.
            ///
            /// # Safety
            ///
            /// The caller must ensure that the given `value` has been
            /// validated before.
            #[expect(unsafe_code, reason = "bypass")]
            #[must_use]
            pub const unsafe fn new_unchecked(value: $int) -> Self {
                Self(value)
            }
        }
    };
}

define_bounded! {
    /// Number of seats in a [`Vehicle`].
    Seats(u8) in 1..=8
}

define_bounded! {
    /// Number of passengers a [`Vehicle`] takes.
    Passengers(u8) in 1..=8
}

define_bounded! {
    /// Number of doors of a [`Vehicle`].
    Doors(u8) in 2..=6
}

/// Year a [`Vehicle`] model was manufactured.
#[derive(Clone, Copy, Debug, Display, Eq, Into, PartialEq)]
pub struct ModelYear(u16);

impl ModelYear {
    /// Earliest valid [`ModelYear`].
    pub const MIN: u16 = 1900;

    /// Creates a new [`ModelYear`] if the given `year` is not earlier than
    /// [`ModelYear::MIN`] and not later than the year following `today`.
    #[must_use]
    pub fn new(year: impl TryInto<u16>, today: Date) -> Option<Self> {
        let year = year.try_into().ok()?;
        let latest = u16::try_from(today.year() + 1).ok()?;
        (Self::MIN..=latest).contains(&year).then_some(Self(year))
    }

    /// Creates a new [`ModelYear`] without checking its range.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `year` has been validated before.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub const unsafe fn new_unchecked(year: u16) -> Self {
        Self(year)
    }
}

define_kind! {
    #[doc = "Transmission of a [`Vehicle`]."]
    enum Transmission {
        #[doc = "Automatic transmission."]
        Auto = 1 => "Auto",

        #[doc = "Manual transmission."]
        Manual = 2 => "Manual",
    }
}

define_kind! {
    #[doc = "Fuel type of a [`Vehicle`]."]
    enum FuelType {
        #[doc = "Petrol engine."]
        Petrol = 1 => "Petrol",

        #[doc = "Diesel engine."]
        Diesel = 2 => "Diesel",

        #[doc = "Electric motor."]
        Electric = 3 => "Electric",
    }
}

#[cfg(test)]
mod spec {
    use common::Date;

    use super::{Doors, ModelYear, Passengers, Seats};

    #[test]
    fn bounded_ranges() {
        assert!(Seats::new(1).is_some());
        assert!(Seats::new(8).is_some());
        assert!(Seats::new(0).is_none());
        assert!(Seats::new(9).is_none());
        assert!(Seats::new(-1).is_none());
        assert!(Passengers::new(8).is_some());
        assert!(Passengers::new(300).is_none());
        assert!(Doors::new(2).is_some());
        assert!(Doors::new(6).is_some());
        assert!(Doors::new(1).is_none());
        assert!(Doors::new(7).is_none());
    }

    #[test]
    fn model_year_follows_today() {
        let today = Date::from_dmy("15-06-2025").unwrap();

        assert!(ModelYear::new(1900, today).is_some());
        assert!(ModelYear::new(2026, today).is_some());
        assert!(ModelYear::new(2027, today).is_none());
        assert!(ModelYear::new(1899, today).is_none());
    }
}
