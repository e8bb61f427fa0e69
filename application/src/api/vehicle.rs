//! [`Vehicle`]-related definitions.

use common::Money;
use juniper::graphql_object;
use service::domain;

use crate::Context;

/// Characteristics of a listed car.
#[derive(Clone, Debug)]
pub struct Vehicle(domain::Vehicle);

impl From<domain::Vehicle> for Vehicle {
    fn from(vehicle: domain::Vehicle) -> Self {
        Self(vehicle)
    }
}

/// Characteristics of a listed car.
#[graphql_object(context = Context)]
impl Vehicle {
    /// Model name of the car.
    pub fn model(&self) -> String {
        self.0.model.to_string()
    }

    /// Year the car model was manufactured.
    pub fn year(&self) -> i32 {
        u16::from(self.0.year).into()
    }

    /// Number of seats.
    pub fn seats(&self) -> i32 {
        u8::from(self.0.seats).into()
    }

    /// Number of doors.
    pub fn doors(&self) -> i32 {
        u8::from(self.0.doors).into()
    }

    /// Number of passengers the car takes.
    pub fn passengers(&self) -> i32 {
        u8::from(self.0.passengers).into()
    }

    /// Transmission, either `Auto` or `Manual`.
    pub fn transmission(&self) -> &str {
        self.0.transmission.as_str()
    }

    /// Fuel type, one of `Petrol`, `Diesel` or `Electric`.
    pub fn fuel_type(&self) -> &str {
        self.0.fuel.as_str()
    }

    /// Indicator whether the car has air conditioning.
    pub fn air_conditioning(&self) -> bool {
        self.0.air_conditioning
    }

    /// Rental price per day.
    pub fn price_per_day(&self) -> Money {
        self.0.price_per_day
    }
}

