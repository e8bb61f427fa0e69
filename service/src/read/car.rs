//! [`Car`] read definitions.

use derive_more::{Display, From, Into};

use crate::domain::{car, user, Car, City};

/// Filter of [`Car`]s.
#[derive(Clone, Debug, Default)]
pub struct Filter {
    /// Owner [`user::Email`] to match, if any.
    pub owner_email: Option<user::Email>,

    /// [`Offer`] the [`Car`] must fit, if any.
    pub offer: Option<Offer>,
}

impl Filter {
    /// Indicates whether the provided [`Car`] passes this [`Filter`].
    #[must_use]
    pub fn matches(&self, car: &Car) -> bool {
        self.owner_email
            .as_ref()
            .map_or(true, |e| &car.owner_email == e)
            && self
                .offer
                .map_or(true, |o| car.is_offered(o.city, o.from, o.to))
    }
}

/// Search for [`Car`]s available in a [`City`] for some part of a period.
#[derive(Clone, Copy, Debug)]
pub struct Offer {
    /// [`City`] to drive in.
    pub city: City,

    /// Start of the period.
    pub from: car::AvailableFrom,

    /// End of the period.
    pub to: car::AvailableTo,
}

/// Total count of [`Car`]s.
#[derive(Clone, Copy, Debug, Display, Eq, From, Into, PartialEq)]
pub struct TotalCount(i32);
