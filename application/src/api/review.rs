//! [`Review`]-related definitions.

use common::DateTime;
use derive_more::From;
use juniper::graphql_object;
use service::{command, domain};

use crate::{api, AsError, Context, Error};

/// Review of a car left by a customer.
#[derive(Clone, Debug, From)]
pub struct Review(domain::Review);

/// Review of a car left by a customer.
#[graphql_object(context = Context)]
impl Review {
    /// ID of the reviewed `Car`.
    #[must_use]
    pub fn car_id(&self) -> api::car::Id {
        self.0.car_id.into()
    }

    /// ID of the `User` who left this `Review`.
    #[must_use]
    pub fn author_id(&self) -> api::user::Id {
        self.0.author_id.into()
    }

    /// Name of the `User` who left this `Review`.
    #[must_use]
    pub fn author_name(&self) -> &str {
        self.0.author_name.as_ref()
    }

    /// Rating from 0 to 5.
    #[must_use]
    pub fn rating(&self) -> i32 {
        u8::from(self.0.rating).into()
    }

    /// Text of this `Review`.
    #[must_use]
    pub fn review(&self) -> &str {
        self.0.text.as_ref()
    }

    /// `DateTime` when this `Review` was left.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }
}

/// Result of a `Review` submission.
#[derive(Clone, Debug)]
pub struct Submitted {
    /// Submitted [`Review`].
    review: domain::Review,

    /// Reviewed car with its recalculated rating.
    car: domain::Car,
}

impl From<(domain::Review, domain::Car)> for Submitted {
    fn from((review, car): (domain::Review, domain::Car)) -> Self {
        Self { review, car }
    }
}

/// Result of a `Review` submission.
#[graphql_object(name = "SubmittedReview", context = Context)]
impl Submitted {
    /// Submitted `Review`.
    #[must_use]
    pub fn review(&self) -> Review {
        self.review.clone().into()
    }

    /// Reviewed `Car` with its recalculated rating.
    #[must_use]
    pub fn car(&self) -> api::Car {
        self.car.clone().into()
    }
}

impl AsError for command::submit_review::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Invalid(e) => e.try_as_error(),
            Self::NotExists(_) => Some(Error::not_found(self)),
        }
    }
}
