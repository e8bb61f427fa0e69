//! [`Query`] collection related to [`Review`]s.

use common::operations::By;

use crate::domain::{car, Review};
#[cfg(doc)]
use crate::{domain::Car, Query};

use super::DatabaseQuery;

/// Queries all the [`Review`]s of a [`Car`].
pub type OfCar = DatabaseQuery<By<Vec<Review>, car::Id>>;
