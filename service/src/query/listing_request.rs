//! [`Query`] collection related to [`ListingRequest`]s.

use common::operations::By;

use crate::{
    domain::{listing_request, ListingRequest},
    read,
};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`ListingRequest`] by its ID.
pub type ById = DatabaseQuery<By<Option<ListingRequest>, listing_request::Id>>;

/// Queries a list of [`ListingRequest`]s passing a filter.
pub type List =
    DatabaseQuery<By<Vec<ListingRequest>, read::listing_request::Filter>>;
