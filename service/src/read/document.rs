//! [`document::Path`] read definitions.

use derive_more::{From, Into};

#[cfg(doc)]
use crate::domain::{document, Car, ListingRequest, Ticket};

/// Indicator whether a stored [`document::Path`] is still referred by any
/// [`Car`], [`ListingRequest`] or [`Ticket`].
#[derive(Clone, Copy, Debug, Eq, From, Into, PartialEq)]
pub struct Referenced(bool);
