//! Read entities definitions.

pub mod car;
pub mod document;
pub mod listing_request;
pub mod ticket;
