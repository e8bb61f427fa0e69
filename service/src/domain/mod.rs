//! Domain definitions.

pub mod car;
pub mod city;
pub mod document;
pub mod listing_request;
pub mod payment;
pub mod review;
pub mod ticket;
pub mod user;
pub mod validation;
pub mod vehicle;
pub mod verification;

pub use self::{
    car::Car, city::City, document::Document, listing_request::ListingRequest,
    review::Review, ticket::Ticket, user::User, vehicle::Vehicle,
};
