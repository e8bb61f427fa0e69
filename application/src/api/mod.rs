//! GraphQL API definitions.

pub mod car;
pub mod document;
pub mod listing_request;
mod mutation;
mod query;
pub mod review;
pub mod scalar;
pub mod ticket;
pub mod user;
pub mod vehicle;
pub mod verification;

use juniper::EmptySubscription;

use crate::Context;

pub use self::{
    car::Car, listing_request::ListingRequest, mutation::Mutation,
    query::Query, review::Review, ticket::Ticket, vehicle::Vehicle,
};

/// GraphQL schema.
pub type Schema =
    juniper::RootNode<'static, Query, Mutation, EmptySubscription<Context>>;
