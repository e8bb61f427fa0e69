//! Background [`Task`]s definitions.

mod background;
pub mod evict_verification_codes;
pub mod expire_tickets;

pub use common::Handler as Task;

pub use self::{
    background::Background, evict_verification_codes::EvictVerificationCodes,
    expire_tickets::ExpireTickets,
};
