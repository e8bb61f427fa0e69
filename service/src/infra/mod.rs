//! Infrastructure layer.

pub mod database;
pub mod notification;
pub mod payment;
pub mod storage;
pub mod verification;

#[cfg(any(test, feature = "memory"))]
pub use self::database::Memory;
pub use self::{
    database::Database, notification::Notifier, payment::PaymentGateway,
    storage::Storage,
};
#[cfg(feature = "postgres")]
pub use self::database::{postgres, Postgres};
