//! User-related definitions.
//!
//! Users are registered and authenticated elsewhere, so only the data carried
//! by their sessions is exposed.

use derive_more::{Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::domain::user;
use uuid::Uuid;

use crate::{Context, Session};

/// Currently authenticated user.
#[derive(Clone, Debug, From)]
pub struct Viewer(Session);

/// Currently authenticated user.
#[graphql_object(context = Context)]
impl Viewer {
    /// Unique identifier of this `Viewer`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.user_id.into()
    }

    /// Email of this `Viewer`.
    #[must_use]
    pub fn email(&self) -> &str {
        self.0.email.as_ref()
    }

    /// Role of this `Viewer`.
    #[must_use]
    pub fn role(&self) -> Role {
        self.0.role.into()
    }
}

/// Unique identifier of a `User`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(user::Id)]
#[into(user::Id)]
#[graphql(name = "UserId", transparent)]
pub struct Id(Uuid);

/// Role of a `User`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "UserRole")]
pub enum Role {
    /// Customer booking cars.
    Customer,

    /// Owner of listed cars.
    Renter,

    /// Administrator of the platform.
    Admin,
}

impl From<user::Role> for Role {
    fn from(role: user::Role) -> Self {
        match role {
            user::Role::Customer => Self::Customer,
            user::Role::Renter => Self::Renter,
            user::Role::Admin => Self::Admin,
        }
    }
}
