//! [`Session`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, FromStr};
use serde::{Deserialize, Serialize};

#[cfg(doc)]
use crate::domain::User;
use crate::domain::user::{self, Role};

/// User session issued by the external identity service.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Session {
    /// ID of the [`User`] this [`Session`] belongs to.
    #[serde(rename = "id")]
    pub user_id: user::Id,

    /// [`user::Email`] of the [`User`] this [`Session`] belongs to.
    pub email: user::Email,

    /// [`Role`] of the [`User`] this [`Session`] belongs to.
    #[serde(with = "role")]
    pub role: Role,

    /// [`DateTime`] when this [`Session`] expires.
    #[serde(rename = "exp", with = "common::datetime::serde::unix_timestamp")]
    pub expires_at: ExpirationDateTime,
}

impl Session {
    /// Indicates whether this [`Session`] belongs to an administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Indicates whether this [`Session`] may manage listed cars.
    #[must_use]
    pub fn may_list_cars(&self) -> bool {
        matches!(self.role, Role::Renter | Role::Admin)
    }
}

/// Access token of a [`Session`].
#[derive(AsRef, Clone, Debug, Display, FromStr)]
pub struct Token(String);

impl Token {
    /// Creates a new [`Token`] without checking its contents.
    ///
    /// # Safety
    ///
    /// The provided `token` must be a valid [`Token`] representation.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub const unsafe fn new_unchecked(token: String) -> Self {
        Self(token)
    }
}

/// [`DateTime`] of a [`Session`] expiration.
pub type ExpirationDateTime = DateTimeOf<(Session, unit::Expiration)>;

mod role {
    //! [`Role`] (de)serialization in its textual form.

    use std::str::FromStr as _;

    use serde::{de::Error as _, Deserialize as _, Deserializer, Serializer};

    use super::Role;

    pub(super) fn serialize<S: Serializer>(
        role: &Role,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(role.as_str())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Role, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Role::from_str(&raw)
            .map_err(|_| D::Error::custom(format!("unknown role: {raw}")))
    }
}
