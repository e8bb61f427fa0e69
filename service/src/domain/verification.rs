//! Registration [`Code`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display};
use uuid::Uuid;

use crate::domain::user;

/// One-time code confirming an email address ownership.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str)]
pub struct Code(String);

impl Code {
    /// Number of digits in a [`Code`].
    pub const LEN: usize = 6;

    /// Generates a new random [`Code`].
    #[must_use]
    pub fn generate() -> Self {
        let n = Uuid::new_v4().as_u128() % 1_000_000;
        Self(format!("{n:06}"))
    }

    /// Creates a new [`Code`] if the given `code` consists of [`Code::LEN`]
    /// digits.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Option<Self> {
        let code = code.into();
        (code.len() == Self::LEN && code.bytes().all(|b| b.is_ascii_digit()))
            .then_some(Self(code))
    }
}

/// Registration awaiting its email confirmation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Registration {
    /// Name of the registering user.
    pub name: user::Name,

    /// Email of the registering user.
    pub email: user::Email,

    /// Phone of the registering user.
    pub phone: user::Phone,
}

/// [`DateTime`] when a [`Code`] expires.
pub type ExpirationDateTime = DateTimeOf<(Code, unit::Expiration)>;

#[cfg(test)]
mod spec {
    use super::Code;

    #[test]
    fn generates_six_digits() {
        for _ in 0..32 {
            let code = Code::generate();
            assert!(Code::new(code.as_ref()).is_some(), "{code}");
        }
    }

    #[test]
    fn rejects_malformed() {
        assert!(Code::new("12345").is_none());
        assert!(Code::new("1234567").is_none());
        assert!(Code::new("12a456").is_none());
    }
}
