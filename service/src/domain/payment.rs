//! Payment gateway values.

use std::sync::LazyLock;

use derive_more::{AsRef, Display, From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use serde::Deserialize;

/// ID of a payment in the gateway, like `pay_29QQoUBi66xm2f`.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
pub struct Id(String);

impl Id {
    /// Creates a new [`Id`] if the given `id` is valid.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        Self::check(&id).then_some(Self(id))
    }

    /// Checks whether the given `id` is a valid [`Id`].
    fn check(id: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Id`] format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^pay_[A-Za-z0-9]+$").expect("valid regex")
        });

        REGEX.is_match(id.as_ref())
    }
}

/// Payment reference attached to a booking, as provided by the client.
///
/// Becomes an [`Id`] only once checked.
#[derive(AsRef, Clone, Debug, Display, Eq, From, Into, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Reference(String);

impl Reference {
    /// Checks this [`Reference`] to be a valid payment [`Id`].
    #[must_use]
    pub fn to_id(&self) -> Option<Id> {
        Id::new(self.0.clone())
    }
}

/// ID of a refund issued by the gateway.
#[derive(AsRef, Clone, Debug, Display, Eq, From, Into, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct RefundId(String);

/// State of a payment as reported by the gateway.
#[derive(AsRef, Clone, Debug, Display, Eq, From, PartialEq)]
#[as_ref(str)]
pub struct Status(String);

impl Status {
    /// Indicates whether the payment has been captured, so may be refunded.
    #[must_use]
    pub fn is_captured(&self) -> bool {
        self.0 == "captured"
    }
}

/// Speed of a refund processing.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Display, Eq, PartialEq,
)]
#[serde(rename_all = "lowercase")]
pub enum RefundSpeed {
    /// Regular processing.
    #[default]
    #[display("normal")]
    Normal,

    /// Instant processing.
    #[display("optimum")]
    Optimum,
}

#[cfg(test)]
mod spec {
    use super::{Id, Reference, Status};

    #[test]
    fn id_format() {
        assert!(Id::new("pay_29QQoUBi66xm2f").is_some());
        assert!(Id::new("pay_").is_none());
        assert!(Id::new("order_29QQoUBi66xm2f").is_none());
        assert!(Id::new("pay_29QQ oUBi").is_none());
        assert!(Reference::from("bogus".to_owned()).to_id().is_none());
    }

    #[test]
    fn only_captured_is_refundable() {
        assert!(Status::from("captured".to_owned()).is_captured());
        assert!(!Status::from("authorized".to_owned()).is_captured());
        assert!(!Status::from("refunded".to_owned()).is_captured());
    }
}
