//! [`Review`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::Car;
use crate::domain::{car, user};

/// Review of a [`Car`] left by a customer.
#[derive(Clone, Debug)]
pub struct Review {
    /// ID of this [`Review`].
    pub id: Id,

    /// ID of the reviewed [`Car`].
    pub car_id: car::Id,

    /// ID of the author.
    pub author_id: user::Id,

    /// Displayed name of the author.
    pub author_name: user::Name,

    /// [`Rating`] given to the [`Car`].
    pub rating: Rating,

    /// [`Text`] of this [`Review`].
    pub text: Text,

    /// [`DateTime`] when this [`Review`] was created.
    pub created_at: CreationDateTime,
}

/// ID of a [`Review`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Rating given in a [`Review`], from 0 to 5.
#[derive(Clone, Copy, Debug, Display, Eq, Into, PartialEq)]
pub struct Rating(u8);

impl Rating {
    /// Highest possible [`Rating`].
    pub const MAX: u8 = 5;

    /// Creates a new [`Rating`] if the given `rating` doesn't exceed
    /// [`Rating::MAX`].
    #[must_use]
    pub fn new(rating: impl TryInto<u8>) -> Option<Self> {
        let rating = rating.try_into().ok()?;
        (rating <= Self::MAX).then_some(Self(rating))
    }
}

/// Free text of a [`Review`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Text(String);

impl Text {
    /// Creates a new [`Text`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `text` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Creates a new [`Text`] if the given `text` is valid.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        let trimmed = text.trim();
        (!trimmed.is_empty() && trimmed.len() <= 4096)
            .then(|| Self(trimmed.to_owned()))
    }
}

/// [`DateTime`] when a [`Review`] was created.
pub type CreationDateTime = DateTimeOf<(Review, unit::Creation)>;

#[cfg(test)]
mod spec {
    use super::{Rating, Text};

    #[test]
    fn rating_range() {
        assert!(Rating::new(0).is_some());
        assert!(Rating::new(5).is_some());
        assert!(Rating::new(6).is_none());
        assert!(Rating::new(-1).is_none());
    }

    #[test]
    fn text_is_trimmed() {
        assert_eq!(AsRef::<str>::as_ref(&Text::new("  great car ").unwrap()), "great car");
        assert!(Text::new("   ").is_none());
    }
}
