//! Uploaded [`Document`] definitions.

use common::define_kind;
use derive_more::{AsRef, Display, From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};

define_kind! {
    #[doc = "Kind of an uploaded document, matching its form field name."]
    enum Kind {
        #[doc = "Photo of a car."]
        Image = 1 => "image",

        #[doc = "Insurance policy of a car."]
        Insurance = 2 => "insurance",

        #[doc = "Registration certificate of a car."]
        Registration = 3 => "rc_book",
    }
}

impl Kind {
    /// Indicates whether the provided MIME `content_type` is acceptable for
    /// this [`Kind`] of document.
    #[must_use]
    pub fn accepts(self, content_type: &str) -> bool {
        match self {
            Self::Image => content_type.starts_with("image/"),
            Self::Insurance | Self::Registration => {
                content_type == "application/pdf"
            }
        }
    }
}

/// File uploaded along with a request, not yet stored.
#[derive(Clone, Debug)]
pub struct Document {
    /// [`Kind`] of this [`Document`].
    pub kind: Kind,

    /// Original file name of this [`Document`].
    pub file_name: String,

    /// MIME type of this [`Document`].
    pub content_type: String,

    /// Raw contents of this [`Document`].
    pub bytes: Vec<u8>,
}

/// Location of a stored [`Document`].
#[derive(AsRef, Clone, Debug, Display, Eq, From, Hash, Into, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Path(String);

#[cfg(test)]
mod spec {
    use super::Kind;

    #[test]
    fn accepts_by_kind() {
        assert!(Kind::Image.accepts("image/png"));
        assert!(Kind::Image.accepts("image/jpeg"));
        assert!(!Kind::Image.accepts("application/pdf"));
        assert!(Kind::Insurance.accepts("application/pdf"));
        assert!(!Kind::Registration.accepts("image/png"));
    }
}
