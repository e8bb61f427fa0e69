//! Uploaded [`domain::Document`]-related definitions.

use base64::Engine as _;
use juniper::{GraphQLEnum, GraphQLInputObject};
use service::domain::{self, document};

use crate::Error;

/// Uploaded document.
#[derive(Clone, Debug, GraphQLInputObject)]
#[graphql(name = "DocumentInput")]
pub struct Input {
    /// Form field the document is uploaded as.
    pub field: Kind,

    /// Original name of the file.
    pub file_name: String,

    /// MIME type of the file, like `image/png`.
    pub content_type: String,

    /// Base64-encoded contents of the file.
    pub content: String,
}

impl Input {
    /// Decodes this [`Input`] into a [`domain::Document`].
    ///
    /// # Errors
    ///
    /// If the contents are not valid Base64.
    pub fn decode(self) -> Result<domain::Document, Error> {
        let Self {
            field,
            file_name,
            content_type,
            content,
        } = self;
        let kind = document::Kind::from(field);

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(content)
            .map_err(|e| {
                Error::validation(&format!(
                    "Invalid `{}`: content is not Base64: {e}",
                    kind.as_str(),
                ))
            })?;
        Ok(domain::Document {
            kind,
            file_name,
            content_type,
            bytes,
        })
    }

    /// Decodes all the provided [`Input`]s.
    ///
    /// # Errors
    ///
    /// If any of the contents is not valid Base64.
    pub fn decode_all(
        inputs: impl IntoIterator<Item = Self>,
    ) -> Result<Vec<domain::Document>, Error> {
        inputs.into_iter().map(Self::decode).collect()
    }
}

/// Form field a document is uploaded as.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "DocumentKind")]
pub enum Kind {
    /// Photo of the car.
    Image,

    /// Insurance certificate.
    Insurance,

    /// Registration certificate.
    #[graphql(name = "RC_BOOK")]
    Registration,
}

impl From<Kind> for document::Kind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Image => Self::Image,
            Kind::Insurance => Self::Insurance,
            Kind::Registration => Self::Registration,
        }
    }
}

#[cfg(test)]
mod spec {
    use service::domain::document;

    use super::{Input, Kind};

    fn input(content: &str) -> Input {
        Input {
            field: Kind::Registration,
            file_name: "rc.pdf".into(),
            content_type: "application/pdf".into(),
            content: content.into(),
        }
    }

    #[test]
    fn decodes_base64_content() {
        let doc = input("JVBERi0xLjQ=").decode().unwrap();

        assert_eq!(doc.kind, document::Kind::Registration);
        assert_eq!(doc.bytes, b"%PDF-1.4");
    }

    #[test]
    fn rejects_malformed_content() {
        let err = input("%%%").decode().unwrap_err();

        assert_eq!(err.code, "VALIDATION_ERROR");
        assert!(err.message.contains("rc_book"), "{}", err.message);
    }
}
