//! [`ListingRequest`] read definitions.

use crate::domain::{listing_request::Status, user, ListingRequest};

/// Filter of [`ListingRequest`]s.
#[derive(Clone, Debug, Default)]
pub struct Filter {
    /// [`Status`] to match, if any.
    pub status: Option<Status>,

    /// Owner [`user::Email`] to match, if any.
    pub owner_email: Option<user::Email>,
}

impl Filter {
    /// Indicates whether the provided [`ListingRequest`] passes this
    /// [`Filter`].
    #[must_use]
    pub fn matches(&self, request: &ListingRequest) -> bool {
        self.status.map_or(true, |s| request.status == s)
            && self
                .owner_email
                .as_ref()
                .map_or(true, |e| &request.owner.email == e)
    }
}
