//! [`Ticket`] read definitions.

use derive_more::{Display, From, Into};

use crate::domain::{user, Ticket};

/// Filter of [`Ticket`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct Filter {
    /// ID of the customer to match, if any.
    pub user_id: Option<user::Id>,

    /// ID of the car owner to match, if any.
    pub owner_id: Option<user::Id>,
}

impl Filter {
    /// Indicates whether the provided [`Ticket`] passes this [`Filter`].
    #[must_use]
    pub fn matches(&self, ticket: &Ticket) -> bool {
        self.user_id.map_or(true, |id| ticket.user_id == id)
            && self.owner_id.map_or(true, |id| ticket.owner_id == id)
    }
}

/// Total count of [`Ticket`]s.
#[derive(Clone, Copy, Debug, Display, Eq, From, Into, PartialEq)]
pub struct TotalCount(i32);

/// Number of [`Ticket`]s marked as expired by a single sweep.
#[derive(Clone, Copy, Debug, Display, Eq, From, Into, PartialEq)]
pub struct Expired(u64);
