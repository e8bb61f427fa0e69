//! [`Ticket`] definitions.

use common::{define_kind, unit, DateTime, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::Car;
use crate::domain::{car, document, payment, user, City};

/// Booking of a [`Car`] by a customer.
#[derive(Clone, Debug)]
pub struct Ticket {
    /// ID of this [`Ticket`].
    pub id: Id,

    /// Registration number of the booked [`Car`].
    pub car_number: car::Number,

    /// ID of the booked [`Car`]'s owner.
    pub owner_id: user::Id,

    /// ID of the customer who booked the [`Car`].
    pub user_id: user::Id,

    /// [`user::Email`] of the customer who booked the [`Car`].
    pub user_email: user::Email,

    /// Payment made for this [`Ticket`], if any.
    pub payment: Option<payment::Reference>,

    /// Photo of the booked [`Car`].
    pub image: document::Path,

    /// Pick-up [`Location`].
    pub location: Location,

    /// [`City`] the [`Car`] is permitted to be driven in.
    pub city: City,

    /// [`DateTime`] when the booking starts.
    pub from: StartDateTime,

    /// [`DateTime`] when the booking ends.
    pub to: EndDateTime,

    /// Charged amount.
    pub amount: Money,

    /// [`Status`] of this [`Ticket`].
    pub status: Status,

    /// ID of the refund issued on cancellation, if any.
    pub refund_id: Option<payment::RefundId>,

    /// [`DateTime`] when this [`Ticket`] was created.
    pub created_at: CreationDateTime,
}

impl Ticket {
    /// Indicates whether this [`Ticket`] is still upcoming while its end has
    /// already passed by the provided moment.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime) -> bool {
        self.status == Status::Upcoming && self.to.coerce() < now
    }
}

/// ID of a [`Ticket`].
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

/// Pick-up location of a [`Ticket`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Location(String);

impl Location {
    /// Creates a new [`Location`] if the given `location` is valid.
    #[must_use]
    pub fn new(location: impl Into<String>) -> Option<Self> {
        let location = location.into();
        let trimmed = location.trim();
        (!trimmed.is_empty() && trimmed.len() <= 512)
            .then(|| Self(trimmed.to_owned()))
    }
}

define_kind! {
    #[doc = "Status of a [`Ticket`]."]
    enum Status {
        #[doc = "Booking hasn't ended yet."]
        Upcoming = 1 => "upcoming",

        #[doc = "Booking has ended."]
        Expired = 2 => "expired",

        #[doc = "Booking has been cancelled."]
        Cancelled = 3 => "cancelled",
    }
}

/// [`DateTime`] when a [`Ticket`] booking starts.
pub type StartDateTime = DateTimeOf<(Ticket, unit::Start)>;

/// [`DateTime`] when a [`Ticket`] booking ends.
pub type EndDateTime = DateTimeOf<(Ticket, unit::End)>;

/// [`DateTime`] when a [`Ticket`] was created.
pub type CreationDateTime = DateTimeOf<(Ticket, unit::Creation)>;

#[cfg(test)]
pub(crate) mod spec {
    use std::time::Duration;

    use common::{DateTime, Money};
    use rust_decimal::Decimal;

    use crate::domain::{car, document, user, City};

    use super::{Id, Location, Status, Ticket};

    /// Creates an upcoming [`Ticket`] for the provided car ending at `to`.
    pub(crate) fn ticket(number: &str, to: DateTime) -> Ticket {
        Ticket {
            id: Id::new(),
            car_number: car::Number::parse(number).unwrap(),
            owner_id: user::Id::new(),
            user_id: user::Id::new(),
            user_email: user::Email::new("ravi@example.com").unwrap(),
            payment: None,
            image: document::Path::from(format!("image/{number}.png")),
            location: Location::new("Guindy").unwrap(),
            city: City::Chennai,
            from: (to - Duration::from_secs(86_400)).coerce(),
            to: to.coerce(),
            amount: Money::inr(Decimal::from(3000)),
            status: Status::Upcoming,
            refund_id: None,
            created_at: DateTime::now().coerce(),
        }
    }

    #[test]
    fn overdue_only_when_upcoming_and_ended() {
        let now = DateTime::now();
        let past = ticket("AB-1234", now - Duration::from_secs(60));
        let future = ticket("AB-1234", now + Duration::from_secs(60));

        assert!(past.is_overdue(now));
        assert!(!future.is_overdue(now));

        let cancelled = Ticket {
            status: Status::Cancelled,
            ..past
        };
        assert!(!cancelled.is_overdue(now));
    }

    #[test]
    fn location_is_trimmed() {
        assert_eq!(AsRef::<str>::as_ref(&Location::new(" Guindy ").unwrap()), "Guindy");
        assert!(Location::new("").is_none());
    }
}
