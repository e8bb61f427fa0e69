//! [`Ticket`]-related definitions.

use common::{DateTime, Handler as _, Money};
use derive_more::{Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{graphql_object, GraphQLEnum, GraphQLInputObject, GraphQLScalar};
use service::{command, domain, domain::validation::BookingForm, query};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{api, api::scalar, define_error, AsError, Context, Error};

/// Booking of a car by a customer.
#[derive(Clone, Debug)]
pub struct Ticket {
    /// Underlying [`domain::Ticket`].
    ticket: domain::Ticket,

    /// Booked [`domain::Car`], loaded on demand.
    car: OnceCell<Option<domain::Car>>,
}

impl From<domain::Ticket> for Ticket {
    fn from(ticket: domain::Ticket) -> Self {
        Self {
            ticket,
            car: OnceCell::new(),
        }
    }
}

impl Ticket {
    /// Returns the booked [`domain::Car`], if it's still listed.
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Car`] cannot be loaded.
    async fn booked_car(
        &self,
        ctx: &Context,
    ) -> Result<&Option<domain::Car>, Error> {
        let number = self.ticket.car_number.clone();
        self.car
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::car::ByNumber::by(number))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
            })
            .await
    }
}

/// Booking of a car by a customer.
#[graphql_object(context = Context)]
impl Ticket {
    /// Unique identifier of this `Ticket`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.ticket.id.into()
    }

    /// Registration number of the booked car.
    #[must_use]
    pub fn car_number(&self) -> &str {
        self.ticket.car_number.as_ref()
    }

    /// Booked `Car`, unless it has been delisted since.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Ticket.car",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn car(&self, ctx: &Context) -> Result<Option<api::Car>, Error> {
        Ok(self.booked_car(ctx).await?.clone().map(Into::into))
    }

    /// ID of the owner of the booked car.
    #[must_use]
    pub fn owner_id(&self) -> api::user::Id {
        self.ticket.owner_id.into()
    }

    /// ID of the customer who booked the car.
    #[must_use]
    pub fn user_id(&self) -> api::user::Id {
        self.ticket.user_id.into()
    }

    /// Email of the customer who booked the car.
    #[must_use]
    pub fn user_email(&self) -> &str {
        self.ticket.user_email.as_ref()
    }

    /// ID of the payment made for this `Ticket`, if any.
    #[must_use]
    pub fn payment_id(&self) -> Option<&str> {
        self.ticket.payment.as_ref().map(AsRef::<str>::as_ref)
    }

    /// ID of the refund issued on cancellation, if any.
    #[must_use]
    pub fn refund_id(&self) -> Option<&str> {
        self.ticket.refund_id.as_ref().map(AsRef::<str>::as_ref)
    }

    /// Photo of the booked car.
    #[must_use]
    pub fn image(&self) -> &str {
        self.ticket.image.as_ref()
    }

    /// Pick-up location.
    #[must_use]
    pub fn location(&self) -> &str {
        self.ticket.location.as_ref()
    }

    /// City the car is permitted to be driven in.
    #[must_use]
    pub fn permitted_city(&self) -> &str {
        self.ticket.city.as_str()
    }

    /// `DateTime` when this `Ticket` starts.
    #[must_use]
    pub fn from(&self) -> DateTime {
        self.ticket.from.coerce()
    }

    /// `DateTime` when this `Ticket` ends.
    #[must_use]
    pub fn to(&self) -> DateTime {
        self.ticket.to.coerce()
    }

    /// Charged amount.
    #[must_use]
    pub fn amount(&self) -> Money {
        self.ticket.amount
    }

    /// Status of this `Ticket`.
    #[must_use]
    pub fn status(&self) -> Status {
        self.ticket.status.into()
    }

    /// `DateTime` when this `Ticket` was booked.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.ticket.created_at.coerce()
    }
}

/// Unique identifier of a `Ticket`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::ticket::Id)]
#[into(domain::ticket::Id)]
#[graphql(name = "TicketId", transparent)]
pub struct Id(Uuid);

/// Status of a `Ticket`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "TicketStatus")]
pub enum Status {
    /// Booked and not yet over.
    Upcoming,

    /// Over without being cancelled.
    Expired,

    /// Cancelled by the customer or an administrator.
    Cancelled,
}

impl From<domain::ticket::Status> for Status {
    fn from(status: domain::ticket::Status) -> Self {
        use domain::ticket::Status as S;
        match status {
            S::Upcoming => Self::Upcoming,
            S::Expired => Self::Expired,
            S::Cancelled => Self::Cancelled,
        }
    }
}

/// Details of a car booking.
#[derive(Clone, Debug, GraphQLInputObject)]
#[graphql(name = "BookingInput")]
pub struct Input {
    /// Registration number of the car to book.
    pub car_number: Option<String>,

    /// ID of the car owner.
    pub owner_id: Option<api::user::Id>,

    /// Pick-up location.
    pub location: Option<String>,

    /// City the car is permitted to be driven in.
    pub permitted_city: Option<String>,

    /// `DateTime` when the booking starts.
    pub from: Option<DateTime>,

    /// `DateTime` when the booking ends.
    pub to: Option<DateTime>,

    /// Charged amount.
    pub amount: Option<scalar::Decimal>,

    /// ID of the payment made for the booking, if any.
    pub payment_id: Option<String>,
}

impl From<Input> for BookingForm {
    fn from(input: Input) -> Self {
        Self {
            car_number: input.car_number,
            owner_id: input.owner_id.map(Into::into),
            location: input.location,
            permitted_city: input.permitted_city,
            from: input.from,
            to: input.to,
            amount: input.amount.map(Into::into),
            payment_id: input.payment_id,
        }
    }
}

impl AsError for command::create_ticket::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::CarBusy(_) => Some(Error::conflict(self)),
            Self::CarNotExists(_) => Some(Error::not_found(self)),
            Self::Db(e) => e.try_as_error(),
            Self::Invalid(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::cancel_ticket::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "FORBIDDEN"]
                #[status = FORBIDDEN]
                #[message = "`Ticket` belongs to another customer"]
                NotOwner,
            }
        }

        match self {
            Self::AlreadyCancelled(_) | Self::Expired(_) => {
                Some(crate::Error::conflict(self))
            }
            Self::Db(e) => e.try_as_error(),
            Self::InvalidPayment(_) => Some(crate::Error::validation(self)),
            Self::NotCaptured(_) => Some(crate::Error::conflict(self)),
            Self::NotExists(_) => Some(crate::Error::not_found(self)),
            Self::NotOwner(_) => Some(Error::NotOwner.into()),
            Self::Payment(e) => e.try_as_error(),
            Self::UnrefundableAmount(_) => None,
        }
    }
}

#[cfg(test)]
mod spec {
    use service::{
        command::cancel_ticket::ExecutionError,
        domain::{payment, ticket},
        infra::payment as gateway,
    };

    use crate::AsError as _;

    #[test]
    fn cancellation_failures_keep_their_kind() {
        let id = ticket::Id::new();

        let err = ExecutionError::Expired(id).into_error();
        assert_eq!(err.code, "CONFLICT");
        assert_eq!(err.status_code, http::StatusCode::CONFLICT);

        let err = ExecutionError::NotOwner(id).into_error();
        assert_eq!(err.code, "FORBIDDEN");

        let reason = "The amount must be atleast INR 1.00";
        let err =
            ExecutionError::Payment(gateway::Error::Rejected(reason.into()))
                .into_error();
        assert_eq!(err.code, "UPSTREAM_FAILURE");
        assert_eq!(err.status_code, http::StatusCode::BAD_GATEWAY);
        assert!(err.message.contains(reason), "{}", err.message);

        let err = ExecutionError::NotCaptured(payment::Status::from(
            "authorized".to_owned(),
        ))
        .into_error();
        assert_eq!(err.code, "CONFLICT");
    }
}
