//! [`Command`] for creating a [`Ticket`].

use common::{
    operations::{
        By, Commit, CompareAndSwap, Insert, Lock, Perform, Select, Transact,
        Transacted,
    },
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        car, ticket, user,
        validation::{BookingForm, Rejection},
        Car, Ticket,
    },
    infra::{
        database,
        notification::{self, Message},
        Database, Notifier,
    },
    Service,
};

use super::Command;

/// [`Command`] for booking an available [`Car`].
///
/// The booked [`Car`] becomes busy until the [`Ticket`] is cancelled.
#[derive(Clone, Debug)]
pub struct CreateTicket {
    /// ID of the customer booking the [`Car`].
    pub user_id: user::Id,

    /// [`user::Email`] of the customer, receiving the [`Ticket`] updates.
    pub email: user::Email,

    /// Booking fields as submitted.
    pub form: BookingForm,
}

impl<Db, Files, Pay, Mail> Command<CreateTicket>
    for Service<Db, Files, Pay, Mail>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Car, car::Number>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Car>, car::Number>>,
            Ok = Option<Car>,
            Err = Traced<database::Error>,
        > + Database<
            CompareAndSwap<car::Number, car::Status>,
            Ok = Option<Car>,
            Err = Traced<database::Error>,
        > + Database<Insert<Ticket>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Mail: Notifier<Perform<Message>, Err = Traced<notification::Error>>,
{
    type Ok = Ticket;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateTicket) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateTicket {
            user_id,
            email,
            form,
        } = cmd;

        let draft = form.validate().map_err(tracerr::from_and_wrap!(=> E))?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent bookings of the same `Car`.
        tx.execute(Lock(By::<Car, _>::new(draft.car_number.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let car = tx
            .execute(Select(By::<Option<Car>, _>::new(
                draft.car_number.clone(),
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| E::CarNotExists(draft.car_number.clone()))
            .map_err(tracerr::wrap!())?;
        if car.status == car::Status::Busy {
            return Err(tracerr::new!(E::CarBusy(car.number)));
        }

        let car = tx
            .execute(CompareAndSwap {
                key: car.number.clone(),
                current: car::Status::Available,
                new: car::Status::Busy,
            })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::CarBusy(car.number))
            .map_err(tracerr::wrap!())?;

        let ticket = Ticket {
            id: ticket::Id::new(),
            car_number: car.number,
            owner_id: draft.owner_id,
            user_id,
            user_email: email,
            payment: draft.payment,
            image: car.image,
            location: draft.location,
            city: draft.city,
            from: draft.from,
            to: draft.to,
            amount: draft.amount,
            status: ticket::Status::Upcoming,
            refund_id: None,
            created_at: DateTime::now().coerce(),
        };
        tx.execute(Insert(ticket.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if let Err(e) = self
            .notifier()
            .execute(Perform(Message::ticket_confirmation(
                ticket.user_email.clone(),
                &ticket,
            )))
            .await
        {
            log::error!(
                "failed to confirm `Ticket(id: {})` creation: {e}",
                ticket.id,
            );
        }

        Ok(ticket)
    }
}

/// Error of [`CreateTicket`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Car`] is already booked.
    #[display("`Car(number: {_0})` is already booked")]
    #[from(ignore)]
    CarBusy(#[error(not(source))] car::Number),

    /// [`Car`] with the provided number does not exist.
    #[display("`Car(number: {_0})` does not exist")]
    #[from(ignore)]
    CarNotExists(#[error(not(source))] car::Number),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Submitted fields are invalid.
    #[display("{_0}")]
    Invalid(Rejection),
}

#[cfg(test)]
pub(crate) mod spec {
    use std::time::Duration;

    use common::{
        operations::{By, Insert, Select},
        DateTime,
    };
    use rust_decimal::Decimal;

    use crate::{
        command::spec::{self as svc, Files, Mailer, Payments, TestService},
        domain::{
            car, listing_request::spec::request, ticket, user,
            validation::BookingForm, Car,
        },
        infra::Database as _,
        read, Command as _,
    };

    use super::{CreateTicket, ExecutionError};

    /// Lists an available [`Car`] with the provided number.
    pub(crate) async fn listed(svc: &TestService, number: &str) -> Car {
        let car = request(number, "01-01-2025", "31-12-2025").to_car().unwrap();
        svc.database().execute(Insert(car.clone())).await.unwrap();
        car
    }

    pub(crate) fn booking(
        number: &str,
        payment_id: Option<&str>,
    ) -> CreateTicket {
        let from = DateTime::now() + Duration::from_secs(3600);
        CreateTicket {
            user_id: user::Id::new(),
            email: user::Email::new("ravi@example.com").unwrap(),
            form: BookingForm {
                car_number: Some(number.into()),
                owner_id: Some(user::Id::new()),
                location: Some("Guindy".into()),
                permitted_city: Some("chennai".into()),
                from: Some(from),
                to: Some(from + Duration::from_secs(2 * 86_400)),
                amount: Some(Decimal::from(3000)),
                payment_id: payment_id.map(Into::into),
            },
        }
    }

    async fn status(svc: &TestService, number: &car::Number) -> car::Status {
        svc.database()
            .execute(Select(By::<Option<Car>, _>::new(number.clone())))
            .await
            .unwrap()
            .unwrap()
            .status
    }

    #[tokio::test]
    async fn books_available_car() {
        let svc = svc::service();
        let car = listed(&svc, "AB-1234").await;

        let t = svc.execute(booking("AB-1234", None)).await.unwrap();

        assert_eq!(t.status, ticket::Status::Upcoming);
        assert_eq!(t.car_number, car.number);
        assert_eq!(t.image, car.image);
        assert_eq!(status(&svc, &car.number).await, car::Status::Busy);

        let sent = svc.notifier().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Ticket Creation Confirmation");
        assert_eq!(AsRef::<str>::as_ref(&sent[0].to), "ravi@example.com");
    }

    #[tokio::test]
    async fn refuses_busy_car_without_ticket() {
        let svc = svc::service();
        let car = listed(&svc, "AB-1234").await;
        drop(svc.execute(booking("AB-1234", None)).await.unwrap());

        let err = svc.execute(booking("AB-1234", None)).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::CarBusy(n) if *n == car.number,
        ));
        let tickets = svc
            .database()
            .execute(Select(By::<Vec<ticket::Ticket>, _>::new(
                read::ticket::Filter::default(),
            )))
            .await
            .unwrap();
        assert_eq!(tickets.len(), 1);
    }

    #[tokio::test]
    async fn refuses_unknown_car() {
        let svc = svc::service();

        let err = svc.execute(booking("ZZ-0000", None)).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::CarNotExists(_)));
    }

    #[tokio::test]
    async fn keeps_booking_when_notification_fails() {
        let mailer = Mailer {
            broken: true,
            ..Mailer::default()
        };
        let svc = svc::with(Files::default(), Payments::default(), mailer);
        let car = listed(&svc, "AB-1234").await;

        let t = svc.execute(booking("AB-1234", None)).await.unwrap();

        assert_eq!(t.status, ticket::Status::Upcoming);
        assert_eq!(status(&svc, &car.number).await, car::Status::Busy);
        assert!(svc.notifier().sent().is_empty());
    }
}
