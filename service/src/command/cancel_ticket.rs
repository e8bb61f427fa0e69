//! [`Command`] for cancelling a [`Ticket`].

use common::{
    operations::{
        By, Commit, CompareAndSwap, Lock, Perform, Select, Transact,
        Transacted, Update,
    },
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{car, payment, ticket, user, Car, Ticket},
    infra::{
        database,
        notification::{self, Message},
        payment::{self as gateway, Payment, Refund},
        Database, Notifier, PaymentGateway,
    },
    Service,
};

use super::Command;

/// [`Command`] for cancelling an upcoming [`Ticket`], refunding its payment.
///
/// Nothing is cancelled unless the refund succeeds. The confirmation is sent
/// to the customer who booked the [`Ticket`].
#[derive(Clone, Debug)]
pub struct CancelTicket {
    /// ID of the [`Ticket`] to cancel.
    pub id: ticket::Id,

    /// ID of the customer who must own the [`Ticket`], or [`None`] if the
    /// initiator may cancel any [`Ticket`].
    pub owner: Option<user::Id>,
}

impl<Db, Files, Pay, Mail> Command<CancelTicket>
    for Service<Db, Files, Pay, Mail>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Ticket, ticket::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Ticket>, ticket::Id>>,
            Ok = Option<Ticket>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Car, car::Number>>,
            Err = Traced<database::Error>,
        > + Database<Update<Ticket>, Err = Traced<database::Error>>
        + Database<
            CompareAndSwap<car::Number, car::Status>,
            Ok = Option<Car>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
    Pay: PaymentGateway<
            Select<By<Payment, payment::Id>>,
            Ok = Payment,
            Err = Traced<gateway::Error>,
        > + PaymentGateway<
            Perform<Refund>,
            Ok = payment::RefundId,
            Err = Traced<gateway::Error>,
        >,
    Mail: Notifier<Perform<Message>, Err = Traced<notification::Error>>,
{
    type Ok = Ticket;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CancelTicket) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CancelTicket { id, owner } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent cancellations, so refunds.
        tx.execute(Lock(By::<Ticket, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut ticket = tx
            .execute(Select(By::<Option<Ticket>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NotExists(id))
            .map_err(tracerr::wrap!())?;
        if owner.is_some_and(|o| o != ticket.user_id) {
            return Err(tracerr::new!(E::NotOwner(id)));
        }

        match ticket.status {
            ticket::Status::Expired => {
                return Err(tracerr::new!(E::Expired(id)));
            }
            ticket::Status::Cancelled => {
                return Err(tracerr::new!(E::AlreadyCancelled(id)));
            }
            ticket::Status::Upcoming => {}
        }
        if ticket.is_overdue(DateTime::now()) {
            ticket.status = ticket::Status::Expired;
            tx.execute(Update(ticket))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
            tx.execute(Commit)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
            return Err(tracerr::new!(E::Expired(id)));
        }

        if let Some(reference) = &ticket.payment {
            let payment_id = reference
                .to_id()
                .ok_or_else(|| E::InvalidPayment(reference.clone()))
                .map_err(tracerr::wrap!())?;
            let amount = ticket
                .amount
                .minor_units()
                .ok_or(E::UnrefundableAmount(ticket.amount))
                .map_err(tracerr::wrap!())?;

            let payment = self
                .payments()
                .execute(Select(By::<Payment, _>::new(payment_id.clone())))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if !payment.status.is_captured() {
                return Err(tracerr::new!(E::NotCaptured(payment.status)));
            }

            ticket.refund_id = Some(
                self.payments()
                    .execute(Perform(Refund {
                        payment_id,
                        amount,
                        speed: self.config().refund_speed,
                    }))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?,
            );
        }

        ticket.status = ticket::Status::Cancelled;
        tx.execute(Update(ticket.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        // Avoid releasing the `Car` while it's being booked.
        tx.execute(Lock(By::<Car, _>::new(ticket.car_number.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        let released = tx
            .execute(CompareAndSwap {
                key: ticket.car_number.clone(),
                current: car::Status::Busy,
                new: car::Status::Available,
            })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if released.is_none() {
            log::warn!(
                "`Car(number: {})` of cancelled `Ticket(id: {id})` \
                 is not busy",
                ticket.car_number,
            );
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if let Err(e) = self
            .notifier()
            .execute(Perform(Message::ticket_cancellation(
                ticket.user_email.clone(),
                &ticket,
            )))
            .await
        {
            log::error!(
                "failed to confirm `Ticket(id: {id})` cancellation: {e}",
            );
        }

        Ok(ticket)
    }
}

/// Error of [`CancelTicket`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Ticket`] is already cancelled.
    #[display("`Ticket(id: {_0})` is already cancelled")]
    #[from(ignore)]
    AlreadyCancelled(#[error(not(source))] ticket::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Ticket`] has expired.
    #[display("`Ticket(id: {_0})` has expired")]
    #[from(ignore)]
    Expired(#[error(not(source))] ticket::Id),

    /// [`Ticket`] refers to a malformed payment.
    #[display("`{_0}` is not a valid payment ID")]
    #[from(ignore)]
    InvalidPayment(#[error(not(source))] payment::Reference),

    /// Payment has not been captured, so cannot be refunded.
    #[display("Payment is not captured, but `{_0}`")]
    #[from(ignore)]
    NotCaptured(#[error(not(source))] payment::Status),

    /// [`Ticket`] with the provided ID does not exist.
    #[display("`Ticket(id: {_0})` does not exist")]
    #[from(ignore)]
    NotExists(#[error(not(source))] ticket::Id),

    /// [`Ticket`] belongs to another customer.
    #[display("`Ticket(id: {_0})` belongs to another customer")]
    #[from(ignore)]
    NotOwner(#[error(not(source))] ticket::Id),

    /// [`PaymentGateway`] error.
    #[display("{_0}")]
    Payment(gateway::Error),

    /// Charged amount cannot be expressed in minor currency units.
    #[display("`{_0}` cannot be refunded")]
    #[from(ignore)]
    UnrefundableAmount(#[error(not(source))] Money),
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{
        operations::{By, Insert, Select},
        DateTime,
    };

    use crate::{
        command::{
            create_ticket::spec::{booking, listed},
            spec::{self as svc, Files, Mailer, Payments, TestService},
        },
        domain::{car, payment, ticket, user, Car, Ticket},
        infra::{payment::Refund, Database as _, Memory},
        Command as _, Config, Service,
    };

    use super::{CancelTicket, ExecutionError};

    fn cancel(t: &Ticket) -> CancelTicket {
        CancelTicket {
            id: t.id,
            owner: Some(t.user_id),
        }
    }

    async fn stored(svc: &TestService, id: ticket::Id) -> Ticket {
        svc.database()
            .execute(Select(By::<Option<Ticket>, _>::new(id)))
            .await
            .unwrap()
            .unwrap()
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
    async fn releases_car_without_gateway_call() {
        let svc = svc::service();
        let car = listed(&svc, "AB-1234").await;
        let t = svc.execute(booking("AB-1234", None)).await.unwrap();

        let cancelled = svc.execute(cancel(&t)).await.unwrap();

        assert_eq!(cancelled.status, ticket::Status::Cancelled);
        assert!(cancelled.refund_id.is_none());
        let status_of = stored(&svc, t.id).await.status;
        assert_eq!(status_of, ticket::Status::Cancelled);
        assert_eq!(status(&svc, &car.number).await, car::Status::Available);
        assert_eq!(svc.payments().fetched(), 0);
        assert!(svc.payments().refunds().is_empty());

        let sent = svc.notifier().sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].subject, "Ticket Cancellation Confirmation");
    }

    #[tokio::test]
    async fn refunds_captured_payment_once() {
        let svc = svc::service();
        drop(listed(&svc, "AB-1234").await);
        let t = svc
            .execute(booking("AB-1234", Some("pay_29QQoUBi66xm2f")))
            .await
            .unwrap();

        let cancelled = svc.execute(cancel(&t)).await.unwrap();

        let refunds = svc.payments().refunds();
        assert_eq!(refunds.len(), 1);
        let Refund {
            payment_id,
            amount,
            speed,
        } = &refunds[0];
        assert_eq!(payment_id.to_string(), "pay_29QQoUBi66xm2f");
        assert_eq!(*amount, 300_000);
        assert_eq!(*speed, payment::RefundSpeed::Normal);
        assert_eq!(
            cancelled.refund_id,
            Some(payment::RefundId::from("rfnd_1".to_owned())),
        );
        assert_eq!(stored(&svc, t.id).await.refund_id, cancelled.refund_id);
    }

    #[tokio::test]
    async fn requests_configured_refund_speed() {
        let svc = Service::unstarted(
            Config {
                refund_speed: payment::RefundSpeed::Optimum,
                ..svc::config()
            },
            Memory::new(),
            Files::default(),
            Payments::default(),
            Mailer::default(),
        );
        drop(listed(&svc, "AB-1234").await);
        let t = svc
            .execute(booking("AB-1234", Some("pay_29QQoUBi66xm2f")))
            .await
            .unwrap();

        drop(svc.execute(cancel(&t)).await.unwrap());

        let refunds = svc.payments().refunds();
        assert_eq!(refunds.len(), 1);
        assert_eq!(refunds[0].speed, payment::RefundSpeed::Optimum);
        assert_eq!(refunds[0].speed.to_string(), "optimum");
    }

    #[tokio::test]
    async fn keeps_cancellation_when_notification_fails() {
        let mailer = Mailer {
            broken: true,
            ..Mailer::default()
        };
        let svc = svc::with(Files::default(), Payments::default(), mailer);
        let car = listed(&svc, "AB-1234").await;
        let t = svc.execute(booking("AB-1234", None)).await.unwrap();

        let cancelled = svc.execute(cancel(&t)).await.unwrap();

        assert_eq!(cancelled.status, ticket::Status::Cancelled);
        let status_of = stored(&svc, t.id).await.status;
        assert_eq!(status_of, ticket::Status::Cancelled);
        assert_eq!(status(&svc, &car.number).await, car::Status::Available);
        assert!(svc.notifier().sent().is_empty());
    }

    #[tokio::test]
    async fn confirms_cancellation_to_booking_customer() {
        let svc = svc::service();
        drop(listed(&svc, "AB-1234").await);
        let t = svc.execute(booking("AB-1234", None)).await.unwrap();

        drop(
            svc.execute(CancelTicket {
                id: t.id,
                owner: None,
            })
            .await
            .unwrap(),
        );

        let sent = svc.notifier().sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].subject, "Ticket Cancellation Confirmation");
        assert_eq!(sent[1].to, t.user_email);
        assert_eq!(AsRef::<str>::as_ref(&sent[1].to), "ravi@example.com");
    }

    #[tokio::test]
    async fn keeps_ticket_when_payment_is_not_captured() {
        let payments = Payments {
            status: payment::Status::from("authorized".to_owned()),
            ..Payments::default()
        };
        let svc = svc::with(Files::default(), payments, Mailer::default());
        let car = listed(&svc, "AB-1234").await;
        let t = svc
            .execute(booking("AB-1234", Some("pay_29QQoUBi66xm2f")))
            .await
            .unwrap();

        let err = svc.execute(cancel(&t)).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotCaptured(_)));
        assert!(svc.payments().refunds().is_empty());
        assert_eq!(stored(&svc, t.id).await.status, ticket::Status::Upcoming);
        assert_eq!(status(&svc, &car.number).await, car::Status::Busy);
    }

    #[tokio::test]
    async fn keeps_ticket_when_refund_is_rejected() {
        let payments = Payments {
            refusal: Some("The payment has been fully refunded".into()),
            ..Payments::default()
        };
        let svc = svc::with(Files::default(), payments, Mailer::default());
        let car = listed(&svc, "AB-1234").await;
        let t = svc
            .execute(booking("AB-1234", Some("pay_29QQoUBi66xm2f")))
            .await
            .unwrap();

        let err = svc.execute(cancel(&t)).await.unwrap_err();

        assert_eq!(
            err.as_ref().to_string(),
            "The payment has been fully refunded",
        );
        assert_eq!(stored(&svc, t.id).await.status, ticket::Status::Upcoming);
        assert_eq!(status(&svc, &car.number).await, car::Status::Busy);
    }

    #[tokio::test]
    async fn refuses_malformed_payment_reference() {
        let svc = svc::service();
        drop(listed(&svc, "AB-1234").await);
        let t = svc
            .execute(booking("AB-1234", Some("order_123")))
            .await
            .unwrap();

        let err = svc.execute(cancel(&t)).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::InvalidPayment(_)));
        assert_eq!(svc.payments().fetched(), 0);
    }

    #[tokio::test]
    async fn refuses_terminal_or_overdue_tickets() {
        let svc = svc::service();
        drop(listed(&svc, "AB-1234").await);
        let t = svc.execute(booking("AB-1234", None)).await.unwrap();
        drop(svc.execute(cancel(&t)).await.unwrap());

        let err = svc.execute(cancel(&t)).await.unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::AlreadyCancelled(_)));

        let ended = DateTime::now() - Duration::from_secs(60);
        let overdue = ticket::spec::ticket("AB-1234", ended);
        svc.database().execute(Insert(overdue.clone())).await.unwrap();
        let err = svc.execute(cancel(&overdue)).await.unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::Expired(_)));
        assert_eq!(
            stored(&svc, overdue.id).await.status,
            ticket::Status::Expired,
        );

        let err = svc.execute(cancel(&overdue)).await.unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::Expired(_)));
    }

    #[tokio::test]
    async fn refuses_foreign_ticket() {
        let svc = svc::service();
        drop(listed(&svc, "AB-1234").await);
        let t = svc.execute(booking("AB-1234", None)).await.unwrap();

        let err = svc
            .execute(CancelTicket {
                owner: Some(user::Id::new()),
                ..cancel(&t)
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotOwner(_)));

        let by_admin = svc
            .execute(CancelTicket {
                owner: None,
                ..cancel(&t)
            })
            .await
            .unwrap();
        assert_eq!(by_admin.status, ticket::Status::Cancelled);
    }

    #[tokio::test]
    async fn fails_on_unknown_ticket() {
        let svc = svc::service();
        let t = ticket::spec::ticket("AB-1234", DateTime::now());

        let err = svc.execute(cancel(&t)).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotExists(_)));
    }
}
