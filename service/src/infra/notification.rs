//! [`Notifier`] definitions.

use common::operations::Perform;
use derive_more::{Display, Error as StdError, From};
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport as _, Tokio1Executor,
};
use secrecy::{ExposeSecret as _, SecretString};
use tracerr::Traced;
use tracing as log;

use crate::domain::{user, verification, Ticket};

/// Notification operation.
pub use common::Handler as Notifier;

/// Message to notify a user with.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Message {
    /// Recipient of this [`Message`].
    pub to: user::Email,

    /// Subject of this [`Message`].
    pub subject: String,

    /// HTML body of this [`Message`].
    pub body: String,
}

impl Message {
    /// Creates a new [`Message`] confirming a booked [`Ticket`].
    #[must_use]
    pub fn ticket_confirmation(to: user::Email, ticket: &Ticket) -> Self {
        Self {
            to,
            subject: "Ticket Creation Confirmation".into(),
            body: format!(
                "<h2>Ticket Created Successfully!</h2>\
                 <p>Dear Customer,</p>\
                 <p>Your booking has been confirmed. \
                    Below are the details:</p>\
                 {details}\
                 <p>Thank you for booking with us!</p>",
                details = details(ticket, "Amount"),
            ),
        }
    }

    /// Creates a new [`Message`] confirming a cancelled [`Ticket`].
    #[must_use]
    pub fn ticket_cancellation(to: user::Email, ticket: &Ticket) -> Self {
        Self {
            to,
            subject: "Ticket Cancellation Confirmation".into(),
            body: format!(
                "<h2>Ticket Cancelled</h2>\
                 <p>Dear Customer,</p>\
                 <p>Your booking has been cancelled. \
                    Below are the details:</p>\
                 {details}\
                 <p>We hope to serve you again in the future.</p>",
                details = details(ticket, "Amount Refunded"),
            ),
        }
    }

    /// Creates a new [`Message`] carrying a [`verification::Code`].
    #[must_use]
    pub fn verification_code(
        to: user::Email,
        code: &verification::Code,
    ) -> Self {
        Self {
            to,
            subject: "Email Verification Code".into(),
            body: format!(
                "<p>Your verification code is <strong>{code}</strong>.</p>\
                 <p>If you didn't request it, ignore this email.</p>",
            ),
        }
    }
}

/// Renders [`Ticket`] details as an HTML list.
fn details(ticket: &Ticket, amount_label: &str) -> String {
    format!(
        "<ul>\
           <li><strong>Ticket ID:</strong> {id}</li>\
           <li><strong>Car Number:</strong> {number}</li>\
           <li><strong>Location:</strong> {location}</li>\
           <li><strong>Permitted City:</strong> {city}</li>\
           <li><strong>From:</strong> {from}</li>\
           <li><strong>To:</strong> {to}</li>\
           <li><strong>{amount_label}:</strong> \u{20b9}{amount}</li>\
         </ul>",
        id = ticket.id,
        number = ticket.car_number,
        location = ticket.location,
        city = ticket.city,
        from = ticket.from.to_rfc3339(),
        to = ticket.to.to_rfc3339(),
        amount = ticket.amount.amount.normalize(),
    )
}

/// [`Notifier`] sending emails over SMTP.
///
/// Only logs [`Message`]s when no transport is configured.
#[derive(Clone, Debug)]
pub struct Smtp {
    /// SMTP transport, if enabled.
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,

    /// Sender of all the emails.
    sender: Mailbox,
}

impl Smtp {
    /// Creates a new [`Smtp`] notifier relaying emails through the provided
    /// server with `STARTTLS`.
    ///
    /// # Errors
    ///
    /// If the `sender` is not a valid address, or the `host` cannot be used
    /// as a relay.
    pub fn new(
        host: &str,
        port: u16,
        username: impl Into<String>,
        password: &SecretString,
        sender: &str,
    ) -> Result<Self, Traced<Error>> {
        let transport =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(tracerr::from_and_wrap!(=> Error))?
                .port(port)
                .credentials(Credentials::new(
                    username.into(),
                    password.expose_secret().to_owned(),
                ))
                .build();
        Ok(Self {
            transport: Some(transport),
            sender: sender
                .parse()
                .map_err(tracerr::from_and_wrap!(=> Error))?,
        })
    }

    /// Creates a new [`Smtp`] notifier logging [`Message`]s instead of
    /// sending them.
    ///
    /// # Errors
    ///
    /// If the `sender` is not a valid address.
    pub fn disabled(sender: &str) -> Result<Self, Traced<Error>> {
        Ok(Self {
            transport: None,
            sender: sender
                .parse()
                .map_err(tracerr::from_and_wrap!(=> Error))?,
        })
    }
}

impl Notifier<Perform<Message>> for Smtp {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Perform(msg): Perform<Message>,
    ) -> Result<Self::Ok, Self::Err> {
        let Some(transport) = &self.transport else {
            log::info!(
                to = %msg.to,
                subject = %msg.subject,
                "email is not sent",
            );
            return Ok(());
        };

        let to: &str = msg.to.as_ref();
        let email = lettre::Message::builder()
            .from(self.sender.clone())
            .to(to
                .parse::<Mailbox>()
                .map_err(tracerr::from_and_wrap!(=> Error))?)
            .subject(msg.subject)
            .header(ContentType::TEXT_HTML)
            .body(msg.body)
            .map_err(tracerr::from_and_wrap!(=> Error))?;

        transport
            .send(email)
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map(drop)
    }
}

/// [`Notifier`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// Email address is invalid.
    #[display("Invalid email address: {_0}")]
    Address(lettre::address::AddressError),

    /// Email cannot be built.
    #[display("Failed to build email: {_0}")]
    Build(lettre::error::Error),

    /// SMTP transport failed.
    #[display("SMTP transport failed: {_0}")]
    Transport(lettre::transport::smtp::Error),
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::DateTime;

    use crate::domain::{ticket, user};

    use super::Message;

    #[test]
    fn ticket_messages_list_details() {
        let t = ticket::spec::ticket(
            "AB-1234",
            DateTime::now() + Duration::from_secs(3600),
        );
        let to = user::Email::new("ravi@example.com").unwrap();

        let created = Message::ticket_confirmation(to.clone(), &t);
        assert_eq!(created.subject, "Ticket Creation Confirmation");
        assert!(created.body.contains(&t.id.to_string()));
        assert!(created.body.contains("AB-1234"));
        assert!(created.body.contains("Guindy"));
        assert!(created.body.contains("chennai"));
        assert!(
            created.body.contains("<strong>Amount:</strong> \u{20b9}3000"),
        );

        let cancelled = Message::ticket_cancellation(to, &t);
        assert_eq!(cancelled.subject, "Ticket Cancellation Confirmation");
        assert!(
            cancelled
                .body
                .contains("Amount Refunded:</strong> \u{20b9}3000"),
        );
    }
}
