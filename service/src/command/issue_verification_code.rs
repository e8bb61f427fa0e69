//! [`Command`] for issuing a [`verification::Code`].

use common::{
    operations::{Insert, Perform},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        validation::{Rejection, RegistrationForm},
        verification,
    },
    infra::{
        notification::{self, Message},
        verification::Pending,
        Notifier,
    },
    Service,
};

use super::Command;

/// [`Command`] for sending a fresh [`verification::Code`] to the email of a
/// registering user.
///
/// Replaces any [`verification::Code`] issued to the same email before.
#[derive(Clone, Debug)]
pub struct IssueVerificationCode {
    /// Registration fields as submitted.
    pub form: RegistrationForm,
}

impl<Db, Files, Pay, Mail> Command<IssueVerificationCode>
    for Service<Db, Files, Pay, Mail>
where
    Mail: Notifier<Perform<Message>, Err = Traced<notification::Error>>,
{
    type Ok = verification::ExpirationDateTime;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: IssueVerificationCode,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let registration = cmd
            .form
            .validate()
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let code = verification::Code::generate();
        let expires_at =
            (DateTime::now() + self.config().verification_code_ttl).coerce();
        let to = registration.email.clone();

        self.codes()
            .execute(Insert(Pending {
                code: code.clone(),
                registration,
                expires_at,
            }))
            .await
            .unwrap_or_else(|e| match e {});

        self.notifier()
            .execute(Perform(Message::verification_code(to, &code)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(expires_at)
    }
}

/// Error of [`IssueVerificationCode`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Submitted fields are invalid.
    #[display("Invalid registration: {_0}")]
    Invalid(Rejection),

    /// [`Notifier`] error.
    #[display("Failed to send verification code: {_0}")]
    Notification(notification::Error),
}

#[cfg(test)]
pub(crate) mod spec {
    use common::DateTime;

    use crate::{
        command::spec::{self as svc, Files, Mailer, Payments},
        domain::validation::RegistrationForm,
        Command as _,
    };

    use super::{ExecutionError, IssueVerificationCode};

    pub(crate) fn registration(email: &str) -> IssueVerificationCode {
        IssueVerificationCode {
            form: RegistrationForm {
                name: Some("Kavin".into()),
                email: Some(email.into()),
                phone: Some("9876543210".into()),
            },
        }
    }

    /// Extracts the code out of the last sent email.
    pub(crate) fn last_code(mailer: &Mailer) -> String {
        let sent = mailer.sent();
        let body = &sent.last().unwrap().body;
        let start = body.find("<strong>").unwrap() + "<strong>".len();
        body[start..start + 6].to_owned()
    }

    #[tokio::test]
    async fn sends_code_by_email() {
        let svc = svc::service();

        let expires_at = svc
            .execute(registration("kavin@example.com"))
            .await
            .unwrap();

        assert!(expires_at.coerce() > DateTime::now());
        let sent = svc.notifier().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to.to_string(), "kavin@example.com");
        assert_eq!(sent[0].subject, "Email Verification Code");
        assert!(last_code(svc.notifier()).bytes().all(|b| b.is_ascii_digit()));
    }

    #[tokio::test]
    async fn reports_undelivered_code() {
        let mailer = Mailer {
            broken: true,
            ..Mailer::default()
        };
        let svc = svc::with(Files::default(), Payments::default(), mailer);

        let err = svc
            .execute(registration("kavin@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::Notification(_)));
    }

    #[tokio::test]
    async fn rejects_malformed_email() {
        let svc = svc::service();

        let err = svc.execute(registration("kavin@")).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::Invalid(_)));
        assert!(svc.notifier().sent().is_empty());
    }
}
