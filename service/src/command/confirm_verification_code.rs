//! [`Command`] for confirming a [`verification::Code`].

use common::operations::{By, Delete};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        validation::{self, Rejection},
        verification,
    },
    infra::verification::{Claim, Pending},
    Service,
};

use super::Command;

/// [`Command`] for confirming the email of a registering user with the
/// [`verification::Code`] sent to it.
///
/// A confirmed [`verification::Code`] cannot be used again.
#[derive(Clone, Debug)]
pub struct ConfirmVerificationCode {
    /// Email the [`verification::Code`] has been sent to.
    pub email: String,

    /// Received [`verification::Code`].
    pub code: String,
}

impl<Db, Files, Pay, Mail> Command<ConfirmVerificationCode>
    for Service<Db, Files, Pay, Mail>
{
    type Ok = verification::Registration;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ConfirmVerificationCode,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let email = validation::email("email", &cmd.email)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        let code = verification::Code::new(cmd.code.trim())
            .ok_or_else(|| {
                Rejection::invalid(
                    "code",
                    format!("must be {} digits", verification::Code::LEN),
                )
            })
            .map_err(tracerr::from_and_wrap!(=> E))?;

        self.codes()
            .execute(Delete(By::<Option<Pending>, _>::new(Claim {
                email,
                code,
            })))
            .await
            .unwrap_or_else(|e| match e {})
            .map(|p| p.registration)
            .ok_or(E::Mismatch)
            .map_err(tracerr::wrap!())
    }
}

/// Error of [`ConfirmVerificationCode`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Submitted fields are invalid.
    #[display("Invalid verification: {_0}")]
    Invalid(Rejection),

    /// No such [`verification::Code`] has been issued for the email, or it
    /// has expired.
    #[display("Verification code is wrong or expired")]
    #[from(ignore)]
    Mismatch,
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{
            issue_verification_code::spec::{last_code, registration},
            spec as svc,
        },
        Command as _,
    };

    use super::{ConfirmVerificationCode, ExecutionError};

    fn confirmation(email: &str, code: &str) -> ConfirmVerificationCode {
        ConfirmVerificationCode {
            email: email.into(),
            code: code.into(),
        }
    }

    #[tokio::test]
    async fn confirms_issued_code_once() {
        let svc = svc::service();
        drop(svc.execute(registration("kavin@example.com")).await.unwrap());
        let code = last_code(svc.notifier());

        let registration = svc
            .execute(confirmation(" Kavin@Example.com ", &code))
            .await
            .unwrap();
        assert_eq!(registration.name.to_string(), "Kavin");
        assert_eq!(registration.phone.to_string(), "9876543210");

        let err = svc
            .execute(confirmation("kavin@example.com", &code))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::Mismatch));
    }

    #[tokio::test]
    async fn honors_only_latest_code() {
        let svc = svc::service();
        drop(svc.execute(registration("kavin@example.com")).await.unwrap());
        let first = last_code(svc.notifier());
        drop(svc.execute(registration("kavin@example.com")).await.unwrap());
        let second = last_code(svc.notifier());

        assert_ne!(first, second, "codes must be random");

        let err = svc
            .execute(confirmation("kavin@example.com", &first))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::Mismatch));
        assert!(svc
            .execute(confirmation("kavin@example.com", &second))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn rejects_malformed_input() {
        let svc = svc::service();

        let err = svc
            .execute(confirmation("kavin@example.com", "12ab56"))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::Invalid(_)));

        let err = svc
            .execute(confirmation("not-an-email", "123456"))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::Invalid(_)));
    }
}
