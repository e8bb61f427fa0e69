//! Verification code related definitions.

use derive_more::From;
use juniper::{graphql_object, GraphQLInputObject};
use service::{command, domain, domain::validation::RegistrationForm};

use crate::{AsError, Context, Error};

/// Registration confirmed by a verification code.
#[derive(Clone, Debug, From)]
pub struct Registration(domain::verification::Registration);

/// Registration confirmed by a verification code.
#[graphql_object(name = "VerifiedRegistration", context = Context)]
impl Registration {
    /// Name of the registering user.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.name.as_ref()
    }

    /// Email of the registering user.
    #[must_use]
    pub fn email(&self) -> &str {
        self.0.email.as_ref()
    }

    /// Phone of the registering user.
    #[must_use]
    pub fn phone(&self) -> &str {
        self.0.phone.as_ref()
    }
}

/// Details of a user registering on the platform.
#[derive(Clone, Debug, GraphQLInputObject)]
#[graphql(name = "RegistrationInput")]
pub struct Input {
    /// Name of the registering user.
    pub name: Option<String>,

    /// Email to send the verification code to.
    pub email: Option<String>,

    /// Phone of the registering user.
    pub phone: Option<String>,
}

impl From<Input> for RegistrationForm {
    fn from(input: Input) -> Self {
        Self {
            name: input.name,
            email: input.email,
            phone: input.phone,
        }
    }
}

impl AsError for command::issue_verification_code::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Invalid(e) => e.try_as_error(),
            Self::Notification(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::confirm_verification_code::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Invalid(e) => e.try_as_error(),
            Self::Mismatch => Some(Error::not_found(self)),
        }
    }
}
