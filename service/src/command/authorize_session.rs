//! [`Command`] for authorizing a [`Session`].

use derive_more::{Display, Error, From};
use jsonwebtoken::Validation;
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::User;
use crate::{
    domain::user::{session, Session},
    Service,
};

use super::Command;

/// [`Command`] for authorizing a [`User`] by an externally issued [`Session`].
#[derive(Clone, Debug, From)]
pub struct AuthorizeSession {
    /// [`Session`] token to authorize.
    pub token: session::Token,
}

impl<Db, Files, Pay, Mail> Command<AuthorizeSession>
    for Service<Db, Files, Pay, Mail>
{
    type Ok = Session;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AuthorizeSession { token } = cmd;

        Ok(jsonwebtoken::decode::<Session>(
            token.as_ref(),
            &self.config().jwt_decoding_key,
            &Validation::default(),
        )
        .map_err(tracerr::from_and_wrap!(=> E))?
        .claims)
    }
}

/// Error of [`AuthorizeSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`jsonwebtoken`] decoding error.
    #[display("Failed to decode a JSON Web Token: {_0}")]
    JsonWebTokenDecodeError(jsonwebtoken::errors::Error),
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::DateTime;
    use jsonwebtoken::{EncodingKey, Header};

    use crate::{
        command::spec::{service, SECRET},
        domain::user::{self, session, Role, Session},
        Command as _,
    };

    use super::AuthorizeSession;

    #[expect(unsafe_code, reason = "test token")]
    fn token(session: &Session, secret: &[u8]) -> session::Token {
        let raw = jsonwebtoken::encode(
            &Header::default(),
            session,
            &EncodingKey::from_secret(secret),
        )
        .unwrap();
        unsafe { session::Token::new_unchecked(raw) }
    }

    fn session(expires_in: Duration) -> Session {
        Session {
            user_id: user::Id::new(),
            email: user::Email::new("ravi@example.com").unwrap(),
            role: Role::Renter,
            expires_at: (DateTime::now() + expires_in).coerce(),
        }
    }

    #[tokio::test]
    async fn decodes_valid_token() {
        let svc = service();
        let issued = session(Duration::from_secs(3600));

        let s = svc
            .execute(AuthorizeSession::from(token(&issued, SECRET)))
            .await
            .unwrap();

        assert_eq!(s.user_id, issued.user_id);
        assert_eq!(s.email, issued.email);
        assert_eq!(s.role, Role::Renter);
        assert!(s.may_list_cars());
        assert!(!s.is_admin());
    }

    #[tokio::test]
    async fn rejects_foreign_or_expired_token() {
        let svc = service();

        let foreign = token(&session(Duration::from_secs(3600)), b"other");
        assert!(svc.execute(AuthorizeSession::from(foreign)).await.is_err());

        let mut expired = session(Duration::ZERO);
        expired.expires_at =
            (DateTime::now() - Duration::from_secs(3600)).coerce();
        let expired = token(&expired, SECRET);
        assert!(svc.execute(AuthorizeSession::from(expired)).await.is_err());
    }
}
