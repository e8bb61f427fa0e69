//! [`Codes`] store of pending email verifications.

use std::{collections::HashMap, convert::Infallible, sync::Arc};

use common::{
    operations::{By, Delete, Insert},
    DateTime, Handler,
};
use tokio::sync::RwLock;

use crate::domain::{user, verification};

/// Registration awaiting its [`verification::Code`] to be confirmed.
#[derive(Clone, Debug)]
pub struct Pending {
    /// Issued [`verification::Code`].
    pub code: verification::Code,

    /// [`verification::Registration`] to confirm.
    pub registration: verification::Registration,

    /// [`DateTime`] when the [`verification::Code`] expires.
    pub expires_at: verification::ExpirationDateTime,
}

impl Pending {
    /// Indicates whether this [`Pending`] verification has expired by the
    /// provided moment.
    #[must_use]
    pub fn is_expired(&self, now: DateTime) -> bool {
        self.expires_at.coerce() <= now
    }
}

/// Attempt to confirm a [`Pending`] verification.
#[derive(Clone, Debug)]
pub struct Claim {
    /// Email the [`verification::Code`] has been sent to.
    pub email: user::Email,

    /// [`verification::Code`] received back.
    pub code: verification::Code,
}

/// In-process store of [`Pending`] verifications keyed by email.
///
/// Expired entries are never returned, even before being evicted.
#[derive(Clone, Debug, Default)]
pub struct Codes(Arc<RwLock<HashMap<user::Email, Pending>>>);

impl Codes {
    /// Creates a new empty [`Codes`] store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Handler<Insert<Pending>> for Codes {
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Insert(pending): Insert<Pending>,
    ) -> Result<Self::Ok, Self::Err> {
        drop(
            self.0
                .write()
                .await
                .insert(pending.registration.email.clone(), pending),
        );
        Ok(())
    }
}

impl Handler<Delete<By<Option<Pending>, Claim>>> for Codes {
    type Ok = Option<Pending>;
    type Err = Infallible;

    async fn execute(
        &self,
        Delete(by): Delete<By<Option<Pending>, Claim>>,
    ) -> Result<Self::Ok, Self::Err> {
        let Claim { email, code } = by.into_inner();

        let mut codes = self.0.write().await;
        let Some(pending) = codes.get(&email) else {
            return Ok(None);
        };
        if pending.is_expired(DateTime::now()) {
            drop(codes.remove(&email));
            return Ok(None);
        }
        if pending.code != code {
            return Ok(None);
        }
        Ok(codes.remove(&email))
    }
}

impl Handler<Delete<By<Pending, DateTime>>> for Codes {
    type Ok = usize;
    type Err = Infallible;

    async fn execute(
        &self,
        Delete(by): Delete<By<Pending, DateTime>>,
    ) -> Result<Self::Ok, Self::Err> {
        let now = by.into_inner();

        let mut codes = self.0.write().await;
        let before = codes.len();
        codes.retain(|_, p| !p.is_expired(now));
        Ok(before - codes.len())
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{
        operations::{By, Delete, Insert},
        DateTime, Handler as _,
    };

    use crate::domain::{user, verification};

    use super::{Claim, Codes, Pending};

    fn pending(email: &str, ttl_secs: i64) -> Pending {
        let now = DateTime::now();
        let expires_at = if ttl_secs >= 0 {
            now + Duration::from_secs(ttl_secs.unsigned_abs())
        } else {
            now - Duration::from_secs(ttl_secs.unsigned_abs())
        };
        Pending {
            code: verification::Code::new("123456").unwrap(),
            registration: verification::Registration {
                name: user::Name::new("Anbu").unwrap(),
                email: user::Email::new(email).unwrap(),
                phone: user::Phone::new("9876543210").unwrap(),
            },
            expires_at: expires_at.coerce(),
        }
    }

    fn claim(email: &str, code: &str) -> Delete<By<Option<Pending>, Claim>> {
        Delete(By::new(Claim {
            email: user::Email::new(email).unwrap(),
            code: verification::Code::new(code).unwrap(),
        }))
    }

    #[tokio::test]
    async fn claims_once_with_matching_code() {
        let codes = Codes::new();
        codes.execute(Insert(pending("a@b.io", 60))).await.unwrap();

        assert!(codes
            .execute(claim("a@b.io", "654321"))
            .await
            .unwrap()
            .is_none());

        let claimed = codes.execute(claim("a@b.io", "123456")).await.unwrap();
        assert_eq!(AsRef::<str>::as_ref(&claimed.unwrap().registration.name), "Anbu");

        assert!(codes
            .execute(claim("a@b.io", "123456"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn expired_codes_are_absent() {
        let codes = Codes::new();
        codes.execute(Insert(pending("a@b.io", -1))).await.unwrap();

        assert!(codes
            .execute(claim("a@b.io", "123456"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn evicts_only_expired() {
        let codes = Codes::new();
        codes.execute(Insert(pending("old@b.io", -1))).await.unwrap();
        codes.execute(Insert(pending("new@b.io", 60))).await.unwrap();

        let evicted = codes
            .execute(Delete(By::<Pending, _>::new(DateTime::now())))
            .await
            .unwrap();

        assert_eq!(evicted, 1);
        assert!(codes
            .execute(claim("new@b.io", "123456"))
            .await
            .unwrap()
            .is_some());
    }
}
