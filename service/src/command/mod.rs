//! [`Command`] definition.

pub mod approve_listing_request;
pub mod authorize_session;
pub mod cancel_ticket;
pub mod confirm_verification_code;
pub mod create_car;
pub mod create_ticket;
pub mod delete_car;
pub mod delete_listing_request;
pub mod disapprove_listing_request;
pub mod expire_tickets;
pub mod issue_verification_code;
pub mod materialize_approved_listings;
pub mod submit_listing_request;
pub mod submit_review;
pub mod update_car;

use common::operations::{By, Delete, Select};
use tracing as log;

use crate::{
    domain::document,
    infra::{Database, Storage},
    read,
};

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    approve_listing_request::ApproveListingRequest,
    authorize_session::AuthorizeSession, cancel_ticket::CancelTicket,
    confirm_verification_code::ConfirmVerificationCode,
    create_car::CreateCar, create_ticket::CreateTicket, delete_car::DeleteCar,
    delete_listing_request::DeleteListingRequest,
    disapprove_listing_request::DisapproveListingRequest,
    expire_tickets::ExpireTickets,
    issue_verification_code::IssueVerificationCode,
    materialize_approved_listings::MaterializeApprovedListings,
    submit_listing_request::SubmitListingRequest, submit_review::SubmitReview,
    update_car::UpdateCar,
};

/// Deletes the provided stored [`document::Path`]s, only logging failures.
async fn discard<Files>(
    storage: &Files,
    paths: impl IntoIterator<Item = document::Path>,
) where
    Files: Storage<Delete<document::Path>, Err: std::fmt::Display>,
{
    for path in paths {
        if let Err(e) = storage.execute(Delete(path.clone())).await {
            log::warn!("failed to delete stored document `{path}`: {e}");
        }
    }
}

/// Deletes the provided stored [`document::Path`]s no record refers anymore,
/// only logging failures.
///
/// A [`document::Path`] whose usage cannot be checked is kept.
async fn discard_unreferenced<Db, Files>(
    database: &Db,
    storage: &Files,
    paths: impl IntoIterator<Item = document::Path>,
) where
    Db: Database<
        Select<By<read::document::Referenced, document::Path>>,
        Ok = read::document::Referenced,
        Err: std::fmt::Display,
    >,
    Files: Storage<Delete<document::Path>, Err: std::fmt::Display>,
{
    let mut unreferenced = vec![];
    for path in paths {
        match database
            .execute(Select(By::<read::document::Referenced, _>::new(
                path.clone(),
            )))
            .await
            .map(bool::from)
        {
            Ok(true) => {
                log::debug!("stored document `{path}` is still in use");
            }
            Ok(false) => unreferenced.push(path),
            Err(e) => {
                log::warn!("failed to check stored document `{path}`: {e}");
            }
        }
    }
    discard(storage, unreferenced).await;
}

#[cfg(test)]
pub(crate) mod spec {
    //! Recording doubles of the [`Service`] collaborators.

    use std::{
        io,
        sync::{Arc, Mutex},
        time::Duration,
    };

    use common::{
        operations::{By, Delete, Insert, Perform, Select},
        Handler,
    };
    use jsonwebtoken::DecodingKey;
    use tracerr::Traced;

    use crate::{
        domain::{document, payment, Document},
        infra::{
            notification::{self, Message},
            payment::{self as gateway, Payment, Refund},
            storage, Memory,
        },
        task, Config, Service,
    };

    /// Secret signing the [JWT]s in tests.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    pub(crate) const SECRET: &[u8] = b"test-secret";

    /// [`Service`] wired with in-memory collaborators.
    pub(crate) type TestService = Service<Memory, Files, Payments, Mailer>;

    /// Creates a new [`TestService`] with collaborators in their default
    /// state.
    pub(crate) fn service() -> TestService {
        with(Files::default(), Payments::default(), Mailer::default())
    }

    /// Creates a new [`TestService`] with the provided collaborators.
    pub(crate) fn with(
        files: Files,
        payments: Payments,
        mailer: Mailer,
    ) -> TestService {
        Service::unstarted(config(), Memory::new(), files, payments, mailer)
    }

    /// [`Config`] of a [`TestService`].
    pub(crate) fn config() -> Config {
        Config {
            jwt_decoding_key: DecodingKey::from_secret(SECRET),
            expire_tickets: task::expire_tickets::Config {
                interval: Duration::from_secs(60),
            },
            evict_verification_codes: task::evict_verification_codes::Config {
                interval: Duration::from_secs(60),
            },
            verification_code_ttl: Duration::from_secs(300),
            refund_speed: payment::RefundSpeed::Normal,
        }
    }

    /// Creates an uploaded [`Document`] of the provided [`document::Kind`].
    pub(crate) fn upload(kind: document::Kind) -> Document {
        let (file_name, content_type) = match kind {
            document::Kind::Image => ("car.png", "image/png"),
            document::Kind::Insurance | document::Kind::Registration => {
                ("scan.pdf", "application/pdf")
            }
        };
        Document {
            kind,
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: b"contents".to_vec(),
        }
    }

    /// File storage remembering what has been stored and deleted.
    #[derive(Clone, Debug, Default)]
    pub(crate) struct Files {
        /// Stored [`document::Path`]s.
        pub(crate) stored: Arc<Mutex<Vec<document::Path>>>,

        /// Deleted [`document::Path`]s.
        pub(crate) deleted: Arc<Mutex<Vec<document::Path>>>,

        /// [`document::Kind`] failing to be stored, if any.
        pub(crate) broken: Option<document::Kind>,
    }

    impl Files {
        pub(crate) fn stored(&self) -> Vec<document::Path> {
            self.stored.lock().unwrap().clone()
        }

        pub(crate) fn deleted(&self) -> Vec<document::Path> {
            self.deleted.lock().unwrap().clone()
        }
    }

    impl Handler<Insert<Document>> for Files {
        type Ok = document::Path;
        type Err = Traced<storage::Error>;

        async fn execute(
            &self,
            Insert(doc): Insert<Document>,
        ) -> Result<Self::Ok, Self::Err> {
            if self.broken == Some(doc.kind) {
                return Err(tracerr::new!(storage::Error::Io(
                    io::Error::other("disk is full"),
                )));
            }
            let n = self.stored.lock().unwrap().len();
            let path = document::Path::from(format!(
                "{}/{n}-{}",
                doc.kind, doc.file_name,
            ));
            self.stored.lock().unwrap().push(path.clone());
            Ok(path)
        }
    }

    impl Handler<Delete<document::Path>> for Files {
        type Ok = ();
        type Err = Traced<storage::Error>;

        async fn execute(
            &self,
            Delete(path): Delete<document::Path>,
        ) -> Result<Self::Ok, Self::Err> {
            self.deleted.lock().unwrap().push(path);
            Ok(())
        }
    }

    /// Payment gateway reporting every payment in the same state.
    #[derive(Clone, Debug)]
    pub(crate) struct Payments {
        /// [`payment::Status`] reported for any payment.
        pub(crate) status: payment::Status,

        /// Rejection reason of refunds, if any.
        pub(crate) refusal: Option<String>,

        /// Requested [`Refund`]s.
        pub(crate) refunds: Arc<Mutex<Vec<Refund>>>,

        /// Number of fetched payments.
        pub(crate) fetched: Arc<Mutex<usize>>,
    }

    impl Default for Payments {
        fn default() -> Self {
            Self {
                status: payment::Status::from("captured".to_owned()),
                refusal: None,
                refunds: Arc::default(),
                fetched: Arc::default(),
            }
        }
    }

    impl Payments {
        pub(crate) fn refunds(&self) -> Vec<Refund> {
            self.refunds.lock().unwrap().clone()
        }

        pub(crate) fn fetched(&self) -> usize {
            *self.fetched.lock().unwrap()
        }
    }

    impl Handler<Select<By<Payment, payment::Id>>> for Payments {
        type Ok = Payment;
        type Err = Traced<gateway::Error>;

        async fn execute(
            &self,
            Select(by): Select<By<Payment, payment::Id>>,
        ) -> Result<Self::Ok, Self::Err> {
            *self.fetched.lock().unwrap() += 1;
            Ok(Payment {
                id: by.into_inner(),
                status: self.status.clone(),
                amount: 300_000,
            })
        }
    }

    impl Handler<Perform<Refund>> for Payments {
        type Ok = payment::RefundId;
        type Err = Traced<gateway::Error>;

        async fn execute(
            &self,
            Perform(refund): Perform<Refund>,
        ) -> Result<Self::Ok, Self::Err> {
            if let Some(reason) = &self.refusal {
                return Err(tracerr::new!(gateway::Error::Rejected(
                    reason.clone(),
                )));
            }
            let mut refunds = self.refunds.lock().unwrap();
            refunds.push(refund);
            Ok(payment::RefundId::from(format!("rfnd_{}", refunds.len())))
        }
    }

    /// Notifier remembering sent [`Message`]s.
    #[derive(Clone, Debug, Default)]
    pub(crate) struct Mailer {
        /// Sent [`Message`]s.
        pub(crate) sent: Arc<Mutex<Vec<Message>>>,

        /// Indicator whether sending always fails.
        pub(crate) broken: bool,
    }

    impl Mailer {
        pub(crate) fn sent(&self) -> Vec<Message> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Handler<Perform<Message>> for Mailer {
        type Ok = ();
        type Err = Traced<notification::Error>;

        async fn execute(
            &self,
            Perform(msg): Perform<Message>,
        ) -> Result<Self::Ok, Self::Err> {
            if self.broken {
                let e = "unreachable"
                    .parse::<lettre::message::Mailbox>()
                    .unwrap_err();
                return Err(tracerr::new!(notification::Error::Address(e)));
            }
            self.sent.lock().unwrap().push(msg);
            Ok(())
        }
    }
}
