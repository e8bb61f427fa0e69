//! Service contains the business logic of the application.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod infra;
pub mod query;
pub mod read;
pub mod task;

use std::{error::Error, time};

use common::operations::{By, Start};
use derive_more::Debug;

#[cfg(doc)]
use self::infra::{Database, Notifier, PaymentGateway, Storage};
use self::infra::verification::Codes;

pub use self::{command::Command, query::Query, task::Task};

/// [`Service`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// [JWT] decoding key of externally issued sessions.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    pub jwt_decoding_key: jsonwebtoken::DecodingKey,

    /// [`task::ExpireTickets`] configuration.
    pub expire_tickets: task::expire_tickets::Config,

    /// [`task::EvictVerificationCodes`] configuration.
    pub evict_verification_codes: task::evict_verification_codes::Config,

    /// Lifetime of an issued verification code.
    pub verification_code_ttl: time::Duration,

    /// [`domain::payment::RefundSpeed`] requested for cancelled tickets.
    pub refund_speed: domain::payment::RefundSpeed,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db, Files, Pay, Mail> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,

    /// [`Storage`] of uploaded documents.
    storage: Files,

    /// [`PaymentGateway`] issuing refunds.
    payments: Pay,

    /// [`Notifier`] of users.
    notifier: Mail,

    /// Pending email verifications.
    codes: Codes,
}

impl<Db, Files, Pay, Mail> Service<Db, Files, Pay, Mail> {
    /// Creates a new [`Service`] with the provided parameters.
    pub fn new(
        config: Config,
        database: Db,
        storage: Files,
        payments: Pay,
        notifier: Mail,
    ) -> (Self, task::Background)
    where
        Self: Task<
                Start<
                    By<
                        task::ExpireTickets<Self>,
                        task::expire_tickets::Config,
                    >,
                >,
                Ok = (),
                Err: Error,
            > + Task<
                Start<
                    By<
                        task::EvictVerificationCodes<Self>,
                        task::evict_verification_codes::Config,
                    >,
                >,
                Ok = (),
                Err: Error,
            > + Clone
            + 'static,
    {
        let this =
            Self::unstarted(config, database, storage, payments, notifier);

        let mut bg = task::Background::default();
        let svc = this.clone();
        bg.spawn("expire_tickets", async move {
            svc.execute(Start(By::<task::ExpireTickets<Self>, _>::new(
                svc.config().expire_tickets,
            )))
            .await
        });
        let svc = this.clone();
        bg.spawn("evict_verification_codes", async move {
            svc.execute(Start(By::<task::EvictVerificationCodes<Self>, _>::new(
                svc.config().evict_verification_codes,
            )))
            .await
        });

        (this, bg)
    }

    /// Creates a new [`Service`] without starting its background [`Task`]s.
    #[must_use]
    pub fn unstarted(
        config: Config,
        database: Db,
        storage: Files,
        payments: Pay,
        notifier: Mail,
    ) -> Self {
        Self {
            config,
            database,
            storage,
            payments,
            notifier,
            codes: Codes::new(),
        }
    }

    /// Returns [`Config`] of this [`Service`].
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Returns [`Storage`] of this [`Service`].
    #[must_use]
    pub fn storage(&self) -> &Files {
        &self.storage
    }

    /// Returns [`PaymentGateway`] of this [`Service`].
    #[must_use]
    pub fn payments(&self) -> &Pay {
        &self.payments
    }

    /// Returns [`Notifier`] of this [`Service`].
    #[must_use]
    pub fn notifier(&self) -> &Mail {
        &self.notifier
    }

    /// Returns pending email verifications of this [`Service`].
    #[must_use]
    pub fn codes(&self) -> &Codes {
        &self.codes
    }
}
