//! [`EvictVerificationCodes`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::{
    operations::{By, Delete, Perform, Start},
    DateTime, Handler as _,
};
use tokio::time::interval;
use tracing as log;

use crate::{infra::verification::Pending, Service};

use super::Task;

/// Configuration for [`EvictVerificationCodes`] [`Task`].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Interval between evictions of expired [`Pending`] verifications.
    pub interval: time::Duration,
}

/// [`Task`] for evicting expired [`Pending`] verifications.
#[derive(Clone, Copy, Debug)]
pub struct EvictVerificationCodes<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db, Files, Pay, Mail>
    Task<Start<By<EvictVerificationCodes<Self>, Config>>>
    for Service<Db, Files, Pay, Mail>
where
    EvictVerificationCodes<Self>:
        Task<Perform<()>, Ok = (), Err: Error> + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<EvictVerificationCodes<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = EvictVerificationCodes {
            config,
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            _ = task.execute(Perform(())).await.map_err(|e| {
                log::error!("`task::EvictVerificationCodes` failed: {e}");
            });
        }
    }
}

impl<Db, Files, Pay, Mail> Task<Perform<()>>
    for EvictVerificationCodes<Service<Db, Files, Pay, Mail>>
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        let evicted = self
            .service
            .codes()
            .execute(Delete(By::<Pending, _>::new(DateTime::now())))
            .await?;
        if evicted > 0 {
            log::debug!("{evicted} expired verification codes evicted");
        }
        Ok(())
    }
}
