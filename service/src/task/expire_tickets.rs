//! [`ExpireTickets`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::operations::{By, Perform, Start};
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::Ticket;
use crate::{command, Command, Service};

use super::Task;

/// Configuration for [`ExpireTickets`] [`Task`].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Interval between sweeps of overdue [`Ticket`]s.
    pub interval: time::Duration,
}

/// [`Task`] for marking overdue upcoming [`Ticket`]s as expired.
#[derive(Clone, Copy, Debug)]
pub struct ExpireTickets<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db, Files, Pay, Mail> Task<Start<By<ExpireTickets<Self>, Config>>>
    for Service<Db, Files, Pay, Mail>
where
    ExpireTickets<Self>: Task<Perform<()>, Ok = (), Err: Error> + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<ExpireTickets<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = ExpireTickets {
            config,
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            _ = task.execute(Perform(())).await.map_err(|e| {
                log::error!("`task::ExpireTickets` failed: {e}");
            });
        }
    }
}

impl<Db, Files, Pay, Mail> Task<Perform<()>>
    for ExpireTickets<Service<Db, Files, Pay, Mail>>
where
    Service<Db, Files, Pay, Mail>: Command<
        command::ExpireTickets,
        Ok = u64,
        Err = Traced<command::expire_tickets::ExecutionError>,
    >,
{
    type Ok = ();
    type Err = Traced<command::expire_tickets::ExecutionError>;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        let expired = self.service.execute(command::ExpireTickets).await?;
        if expired > 0 {
            log::info!("{expired} overdue tickets marked as expired");
        }
        Ok(())
    }
}
