//! [`Command`] for expiring overdue [`Ticket`]s.

use common::{
    operations::{By, Update},
    DateTime,
};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::Ticket;
use crate::{
    infra::{database, Database},
    read, Service,
};

use super::Command;

/// [`Command`] marking every upcoming [`Ticket`] whose end has passed as
/// expired.
///
/// Returns the number of expired [`Ticket`]s.
#[derive(Clone, Copy, Debug)]
pub struct ExpireTickets;

impl<Db, Files, Pay, Mail> Command<ExpireTickets>
    for Service<Db, Files, Pay, Mail>
where
    Db: Database<
        Update<By<read::ticket::Expired, DateTime>>,
        Ok = read::ticket::Expired,
        Err = Traced<database::Error>,
    >,
{
    type Ok = u64;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, _: ExpireTickets) -> Result<Self::Ok, Self::Err> {
        self.database()
            .execute(Update(By::<read::ticket::Expired, _>::new(
                DateTime::now(),
            )))
            .await
            .map(Into::into)
    }
}

/// Error of [`ExpireTickets`] [`Command`] execution.
pub type ExecutionError = database::Error;

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{
        operations::{By, Insert, Select},
        DateTime,
    };

    use crate::{
        command::spec as svc,
        domain::{ticket, Ticket},
        infra::Database as _,
        Command as _,
    };

    use super::ExpireTickets;

    #[tokio::test]
    async fn expires_only_overdue_upcoming_tickets() {
        let svc = svc::service();
        let now = DateTime::now();
        let (past, future) =
            (now - Duration::from_secs(1), now + Duration::from_secs(3600));
        let overdue = ticket::spec::ticket("AB-1234", past);
        let upcoming = ticket::spec::ticket("CD-5678", future);
        let mut cancelled = ticket::spec::ticket("EF-9012", past);
        cancelled.status = ticket::Status::Cancelled;
        for t in [&overdue, &upcoming, &cancelled] {
            svc.database().execute(Insert(t.clone())).await.unwrap();
        }

        assert_eq!(svc.execute(ExpireTickets).await.unwrap(), 1);
        assert_eq!(svc.execute(ExpireTickets).await.unwrap(), 0);

        for (t, status) in [
            (overdue, ticket::Status::Expired),
            (upcoming, ticket::Status::Upcoming),
            (cancelled, ticket::Status::Cancelled),
        ] {
            let stored = svc
                .database()
                .execute(Select(By::<Option<Ticket>, _>::new(t.id)))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(stored.status, status);
        }
    }
}
