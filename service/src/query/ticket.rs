//! [`Query`] collection related to [`Ticket`]s.
//!
//! Overdue [`Ticket`]s are marked as expired before being read.

use common::operations::By;
use tracerr::Traced;

use crate::{
    command::{self, Command},
    domain::Ticket,
    infra::database,
    read, Service,
};

use super::{DatabaseQuery, Query};

/// [`Query`] [`Select`]ing [`Ticket`]s once the overdue ones are expired.
///
/// [`Select`]: common::operations::Select
#[derive(Clone, Debug)]
pub struct Swept<T>(DatabaseQuery<T>);

impl<W, B> Swept<By<W, B>> {
    /// Creates a new [`Swept`] query selecting a `W` by the provided `B`.
    #[must_use]
    pub fn by(by: B) -> Self {
        Self(DatabaseQuery::by(by))
    }
}

impl<Db, Files, Pay, Mail, W, B> Query<Swept<By<W, B>>>
    for Service<Db, Files, Pay, Mail>
where
    Self: Command<
            command::ExpireTickets,
            Ok = u64,
            Err = Traced<command::expire_tickets::ExecutionError>,
        > + Query<
            DatabaseQuery<By<W, B>>,
            Ok = W,
            Err = Traced<database::Error>,
        >,
{
    type Ok = W;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Swept(query): Swept<By<W, B>>,
    ) -> Result<Self::Ok, Self::Err> {
        drop(
            <Self as Command<command::ExpireTickets>>::execute(
                self,
                command::ExpireTickets,
            )
            .await
            .map_err(tracerr::wrap!())?,
        );
        <Self as Query<DatabaseQuery<By<W, B>>>>::execute(self, query).await
    }
}

/// Queries a list of [`Ticket`]s passing a filter.
pub type List = Swept<By<Vec<Ticket>, read::ticket::Filter>>;

/// Queries total count of [`Ticket`]s passing a filter.
pub type TotalCount =
    Swept<By<read::ticket::TotalCount, read::ticket::Filter>>;

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{operations::Insert, DateTime};

    use crate::{
        command::spec as svc,
        domain::ticket,
        infra::Database as _,
        read, Query as _,
    };

    use super::{List, TotalCount};

    #[tokio::test]
    async fn reads_overdue_tickets_as_expired() {
        let svc = svc::service();
        let ended = DateTime::now() - Duration::from_secs(60);
        let overdue = ticket::spec::ticket("AB-1234", ended);
        svc.database().execute(Insert(overdue.clone())).await.unwrap();

        let listed = svc
            .execute(List::by(read::ticket::Filter {
                user_id: Some(overdue.user_id),
                owner_id: None,
            }))
            .await
            .unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, ticket::Status::Expired);

        let total = svc
            .execute(TotalCount::by(read::ticket::Filter::default()))
            .await
            .unwrap();
        assert_eq!(i32::from(total), 1);

        let foreign = svc
            .execute(List::by(read::ticket::Filter {
                user_id: None,
                owner_id: Some(overdue.user_id),
            }))
            .await
            .unwrap();
        assert!(foreign.is_empty());
    }
}
