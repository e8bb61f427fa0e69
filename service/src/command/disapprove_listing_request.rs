//! [`Command`] for disapproving a [`ListingRequest`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        listing_request::{self, Status},
        ListingRequest,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for disapproving a pending [`ListingRequest`].
///
/// Disapproving an already decided [`ListingRequest`] changes nothing and
/// returns it as is.
#[derive(Clone, Copy, Debug)]
pub struct DisapproveListingRequest {
    /// ID of the [`ListingRequest`] to disapprove.
    pub id: listing_request::Id,
}

impl<Db, Files, Pay, Mail> Command<DisapproveListingRequest>
    for Service<Db, Files, Pay, Mail>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<ListingRequest, listing_request::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<ListingRequest>, listing_request::Id>>,
            Ok = Option<ListingRequest>,
            Err = Traced<database::Error>,
        > + Database<Update<ListingRequest>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = ListingRequest;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DisapproveListingRequest,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DisapproveListingRequest { id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent decisions upon the same `ListingRequest`.
        tx.execute(Lock(By::<ListingRequest, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut request = tx
            .execute(Select(By::<Option<ListingRequest>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NotExists(id))
            .map_err(tracerr::wrap!())?;
        if request.status.is_terminal() {
            return Ok(request);
        }

        request.status = Status::Disapproved;
        tx.execute(Update(request.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(request)
    }
}

/// Error of [`DisapproveListingRequest`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`ListingRequest`] with the provided ID does not exist.
    #[display("`ListingRequest(id: {_0})` does not exist")]
    #[from(ignore)]
    NotExists(#[error(not(source))] listing_request::Id),
}

#[cfg(test)]
mod spec {
    use common::operations::Insert;

    use crate::{
        command::{spec::service, ApproveListingRequest},
        domain::listing_request::{self, spec::request, Status},
        infra::Database as _,
        Command as _,
    };

    use super::{DisapproveListingRequest, ExecutionError};

    #[tokio::test]
    async fn disapproves_only_pending() {
        let svc = service();
        let req = request("AB-1234", "01-01-2025", "05-01-2025");
        svc.database().execute(Insert(req.clone())).await.unwrap();
        drop(svc.execute(ApproveListingRequest { id: req.id }).await.unwrap());

        let res = svc
            .execute(DisapproveListingRequest { id: req.id })
            .await
            .unwrap();
        assert_eq!(res.status, Status::Approved);

        let other = request("CD-5678", "01-01-2025", "05-01-2025");
        svc.database().execute(Insert(other.clone())).await.unwrap();
        let res = svc
            .execute(DisapproveListingRequest { id: other.id })
            .await
            .unwrap();
        assert_eq!(res.status, Status::Disapproved);
    }

    #[tokio::test]
    async fn fails_on_unknown_request() {
        let svc = service();
        let id = listing_request::Id::new();

        let err = svc
            .execute(DisapproveListingRequest { id })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::NotExists(i) if *i == id,
        ));
    }
}
