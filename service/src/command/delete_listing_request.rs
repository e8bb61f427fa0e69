//! [`Command`] for deleting a [`ListingRequest`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{document, listing_request, ListingRequest},
    infra::{database, storage, Database, Storage},
    read, Service,
};

use super::{discard_unreferenced, Command};

/// [`Command`] for deleting a [`ListingRequest`] along with its stored
/// documents.
///
/// Failures to delete the documents are only logged.
#[derive(Clone, Copy, Debug)]
pub struct DeleteListingRequest {
    /// ID of the [`ListingRequest`] to delete.
    pub id: listing_request::Id,
}

impl<Db, Files, Pay, Mail> Command<DeleteListingRequest>
    for Service<Db, Files, Pay, Mail>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<read::document::Referenced, document::Path>>,
            Ok = read::document::Referenced,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<ListingRequest, listing_request::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<ListingRequest>, listing_request::Id>>,
            Ok = Option<ListingRequest>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<ListingRequest, listing_request::Id>>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
    Files: Storage<Delete<document::Path>, Err = Traced<storage::Error>>,
{
    type Ok = ListingRequest;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteListingRequest,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteListingRequest { id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent decisions upon the deleted `ListingRequest`.
        tx.execute(Lock(By::<ListingRequest, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let request = tx
            .execute(Select(By::<Option<ListingRequest>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NotExists(id))
            .map_err(tracerr::wrap!())?;

        tx.execute(Delete(By::<ListingRequest, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        discard_unreferenced(
            self.database(),
            self.storage(),
            request.documents.iter().cloned(),
        )
        .await;

        Ok(request)
    }
}

/// Error of [`DeleteListingRequest`] [`Command`] execution.
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
    use common::operations::{By, Insert, Select};

    use crate::{
        command::{spec::service, ApproveListingRequest},
        domain::{
            listing_request::{self, spec::request},
            Car, ListingRequest,
        },
        infra::Database as _,
        Command as _,
    };

    use super::{DeleteListingRequest, ExecutionError};

    #[tokio::test]
    async fn deletes_request_and_its_documents() {
        let svc = service();
        let req = request("AB-1234", "01-01-2025", "05-01-2025");
        svc.database().execute(Insert(req.clone())).await.unwrap();

        drop(svc.execute(DeleteListingRequest { id: req.id }).await.unwrap());

        assert!(svc
            .database()
            .execute(Select(By::<Option<ListingRequest>, _>::new(req.id)))
            .await
            .unwrap()
            .is_none());
        assert_eq!(
            svc.storage().deleted(),
            req.documents.iter().cloned().collect::<Vec<_>>(),
        );
    }

    #[tokio::test]
    async fn keeps_photo_of_listed_car() {
        let svc = service();
        let req = request("AB-1234", "01-01-2025", "05-01-2025");
        svc.database().execute(Insert(req.clone())).await.unwrap();
        drop(svc.execute(ApproveListingRequest { id: req.id }).await.unwrap());

        drop(svc.execute(DeleteListingRequest { id: req.id }).await.unwrap());

        let car = svc
            .database()
            .execute(Select(By::<Option<Car>, _>::new(req.car_number.clone())))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(car.image, req.documents.image);
        assert_eq!(
            svc.storage().deleted(),
            vec![req.documents.insurance, req.documents.registration],
        );
    }

    #[tokio::test]
    async fn fails_on_unknown_request() {
        let svc = service();

        let err = svc
            .execute(DeleteListingRequest {
                id: listing_request::Id::new(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotExists(_)));
        assert!(svc.storage().deleted().is_empty());
    }
}
