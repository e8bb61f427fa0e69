//! [`Command`] for deleting a [`Car`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{car, document, Car, ListingRequest},
    infra::{database, storage, Database, Storage},
    read, Service,
};

use super::{discard_unreferenced, Command};

/// [`Command`] for deleting a [`Car`] along with the [`ListingRequest`]
/// sharing its number.
///
/// Stored photos and documents are deleted afterwards, only logging failures.
#[derive(Clone, Copy, Debug)]
pub struct DeleteCar {
    /// ID of the [`Car`] to delete.
    pub id: car::Id,
}

impl<Db, Files, Pay, Mail> Command<DeleteCar> for Service<Db, Files, Pay, Mail>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<read::document::Referenced, document::Path>>,
            Ok = read::document::Referenced,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Select<By<Option<Car>, car::Id>>,
            Ok = Option<Car>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Car, car::Number>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<ListingRequest>, car::Number>>,
            Ok = Option<ListingRequest>,
            Err = Traced<database::Error>,
        > + Database<Delete<By<Car, car::Id>>, Err = Traced<database::Error>>
        + Database<
            Delete<By<ListingRequest, car::Number>>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
    Files: Storage<Delete<document::Path>, Err = Traced<storage::Error>>,
{
    type Ok = Car;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteCar) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteCar { id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let number = tx
            .execute(Select(By::<Option<Car>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NotExists(id))
            .map_err(tracerr::wrap!())?
            .number;

        // Avoid concurrent bookings of the deleted `Car`.
        tx.execute(Lock(By::<Car, _>::new(number)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let car = tx
            .execute(Select(By::<Option<Car>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NotExists(id))
            .map_err(tracerr::wrap!())?;
        let request = tx
            .execute(Select(By::<Option<ListingRequest>, _>::new(
                car.number.clone(),
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Delete(By::<Car, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Delete(By::<ListingRequest, _>::new(car.number.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut paths = vec![car.image.clone()];
        for path in request.iter().flat_map(|r| r.documents.iter()) {
            if !paths.contains(path) {
                paths.push(path.clone());
            }
        }
        discard_unreferenced(self.database(), self.storage(), paths).await;

        Ok(car)
    }
}

/// Error of [`DeleteCar`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Car`] with the provided ID does not exist.
    #[display("`Car(id: {_0})` does not exist")]
    #[from(ignore)]
    NotExists(#[error(not(source))] car::Id),
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Insert, Select};

    use crate::{
        command::{
            create_ticket::spec::{booking, listed},
            spec::service,
            ApproveListingRequest,
        },
        domain::{car, listing_request::spec::request, Car, ListingRequest},
        infra::Database as _,
        Command as _,
    };

    use super::{DeleteCar, ExecutionError};

    #[tokio::test]
    async fn deletes_car_with_its_request_and_files() {
        let svc = service();
        let req = request("AB-1234", "01-01-2025", "05-01-2025");
        svc.database().execute(Insert(req.clone())).await.unwrap();
        drop(svc.execute(ApproveListingRequest { id: req.id }).await.unwrap());
        let car = svc
            .database()
            .execute(Select(By::<Option<Car>, _>::new(req.car_number.clone())))
            .await
            .unwrap()
            .unwrap();

        drop(svc.execute(DeleteCar { id: car.id }).await.unwrap());

        assert!(svc
            .database()
            .execute(Select(By::<Option<Car>, _>::new(car.id)))
            .await
            .unwrap()
            .is_none());
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
    async fn keeps_photo_of_booked_tickets() {
        let svc = service();
        let car = listed(&svc, "AB-1234").await;
        let t = svc.execute(booking("AB-1234", None)).await.unwrap();

        drop(svc.execute(DeleteCar { id: car.id }).await.unwrap());

        assert_eq!(t.image, car.image);
        assert!(svc.storage().deleted().is_empty());
    }

    #[tokio::test]
    async fn fails_on_unknown_car() {
        let svc = service();

        let err = svc
            .execute(DeleteCar { id: car::Id::new() })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotExists(_)));
    }
}
