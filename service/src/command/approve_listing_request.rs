//! [`Command`] for approving a [`ListingRequest`].

use common::operations::{
    By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        car,
        listing_request::{self, InvalidPeriod, Status},
        Car, ListingRequest,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for approving a pending [`ListingRequest`], listing its [`Car`].
///
/// Approving an already decided [`ListingRequest`] changes nothing and
/// returns it as is.
#[derive(Clone, Copy, Debug)]
pub struct ApproveListingRequest {
    /// ID of the [`ListingRequest`] to approve.
    pub id: listing_request::Id,
}

impl<Db, Files, Pay, Mail> Command<ApproveListingRequest>
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
        > + Database<Lock<By<Car, car::Number>>, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Car>, car::Number>>,
            Ok = Option<Car>,
            Err = Traced<database::Error>,
        > + Database<Insert<Car>, Err = Traced<database::Error>>
        + Database<Update<ListingRequest>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = ListingRequest;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ApproveListingRequest,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ApproveListingRequest { id } = cmd;

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

        // Avoid concurrent listing of the same `Car`.
        tx.execute(Lock(By::<Car, _>::new(request.car_number.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if tx
            .execute(Select(By::<Option<Car>, _>::new(
                request.car_number.clone(),
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .is_some()
        {
            return Err(tracerr::new!(E::CarAlreadyListed(request.car_number)));
        }

        let car = request.to_car().map_err(tracerr::from_and_wrap!(=> E))?;
        tx.execute(Insert(car))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        request.status = Status::Approved;
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

/// Error of [`ApproveListingRequest`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Car`] with the same number is already listed.
    #[display("`Car(number: {_0})` is already listed")]
    #[from(ignore)]
    CarAlreadyListed(#[error(not(source))] car::Number),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Requested availability period cannot be listed.
    #[display("Invalid availability period: {_0}")]
    InvalidPeriod(InvalidPeriod),

    /// [`ListingRequest`] with the provided ID does not exist.
    #[display("`ListingRequest(id: {_0})` does not exist")]
    #[from(ignore)]
    NotExists(#[error(not(source))] listing_request::Id),
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Insert, Select};

    use crate::{
        command::{spec::service, DisapproveListingRequest},
        domain::{
            car,
            listing_request::{self, spec::request, Status},
            Car, ListingRequest,
        },
        infra::Database as _,
        read, Command as _,
    };

    use super::{ApproveListingRequest, ExecutionError};

    async fn cars(svc: &crate::command::spec::TestService) -> Vec<Car> {
        svc.database()
            .execute(Select(By::<Vec<Car>, _>::new(
                read::car::Filter::default(),
            )))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn lists_available_car() {
        let svc = service();
        let req = request("AB-1234", "01-01-2025", "05-01-2025");
        svc.database().execute(Insert(req.clone())).await.unwrap();

        let approved = svc
            .execute(ApproveListingRequest { id: req.id })
            .await
            .unwrap();

        assert_eq!(approved.status, Status::Approved);
        let cars = cars(&svc).await;
        assert_eq!(cars.len(), 1);
        assert_eq!(AsRef::<str>::as_ref(&cars[0].number), "AB-1234");
        assert_eq!(cars[0].status, car::Status::Available);
        assert_eq!(cars[0].image, req.documents.image);

        let stored = svc
            .database()
            .execute(Select(By::<Option<ListingRequest>, _>::new(req.id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, Status::Approved);
    }

    #[tokio::test]
    async fn refuses_duplicate_car_leaving_request_pending() {
        let svc = service();
        let listed = request("AB-1234", "01-01-2025", "05-01-2025");
        let car = listed.to_car().unwrap();
        svc.database().execute(Insert(car.clone())).await.unwrap();
        let req = request("AB-1234", "10-01-2025", "15-01-2025");
        svc.database().execute(Insert(req.clone())).await.unwrap();

        let err = svc
            .execute(ApproveListingRequest { id: req.id })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::CarAlreadyListed(_)));
        let cars = cars(&svc).await;
        assert_eq!(cars.len(), 1);
        assert_eq!(cars[0].id, car.id);
        let stored = svc
            .database()
            .execute(Select(By::<Option<ListingRequest>, _>::new(req.id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, Status::Pending);
    }

    #[tokio::test]
    async fn keeps_terminal_status() {
        let svc = service();
        let req = request("AB-1234", "01-01-2025", "05-01-2025");
        svc.database().execute(Insert(req.clone())).await.unwrap();
        drop(
            svc.execute(DisapproveListingRequest { id: req.id })
                .await
                .unwrap(),
        );

        let again = svc
            .execute(ApproveListingRequest { id: req.id })
            .await
            .unwrap();

        assert_eq!(again.status, Status::Disapproved);
        assert!(cars(&svc).await.is_empty());
    }

    #[tokio::test]
    async fn rejects_unknown_request_or_bad_dates() {
        let svc = service();

        let id = listing_request::Id::new();
        let err = svc
            .execute(ApproveListingRequest { id })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::NotExists(i) if *i == id,
        ));

        let req = request("AB-1234", "sometime", "05-01-2025");
        svc.database().execute(Insert(req.clone())).await.unwrap();
        let err = svc
            .execute(ApproveListingRequest { id: req.id })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::InvalidPeriod(_)));
        assert!(cars(&svc).await.is_empty());
    }
}
