//! [`Command`] for updating a [`Car`].

use common::{
    operations::{
        By, Commit, Delete, Insert, Lock, Select, Transact, Transacted, Update,
    },
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        car, document,
        validation::{self, CarEdit, Rejection},
        Car, Document, ListingRequest,
    },
    infra::{database, storage, Database, Storage},
    read, Service,
};

use super::{discard, discard_unreferenced, Command};

/// [`Command`] for partially editing a [`Car`].
///
/// Every present change is mirrored onto the [`ListingRequest`] sharing the
/// [`Car`]'s number, so both stay consistent.
#[derive(Clone, Debug)]
pub struct UpdateCar {
    /// ID of the [`Car`] to update.
    pub id: car::Id,

    /// Changes as entered on the dashboard.
    pub edit: CarEdit,

    /// New uploaded photo of the [`Car`], if any.
    pub image: Option<Document>,
}

impl<Db, Files, Pay, Mail> Command<UpdateCar> for Service<Db, Files, Pay, Mail>
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
            Select<By<Option<Car>, car::Number>>,
            Ok = Option<Car>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<ListingRequest>, car::Number>>,
            Ok = Option<ListingRequest>,
            Err = Traced<database::Error>,
        > + Database<Update<Car>, Err = Traced<database::Error>>
        + Database<Update<ListingRequest>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Files: Storage<
            Insert<Document>,
            Ok = document::Path,
            Err = Traced<storage::Error>,
        > + Storage<Delete<document::Path>, Err = Traced<storage::Error>>,
{
    type Ok = Car;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: UpdateCar) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateCar { id, edit, image } = cmd;

        let mut changes = edit
            .validate(Date::today())
            .map_err(tracerr::from_and_wrap!(=> E))?;
        let image = image
            .map(|doc| {
                validation::documents(vec![doc], &[document::Kind::Image])
            })
            .transpose()
            .map_err(tracerr::from_and_wrap!(=> E))?
            .and_then(|mut docs| docs.pop());

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

        // Avoid concurrent bookings and edits of the same `Car`.
        tx.execute(Lock(By::<Car, _>::new(number)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut car = tx
            .execute(Select(By::<Option<Car>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NotExists(id))
            .map_err(tracerr::wrap!())?;

        let from = changes.available_from.unwrap_or(car.available_from);
        let to = changes.available_to.unwrap_or(car.available_to);
        validation::period(&from.coerce::<()>(), &to.coerce::<()>())
            .map_err(tracerr::from_and_wrap!(=> E))?;

        if let Some(new) = changes.number.as_ref().filter(|n| **n != car.number)
        {
            // Avoid concurrent listing of the same `Car`.
            tx.execute(Lock(By::<Car, _>::new(new.clone())))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;

            let car_exists = tx
                .execute(Select(By::<Option<Car>, _>::new(new.clone())))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .is_some();
            let request_exists = tx
                .execute(Select(By::<Option<ListingRequest>, _>::new(
                    new.clone(),
                )))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .is_some();
            if car_exists || request_exists {
                return Err(tracerr::new!(E::CarNumberOccupied(new.clone())));
            }
        }

        let request = tx
            .execute(Select(By::<Option<ListingRequest>, _>::new(
                car.number.clone(),
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let old_image = car.image.clone();
        if let Some(doc) = image {
            changes.image = Some(
                self.storage()
                    .execute(Insert(doc))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?,
            );
        }

        changes.apply(&mut car);
        let request = request.map(|mut r| {
            r.mirror(&changes);
            r
        });

        if let Err(e) = persist(&tx, car.clone(), request).await {
            discard(self.storage(), changes.image).await;
            return Err(e).map_err(tracerr::map_from_and_wrap!(=> E));
        }
        if changes.image.is_some() {
            discard_unreferenced(self.database(), self.storage(), [old_image])
                .await;
        }

        Ok(car)
    }
}

/// Stores the updated [`Car`] along with its mirrored [`ListingRequest`], and
/// commits the transaction.
async fn persist<Tx>(
    tx: &Tx,
    car: Car,
    request: Option<ListingRequest>,
) -> Result<(), Traced<database::Error>>
where
    Tx: Database<Update<Car>, Err = Traced<database::Error>>
        + Database<Update<ListingRequest>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    tx.execute(Update(car))
        .await
        .map_err(tracerr::wrap!())
        .map(drop)?;
    if let Some(r) = request {
        tx.execute(Update(r))
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;
    }
    tx.execute(Commit).await.map_err(tracerr::wrap!()).map(drop)
}

/// Error of [`UpdateCar`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// New car number is already used by another [`Car`] or
    /// [`ListingRequest`].
    #[display("Car number `{_0}` is already in use")]
    #[from(ignore)]
    CarNumberOccupied(#[error(not(source))] car::Number),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Entered changes are invalid.
    #[display("{_0}")]
    Invalid(Rejection),

    /// [`Car`] with the provided ID does not exist.
    #[display("`Car(id: {_0})` does not exist")]
    #[from(ignore)]
    NotExists(#[error(not(source))] car::Id),

    /// [`Storage`] error.
    #[display("`Storage` operation failed: {_0}")]
    Storage(storage::Error),
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Insert, Select};
    use rust_decimal::Decimal;

    use crate::{
        command::{
            create_car::spec::creation,
            create_ticket::spec::{booking, listed},
            spec::{service, upload},
            ApproveListingRequest,
        },
        domain::{
            car, document::Kind, listing_request::spec::request,
            validation::{CarEdit, Rejection},
            Car, City, ListingRequest,
        },
        infra::Database as _,
        Command as _,
    };

    use super::{ExecutionError, UpdateCar};

    #[tokio::test]
    async fn mirrors_changes_onto_request() {
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

        let updated = svc
            .execute(UpdateCar {
                id: car.id,
                edit: CarEdit {
                    car_number: Some("cd-5678".into()),
                    price_per_day: Some(Decimal::from(1800)),
                    permitted_city: Some("goa".into()),
                    to: Some("20-01-2025".into()),
                    ..CarEdit::default()
                },
                image: Some(upload(Kind::Image)),
            })
            .await
            .unwrap();

        assert_eq!(AsRef::<str>::as_ref(&updated.number), "CD-5678");
        assert_eq!(updated.city, City::Goa);
        assert_eq!(updated.vehicle.price_per_day.amount, Decimal::from(1800));
        assert_eq!(updated.available_to.to_dmy(), "20-01-2025");
        assert_eq!(updated.vehicle.model, car.vehicle.model);

        let mirrored = svc
            .database()
            .execute(Select(By::<Option<ListingRequest>, _>::new(req.id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(mirrored.car_number, updated.number);
        assert_eq!(mirrored.city, City::Goa);
        assert_eq!(AsRef::<str>::as_ref(&mirrored.available_to), "20-01-2025");
        assert_eq!(mirrored.documents.image, updated.image);
        assert_eq!(mirrored.documents.insurance, req.documents.insurance);

        assert_eq!(svc.storage().deleted(), vec![req.documents.image]);
    }

    #[tokio::test]
    async fn keeps_replaced_photo_of_booked_tickets() {
        let svc = service();
        let car = listed(&svc, "AB-1234").await;
        let t = svc.execute(booking("AB-1234", None)).await.unwrap();

        let updated = svc
            .execute(UpdateCar {
                id: car.id,
                edit: CarEdit::default(),
                image: Some(upload(Kind::Image)),
            })
            .await
            .unwrap();

        assert_ne!(updated.image, t.image);
        assert!(svc.storage().deleted().is_empty());
    }

    #[tokio::test]
    async fn refuses_occupied_number() {
        let svc = service();
        let car = svc.execute(creation("TN-0001")).await.unwrap();
        let other = request("TN-0002", "01-01-2025", "05-01-2025");
        svc.database().execute(Insert(other)).await.unwrap();

        let err = svc
            .execute(UpdateCar {
                id: car.id,
                edit: CarEdit {
                    car_number: Some("TN-0002".into()),
                    ..CarEdit::default()
                },
                image: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::CarNumberOccupied(_)));
    }

    #[tokio::test]
    async fn rejects_reversed_merged_period() {
        let svc = service();
        let car = svc.execute(creation("TN-0001")).await.unwrap();

        let err = svc
            .execute(UpdateCar {
                id: car.id,
                edit: CarEdit {
                    from: Some("01-02-2026".into()),
                    ..CarEdit::default()
                },
                image: None,
            })
            .await
            .unwrap_err();

        let expected = Rejection::invalid("to", "must be after `from`");
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Invalid(r) if *r == expected,
        ));
    }

    #[tokio::test]
    async fn fails_on_unknown_car() {
        let svc = service();

        let err = svc
            .execute(UpdateCar {
                id: car::Id::new(),
                edit: CarEdit::default(),
                image: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotExists(_)));
    }
}
