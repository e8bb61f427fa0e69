//! [`Command`] for creating a [`Car`].

use common::{
    operations::{
        By, Commit, Delete, Insert, Lock, Select, Transact, Transacted,
    },
    Date, DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        car, document,
        validation::{self, CarForm, Rejection},
        Car, Document,
    },
    infra::{database, storage, Database, Storage},
    Service,
};

use super::{discard, Command};

/// [`Command`] for listing a new [`Car`] directly, bypassing the approval.
#[derive(Clone, Debug)]
pub struct CreateCar {
    /// Car fields as entered on the dashboard.
    pub form: CarForm,

    /// Uploaded photo of the [`Car`].
    pub image: Option<Document>,
}

impl<Db, Files, Pay, Mail> Command<CreateCar> for Service<Db, Files, Pay, Mail>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Car, car::Number>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Car>, car::Number>>,
            Ok = Option<Car>,
            Err = Traced<database::Error>,
        > + Database<Insert<Car>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Files: Storage<
            Insert<Document>,
            Ok = document::Path,
            Err = Traced<storage::Error>,
        > + Storage<Delete<document::Path>, Err = Traced<storage::Error>>,
{
    type Ok = Car;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateCar) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateCar { form, image } = cmd;

        let draft = form
            .validate(Date::today())
            .map_err(tracerr::from_and_wrap!(=> E))?;
        let image = validation::documents(
            image.into_iter().collect(),
            &[document::Kind::Image],
        )
        .map_err(tracerr::from_and_wrap!(=> E))?
        .pop()
        .unwrap_or_else(|| unreachable!("exactly one image is picked"));

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent listing of the same `Car`.
        tx.execute(Lock(By::<Car, _>::new(draft.number.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if tx
            .execute(Select(By::<Option<Car>, _>::new(draft.number.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .is_some()
        {
            return Err(tracerr::new!(E::CarAlreadyListed(draft.number)));
        }

        let image = self
            .storage()
            .execute(Insert(image))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let car = Car {
            id: car::Id::new(),
            number: draft.number,
            owner_email: draft.owner_email,
            vehicle: draft.vehicle,
            image,
            available_from: draft.available_from,
            available_to: draft.available_to,
            city: draft.city,
            status: car::Status::Available,
            rating: car::Rating::default(),
            reviews_count: car::ReviewsCount::default(),
            created_at: DateTime::now().coerce(),
        };

        let saved = match tx.execute(Insert(car.clone())).await {
            Ok(_) => tx.execute(Commit).await.map(drop),
            Err(e) => Err(e),
        };
        if let Err(e) = saved {
            discard(self.storage(), [car.image]).await;
            return Err(e).map_err(tracerr::map_from_and_wrap!(=> E));
        }

        Ok(car)
    }
}

/// Error of [`CreateCar`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Car`] with the same number is already listed.
    #[display("`Car(number: {_0})` is already listed")]
    #[from(ignore)]
    CarAlreadyListed(#[error(not(source))] car::Number),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Entered fields are invalid.
    #[display("{_0}")]
    Invalid(Rejection),

    /// [`Storage`] error.
    #[display("`Storage` operation failed: {_0}")]
    Storage(storage::Error),
}

#[cfg(test)]
pub(crate) mod spec {
    use rust_decimal::Decimal;

    use crate::{
        command::spec::{service, upload},
        domain::{car, document::Kind, validation::CarForm, City},
        Command as _,
    };

    use super::{CreateCar, ExecutionError};

    pub(crate) fn creation(number: &str) -> CreateCar {
        CreateCar {
            form: CarForm {
                email: Some("kavin@example.com".into()),
                car_model: Some("Innova".into()),
                car_number: Some(number.into()),
                model_year: Some(2021),
                air_conditioning: Some(true),
                passengers: Some(7),
                seats: Some(7),
                doors: Some(4),
                transmission: Some("Auto".into()),
                fuel_type: Some("Diesel".into()),
                price_per_day: Some(Decimal::from(2500)),
                from: Some("01-01-2025".into()),
                to: Some("31-12-2025".into()),
                permitted_city: Some("chennai".into()),
            },
            image: Some(upload(Kind::Image)),
        }
    }

    #[tokio::test]
    async fn lists_available_car() {
        let svc = service();

        let car = svc.execute(creation("TN-0001")).await.unwrap();

        assert_eq!(AsRef::<str>::as_ref(&car.number), "TN-0001");
        assert_eq!(car.status, car::Status::Available);
        assert_eq!(car.city, City::Chennai);
        assert_eq!(svc.storage().stored(), vec![car.image]);
    }

    #[tokio::test]
    async fn refuses_duplicate_number() {
        let svc = service();
        drop(svc.execute(creation("TN-0001")).await.unwrap());

        let err = svc.execute(creation("tn-0001")).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::CarAlreadyListed(_)));
        assert_eq!(svc.storage().stored().len(), 1);
    }

    #[tokio::test]
    async fn requires_image() {
        let svc = service();
        let mut cmd = creation("TN-0001");
        cmd.image = None;

        let err = svc.execute(cmd).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::Invalid(_)));
    }
}
