//! [`Command`] for submitting a [`ListingRequest`].

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
        listing_request::{self, Documents},
        validation::{self, ListingForm, Rejection},
        Car, Document, ListingRequest,
    },
    infra::{database, storage, Database, Storage},
    Service,
};

use super::{discard, Command};

/// [`Command`] for submitting a new [`ListingRequest`] for approval.
#[derive(Clone, Debug)]
pub struct SubmitListingRequest {
    /// Listing fields as submitted by a renter.
    pub form: ListingForm,

    /// Uploaded [`Document`]s, one of each [`document::Kind`].
    pub documents: Vec<Document>,
}

impl<Db, Files, Pay, Mail> Command<SubmitListingRequest>
    for Service<Db, Files, Pay, Mail>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Car, car::Number>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<ListingRequest>, car::Number>>,
            Ok = Option<ListingRequest>,
            Err = Traced<database::Error>,
        > + Database<Insert<ListingRequest>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Files: Storage<
            Insert<Document>,
            Ok = document::Path,
            Err = Traced<storage::Error>,
        > + Storage<Delete<document::Path>, Err = Traced<storage::Error>>,
{
    type Ok = ListingRequest;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: SubmitListingRequest,
    ) -> Result<Self::Ok, Self::Err> {
        use document::Kind;
        use ExecutionError as E;

        let SubmitListingRequest { form, documents } = cmd;

        let draft = form
            .validate(Date::today())
            .map_err(tracerr::from_and_wrap!(=> E))?;
        let documents = validation::documents(
            documents,
            &[Kind::Image, Kind::Insurance, Kind::Registration],
        )
        .map_err(tracerr::from_and_wrap!(=> E))?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent submissions of the same car number.
        tx.execute(Lock(By::new(draft.car_number.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if tx
            .execute(Select(By::<Option<ListingRequest>, _>::new(
                draft.car_number.clone(),
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .is_some()
        {
            return Err(tracerr::new!(E::CarNumberOccupied(draft.car_number)));
        }

        let mut stored = Vec::with_capacity(documents.len());
        for doc in documents {
            match self.storage().execute(Insert(doc)).await {
                Ok(path) => stored.push(path),
                Err(e) => {
                    discard(self.storage(), stored).await;
                    return Err(e).map_err(tracerr::map_from_and_wrap!(=> E));
                }
            }
        }
        let [image, insurance, registration] = <[_; 3]>::try_from(stored)
            .unwrap_or_else(|_| unreachable!("one path per `Kind`"));

        let request = ListingRequest {
            id: listing_request::Id::new(),
            car_number: draft.car_number,
            owner: draft.owner,
            vehicle: draft.vehicle,
            documents: Documents {
                image,
                insurance,
                registration,
            },
            available_from: draft.available_from,
            available_to: draft.available_to,
            city: draft.city,
            status: listing_request::Status::Pending,
            rating: car::Rating::default(),
            reviews_count: car::ReviewsCount::default(),
            created_at: DateTime::now().coerce(),
        };

        let saved = match tx.execute(Insert(request.clone())).await {
            Ok(_) => tx.execute(Commit).await.map(drop),
            Err(e) => Err(e),
        };
        if let Err(e) = saved {
            discard(self.storage(), request.documents.iter().cloned()).await;
            return Err(e).map_err(tracerr::map_from_and_wrap!(=> E));
        }

        Ok(request)
    }
}

/// Error of [`SubmitListingRequest`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`ListingRequest`] with the same car number is already submitted.
    #[display("`ListingRequest(car_number: {_0})` already exists")]
    #[from(ignore)]
    CarNumberOccupied(#[error(not(source))] car::Number),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Submitted fields are invalid.
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
        command::spec::{self as svc, upload, Files, Mailer, Payments},
        domain::{
            document::Kind,
            listing_request::Status,
            validation::{ListingForm, Rejection},
        },
        Command as _,
    };

    use super::{ExecutionError, SubmitListingRequest};

    pub(crate) fn form(number: &str) -> ListingForm {
        ListingForm {
            name: Some("Kavin".into()),
            email: Some("kavin@example.com".into()),
            phone: Some("9876543210".into()),
            car_model: Some("Swift".into()),
            car_number: Some(number.into()),
            model_year: Some(2022),
            air_conditioning: Some(true),
            passengers: Some(5),
            seats: Some(5),
            doors: Some(4),
            transmission: Some("Manual".into()),
            fuel_type: Some("Petrol".into()),
            price_per_day: Some(Decimal::from(1500)),
            from: Some("01-01-2025".into()),
            to: Some("05-01-2025".into()),
            permitted_city: Some("chennai".into()),
        }
    }

    pub(crate) fn submission(number: &str) -> SubmitListingRequest {
        SubmitListingRequest {
            form: form(number),
            documents: vec![
                upload(Kind::Image),
                upload(Kind::Insurance),
                upload(Kind::Registration),
            ],
        }
    }

    #[tokio::test]
    async fn submits_pending_request() {
        let svc = svc::service();

        let req = svc.execute(submission("ab-1234")).await.unwrap();

        assert_eq!(AsRef::<str>::as_ref(&req.car_number), "AB-1234");
        assert_eq!(req.status, Status::Pending);
        assert_eq!(svc.storage().stored().len(), 3);
        assert!(AsRef::<str>::as_ref(&req.documents.image).starts_with("image/"));
        assert!(AsRef::<str>::as_ref(&req.documents.insurance).starts_with("insurance/"));
        assert!(AsRef::<str>::as_ref(&req.documents.registration).starts_with("rc_book/"));
    }

    #[tokio::test]
    async fn rejects_duplicate_car_number() {
        let svc = svc::service();
        drop(svc.execute(submission("AB-1234")).await.unwrap());

        let err = svc.execute(submission(" ab-1234 ")).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::CarNumberOccupied(n) if AsRef::<str>::as_ref(&n) == "AB-1234",
        ));
        assert_eq!(svc.storage().stored().len(), 3);
    }

    #[tokio::test]
    async fn rejects_invalid_fields_before_storing() {
        let svc = svc::service();
        let mut cmd = submission("AB-1234");
        cmd.form.phone = None;
        cmd.form.doors = None;

        let err = svc.execute(cmd).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Invalid(Rejection::Missing(f))
                if f == &["phone", "doors"],
        ));
        assert!(svc.storage().stored().is_empty());

        let mut cmd = submission("AB-1234");
        cmd.documents.pop();
        let err = svc.execute(cmd).await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Invalid(Rejection::Missing(f)) if f == &["rc_book"],
        ));
    }

    #[tokio::test]
    async fn discards_stored_files_when_storing_fails() {
        let files = Files {
            broken: Some(Kind::Registration),
            ..Files::default()
        };
        let svc = svc::with(files, Payments::default(), Mailer::default());

        let err = svc.execute(submission("AB-1234")).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::Storage(_)));
        assert_eq!(svc.storage().deleted(), svc.storage().stored());
        assert_eq!(svc.storage().deleted().len(), 2);
    }
}
