//! [`Command`] for reviewing a [`Car`].

use common::{
    operations::{
        By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
    },
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        car, review, user,
        validation::{Rejection, ReviewForm},
        Car, Review,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for submitting a [`Review`] of a [`Car`].
///
/// Recomputes the [`Car`]'s average rating out of all its [`Review`]s.
#[derive(Clone, Debug)]
pub struct SubmitReview {
    /// ID of the [`Car`] to review.
    pub car_id: car::Id,

    /// ID of the author.
    pub author_id: user::Id,

    /// Displayed name of the author.
    pub author_name: user::Name,

    /// Review fields as submitted.
    pub form: ReviewForm,
}

impl<Db, Files, Pay, Mail> Command<SubmitReview>
    for Service<Db, Files, Pay, Mail>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Car>, car::Id>>,
            Ok = Option<Car>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Car, car::Number>>,
            Err = Traced<database::Error>,
        > + Database<Insert<Review>, Err = Traced<database::Error>>
        + Database<
            Select<By<Vec<Review>, car::Id>>,
            Ok = Vec<Review>,
            Err = Traced<database::Error>,
        > + Database<Update<Car>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = (Review, Car);
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: SubmitReview) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SubmitReview {
            car_id,
            author_id,
            author_name,
            form,
        } = cmd;

        let (rating, text) =
            form.validate().map_err(tracerr::from_and_wrap!(=> E))?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let number = tx
            .execute(Select(By::<Option<Car>, _>::new(car_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NotExists(car_id))
            .map_err(tracerr::wrap!())?
            .number;
        // Avoid lost updates of the `Car` rating.
        tx.execute(Lock(By::<Car, _>::new(number)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        let mut car = tx
            .execute(Select(By::<Option<Car>, _>::new(car_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NotExists(car_id))
            .map_err(tracerr::wrap!())?;

        let review = Review {
            id: review::Id::new(),
            car_id,
            author_id,
            author_name,
            rating,
            text,
            created_at: DateTime::now().coerce(),
        };
        tx.execute(Insert(review.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let reviews = tx
            .execute(Select(By::<Vec<Review>, _>::new(car_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        (car.rating, car.reviews_count) =
            car::Rating::mean(reviews.into_iter().map(|r| r.rating));
        tx.execute(Update(car.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok((review, car))
    }
}

/// Error of [`SubmitReview`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Submitted fields are invalid.
    #[display("Invalid review: {_0}")]
    Invalid(Rejection),

    /// [`Car`] with the provided ID does not exist.
    #[display("`Car(id: {_0})` does not exist")]
    #[from(ignore)]
    NotExists(#[error(not(source))] car::Id),
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select};
    use rust_decimal::Decimal;

    use crate::{
        command::{create_ticket::spec::listed, spec as svc},
        domain::{car, user, validation::ReviewForm, Car, Review},
        infra::Database as _,
        Command as _,
    };

    use super::{ExecutionError, SubmitReview};

    fn review(car_id: car::Id, rating: i32) -> SubmitReview {
        SubmitReview {
            car_id,
            author_id: user::Id::new(),
            author_name: user::Name::new("Meena").unwrap(),
            form: ReviewForm {
                rating: Some(rating),
                review: Some("Smooth ride".into()),
            },
        }
    }

    #[tokio::test]
    async fn recomputes_car_rating() {
        let svc = svc::service();
        let car = listed(&svc, "AB-1234").await;

        for rating in [5, 4, 4] {
            drop(svc.execute(review(car.id, rating)).await.unwrap());
        }

        let stored = svc
            .database()
            .execute(Select(By::<Option<Car>, _>::new(car.id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(Decimal::from(stored.rating), Decimal::new(43, 1));
        assert_eq!(u32::from(stored.reviews_count), 3);

        let reviews = svc
            .database()
            .execute(Select(By::<Vec<Review>, _>::new(car.id)))
            .await
            .unwrap();
        assert_eq!(reviews.len(), 3);
        assert!(reviews.iter().all(|r| r.author_name.to_string() == "Meena"));
    }

    #[tokio::test]
    async fn rejects_out_of_range_rating() {
        let svc = svc::service();
        let car = listed(&svc, "AB-1234").await;

        let err = svc.execute(review(car.id, 6)).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::Invalid(_)));
        let reviews = svc
            .database()
            .execute(Select(By::<Vec<Review>, _>::new(car.id)))
            .await
            .unwrap();
        assert!(reviews.is_empty());
    }

    #[tokio::test]
    async fn fails_on_unknown_car() {
        let svc = svc::service();

        let err = svc.execute(review(car::Id::new(), 5)).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotExists(_)));
    }
}
