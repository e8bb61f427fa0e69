//! [`Command`] for listing [`Car`]s of approved [`ListingRequest`]s.

use common::operations::{
    By, Commit, Insert, Lock, Select, Transact, Transacted,
};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{car, listing_request, Car, ListingRequest},
    infra::{database, Database},
    read, Service,
};

use super::Command;

/// [`Command`] for listing a [`Car`] for every approved [`ListingRequest`]
/// having none yet.
#[derive(Clone, Copy, Debug)]
pub struct MaterializeApprovedListings;

/// Outcome of [`MaterializeApprovedListings`] [`Command`].
#[derive(Clone, Debug, Default)]
pub struct Materialized {
    /// Listed [`Car`]s.
    pub created: Vec<Car>,

    /// [`ListingRequest`]s skipped due to their invalid availability period.
    pub skipped: Vec<listing_request::Id>,
}

impl<Db, Files, Pay, Mail> Command<MaterializeApprovedListings>
    for Service<Db, Files, Pay, Mail>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Vec<ListingRequest>, read::listing_request::Filter>>,
            Ok = Vec<ListingRequest>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Car, car::Number>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Car>, car::Number>>,
            Ok = Option<Car>,
            Err = Traced<database::Error>,
        > + Database<Insert<Car>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Materialized;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        _: MaterializeApprovedListings,
    ) -> Result<Self::Ok, Self::Err> {
        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::wrap!())?;

        let approved = tx
            .execute(Select(By::<Vec<ListingRequest>, _>::new(
                read::listing_request::Filter {
                    status: Some(listing_request::Status::Approved),
                    owner_email: None,
                },
            )))
            .await
            .map_err(tracerr::wrap!())?;

        let mut out = Materialized::default();
        for request in approved {
            // Avoid concurrent listing of the same `Car`.
            tx.execute(Lock(By::<Car, _>::new(request.car_number.clone())))
                .await
                .map_err(tracerr::wrap!())
                .map(drop)?;

            if tx
                .execute(Select(By::<Option<Car>, _>::new(
                    request.car_number.clone(),
                )))
                .await
                .map_err(tracerr::wrap!())?
                .is_some()
            {
                continue;
            }

            let car = match request.to_car() {
                Ok(car) => car,
                Err(e) => {
                    log::warn!(
                        "`ListingRequest(id: {})` is skipped: {e}",
                        request.id,
                    );
                    out.skipped.push(request.id);
                    continue;
                }
            };
            tx.execute(Insert(car.clone()))
                .await
                .map_err(tracerr::wrap!())
                .map(drop)?;
            out.created.push(car);
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;

        Ok(out)
    }
}

/// Error of [`MaterializeApprovedListings`] [`Command`] execution.
pub type ExecutionError = database::Error;

#[cfg(test)]
mod spec {
    use common::operations::Insert;

    use crate::{
        command::spec::service,
        domain::listing_request::{spec::request, Status},
        infra::Database as _,
        Command as _,
    };

    use super::MaterializeApprovedListings;

    #[tokio::test]
    async fn lists_only_missing_valid_cars() {
        let svc = service();
        let listed = request("AB-1234", "01-01-2025", "05-01-2025");
        let missing = request("CD-5678", "01-01-2025", "05-01-2025");
        let broken = request("EF-9012", "05-01-2025", "01-01-2025");
        let pending = request("GH-3456", "01-01-2025", "05-01-2025");
        svc.database()
            .execute(Insert(listed.to_car().unwrap()))
            .await
            .unwrap();
        for mut r in [listed, missing.clone(), broken.clone()] {
            r.status = Status::Approved;
            svc.database().execute(Insert(r)).await.unwrap();
        }
        svc.database().execute(Insert(pending)).await.unwrap();

        let out = svc.execute(MaterializeApprovedListings).await.unwrap();

        assert_eq!(out.created.len(), 1);
        assert_eq!(out.created[0].number, missing.car_number);
        assert_eq!(out.skipped, vec![broken.id]);

        let again = svc.execute(MaterializeApprovedListings).await.unwrap();
        assert!(again.created.is_empty());
        assert_eq!(again.skipped, vec![broken.id]);
    }
}
