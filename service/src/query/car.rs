//! [`Query`] collection related to [`Car`]s.

use common::operations::By;

use crate::{
    domain::{car, Car},
    read,
};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Car`] by its ID.
pub type ById = DatabaseQuery<By<Option<Car>, car::Id>>;

/// Queries a [`Car`] by its registration number.
pub type ByNumber = DatabaseQuery<By<Option<Car>, car::Number>>;

/// Queries a list of [`Car`]s passing a filter.
pub type List = DatabaseQuery<By<Vec<Car>, read::car::Filter>>;

/// Queries total count of [`Car`]s passing a filter.
pub type TotalCount =
    DatabaseQuery<By<read::car::TotalCount, read::car::Filter>>;

#[cfg(test)]
mod spec {
    use common::Date;

    use crate::{
        command::{create_ticket::spec::listed, spec as svc},
        domain::City,
        read, Query as _,
    };

    use super::{List, TotalCount};

    #[tokio::test]
    async fn searches_available_cars_by_city_and_period() {
        let svc = svc::service();
        let car = listed(&svc, "AB-1234").await;
        drop(listed(&svc, "CD-5678").await);

        let offer = |city: City, from: &str, to: &str| read::car::Filter {
            owner_email: None,
            offer: Some(read::car::Offer {
                city,
                from: Date::from_dmy(from).unwrap().coerce(),
                to: Date::from_dmy(to).unwrap().coerce(),
            }),
        };

        let found = svc
            .execute(List::by(offer(car.city, "10-03-2025", "12-03-2025")))
            .await
            .unwrap();
        assert_eq!(found.len(), 2);

        let found = svc
            .execute(List::by(offer(car.city, "01-01-2026", "05-01-2026")))
            .await
            .unwrap();
        assert!(found.is_empty());

        let total = svc
            .execute(TotalCount::by(read::car::Filter::default()))
            .await
            .unwrap();
        assert_eq!(i32::from(total), 2);
    }
}
