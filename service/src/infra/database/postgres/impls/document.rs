//! [`document::Path`]-related [`Database`] implementations.

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::document,
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

impl<C> Database<Select<By<read::document::Referenced, document::Path>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::document::Referenced;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::document::Referenced, document::Path>>,
    ) -> Result<Self::Ok, Self::Err> {
        let path: document::Path = by.into_inner();

        const SQL: &str = "\
            SELECT EXISTS (\
                SELECT 1 \
                FROM cars \
                WHERE image_path = $1::VARCHAR \
                UNION ALL \
                SELECT 1 \
                FROM tickets \
                WHERE image_path = $1::VARCHAR \
                UNION ALL \
                SELECT 1 \
                FROM listing_requests \
                WHERE $1::VARCHAR IN (\
                    image_path, insurance_path, registration_path\
                )\
            )";
        self.query_opt(SQL, &[&path])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.expect("always exists").get::<_, bool>(0).into())
    }
}
