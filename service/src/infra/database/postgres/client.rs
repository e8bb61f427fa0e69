//! Postgres database clients, lazily checking out pooled [`Connection`]s.

use std::{future::Future, sync::Arc};

use tokio::sync::{RwLock, RwLockReadGuard};
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{self, connection, Connection},
};

/// Non-transactional Postgres database client.
#[derive(Clone, Debug)]
pub struct NonTx {
    /// [`connection::Pool`] to check out [`Connection`]s from.
    pub(crate) pool: connection::Pool,

    /// Checked out [`Connection`], if any.
    connection: Arc<RwLock<Option<connection::NonTx>>>,
}

impl NonTx {
    /// Creates a new [`NonTx`] client over the provided [`connection::Pool`].
    #[must_use]
    pub(crate) fn from_pool(pool: connection::Pool) -> Self {
        Self {
            pool,
            connection: Arc::new(RwLock::new(None)),
        }
    }

    /// Returns the [`Connection`] of this [`NonTx`] client, checking it out
    /// of the [`connection::Pool`] on first use.
    async fn connection(
        &self,
    ) -> Result<RwLockReadGuard<'_, connection::NonTx>, Traced<database::Error>>
    {
        lazy(&self.connection, || async {
            self.pool
                .get()
                .await
                .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                .map_err(tracerr::map_from)
        })
        .await
    }

    /// Takes the checked out [`Connection`] away from this [`NonTx`] client.
    async fn take_connection(&self) -> Option<connection::NonTx> {
        self.connection.write().await.take()
    }
}

/// Transactional Postgres database client.
///
/// The transaction is opened on the first statement, reusing the
/// [`Connection`] of the [`NonTx`] client it was created from, if any.
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`NonTx`] client this [`Tx`] client was created from, until its
    /// [`Connection`] is taken.
    origin: Arc<RwLock<Option<NonTx>>>,

    /// [`connection::Pool`] to check out a [`Connection`] from, when the
    /// origin [`NonTx`] client has none.
    pool: connection::Pool,

    /// Opened transaction, if any.
    tx: Arc<RwLock<Option<connection::Tx>>>,
}

impl Tx {
    /// Creates a new [`Tx`] client out of the provided [`NonTx`] client.
    #[must_use]
    pub fn from_non_tx(client: NonTx) -> Self {
        Self {
            pool: client.pool.clone(),
            origin: Arc::new(RwLock::new(Some(client))),
            tx: Arc::new(RwLock::new(None)),
        }
    }

    /// Returns the transactional [`Connection`] of this [`Tx`] client,
    /// opening the transaction on first use.
    async fn connection(
        &self,
    ) -> Result<RwLockReadGuard<'_, connection::Tx>, Traced<database::Error>>
    {
        lazy(&self.tx, || self.open()).await
    }

    /// Opens a new transaction on the [`Connection`] of the origin [`NonTx`]
    /// client, or on a freshly checked out one.
    async fn open(&self) -> Result<connection::Tx, Traced<database::Error>> {
        let reused = match self.origin.write().await.take() {
            Some(origin) => origin.take_connection().await,
            None => None,
        };
        let conn = match reused {
            Some(c) => c,
            None => self
                .pool
                .get()
                .await
                .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                .map_err(tracerr::map_from)?,
        };
        connection::Tx::from_non_tx(conn)
            .await
            .map_err(tracerr::wrap!())
    }

    /// Commits the transaction of this [`Tx`] client, if it has been opened.
    ///
    /// # Errors
    ///
    /// If `COMMIT` fails.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let Some(tx) = self.tx.write().await.take() else {
            return Ok(());
        };
        tx.commit().await.map_err(tracerr::wrap!())
    }
}

/// Returns the value stored in the provided `slot`, initializing it with the
/// provided `init` function first, if empty.
async fn lazy<'s, T, F, Fut>(
    slot: &'s RwLock<Option<T>>,
    init: F,
) -> Result<RwLockReadGuard<'s, T>, Traced<database::Error>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, Traced<database::Error>>>,
{
    let read = slot.read().await;
    let guard = if read.is_some() {
        read
    } else {
        drop(read);

        let mut write = slot.write().await;
        if write.is_none() {
            *write = Some(init().await.map_err(tracerr::wrap!())?);
        }
        write.downgrade()
    };

    Ok(RwLockReadGuard::map(guard, |v| {
        v.as_ref()
            .expect("slot cannot be emptied while guard is alive")
    }))
}

/// Implements [`Connection`] for a client by delegating to its lazily
/// initialized [`Connection`].
macro_rules! delegate_connection {
    ($($client:ty),+) => {$(
        impl Connection for $client {
            async fn query<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<Vec<Row>, Traced<database::Error>>
            where
                T: ToStatement + ?Sized,
            {
                self.connection()
                    .await
                    .map_err(tracerr::wrap!())?
                    .query(stmt, params)
                    .await
                    .map_err(tracerr::wrap!())
            }

            async fn query_opt<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<Option<Row>, Traced<database::Error>>
            where
                T: ToStatement + ?Sized,
            {
                self.connection()
                    .await
                    .map_err(tracerr::wrap!())?
                    .query_opt(stmt, params)
                    .await
                    .map_err(tracerr::wrap!())
            }

            async fn exec<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<u64, Traced<database::Error>>
            where
                T: ToStatement + ?Sized,
            {
                self.connection()
                    .await
                    .map_err(tracerr::wrap!())?
                    .exec(stmt, params)
                    .await
                    .map_err(tracerr::wrap!())
            }
        }
    )+};
}

delegate_connection!(NonTx, Tx);
