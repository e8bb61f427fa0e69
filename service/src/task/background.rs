//! Background environment for running [`Task`]s.

use std::{
    error::Error,
    future::{Future, IntoFuture},
    iter,
};

use futures::{
    future::{self, LocalBoxFuture},
    FutureExt as _, TryFutureExt as _,
};
use tokio::task;
use tracing as log;

#[cfg(doc)]
use crate::Task;

/// Boxed error a [`Task`] stopped with.
type Failure = Box<dyn Error + 'static>;

/// Background environment running long-lived [`Task`]s of a
/// [`Service`](crate::Service) on the current thread.
///
/// Resolves once any of the spawned [`Task`]s stops with an error.
#[derive(Debug, Default)]
pub struct Background {
    /// Local set of tasks.
    set: task::LocalSet,

    /// Handles of spawned tasks.
    handles: Vec<task::JoinHandle<Result<(), Failure>>>,
}

impl Background {
    /// Spawns a new [`Task`] named `name` inside the [`Background`]
    /// environment.
    pub fn spawn<F, E>(&mut self, name: &'static str, future: F)
    where
        F: Future<Output = Result<(), E>> + 'static,
        E: Error + 'static,
    {
        log::debug!("starting `{name}` task");
        self.handles.push(self.set.spawn_local(future.map_err(move |e| {
            log::error!("`{name}` task stopped: {e}");
            Failure::from(Box::new(e))
        })));
    }

    /// Returns the number of spawned [`Task`]s.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Indicates whether no [`Task`] has been spawned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl IntoFuture for Background {
    type Output = Result<(), Failure>;
    type IntoFuture = LocalBoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        let Self { set, handles } = self;
        let joined = handles.into_iter().map(|h| {
            h.map(|r| r.unwrap_or_else(|e| Err(Failure::from(Box::new(e)))))
                .boxed_local()
        });
        let set = set.map(Ok).boxed_local();
        future::try_join_all(iter::once(set).chain(joined))
            .map_ok(drop)
            .boxed_local()
    }
}

#[cfg(test)]
mod spec {
    use std::io;

    use super::Background;

    #[tokio::test]
    async fn stops_on_failed_task() {
        let mut bg = Background::default();
        bg.spawn("failing", async { Err::<(), _>(io::Error::other("boom")) });
        assert_eq!(bg.len(), 1);

        let err = bg.await.unwrap_err();

        assert_eq!(err.to_string(), "boom");
    }
}
