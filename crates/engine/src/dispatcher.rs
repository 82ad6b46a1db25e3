//! Bounded worker pool executing flush requests

use easybulk_core::error::{Error, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, warn};

/// Runs flushes on a fixed number of worker slots
///
/// Every flush is spawned onto a tracked task that first claims a slot. In
/// synchronous mode (one slot) `submit` waits for the task, which gives
/// callers backpressure; otherwise it returns as soon as the task is spawned.
pub(crate) struct FlushDispatcher {
    slots: Arc<Semaphore>,
    tracker: TaskTracker,
    synchronous: bool,
}

impl FlushDispatcher {
    pub(crate) fn new(concurrency: usize) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(concurrency)),
            tracker: TaskTracker::new(),
            synchronous: concurrency == 1,
        }
    }

    /// Hand a flush to the pool
    ///
    /// Failures of the dispatch path itself are logged and swallowed; the
    /// flush reports operation failures through its own listener.
    pub(crate) async fn submit<F>(&self, flush: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let slots = Arc::clone(&self.slots);
        let task = self.tracker.spawn(async move {
            let _permit = slots
                .acquire_owned()
                .await
                .map_err(|e| Error::dispatch(format!("Worker slot unavailable: {e}")))?;
            flush.await;
            Ok::<(), Error>(())
        });

        if !self.synchronous {
            return;
        }

        let outcome = match task.await {
            Ok(result) => result,
            Err(e) => Err(Error::dispatch(format!("Flush task failed: {e}"))),
        };
        if let Err(e) = outcome {
            error!("{e}");
        }
    }

    /// Run `work` on the calling task while holding a worker slot
    ///
    /// Waits at most `grace` for a slot; after that the work runs without one.
    pub(crate) async fn run_inline<F>(&self, work: F, grace: Duration) -> F::Output
    where
        F: Future,
    {
        let _permit = match timeout(grace, self.slots.acquire()).await {
            Ok(Ok(permit)) => Some(permit),
            Ok(Err(e)) => {
                warn!("Worker slot unavailable, running without one: {e}");
                None
            }
            Err(_) => {
                warn!("No worker slot freed within {grace:?}, running without one");
                None
            }
        };
        work.await
    }

    /// Number of flush tasks spawned and not yet finished
    pub(crate) fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Close the pool and wait for outstanding flushes
    ///
    /// Returns an error if flushes are still running when `grace` expires;
    /// those tasks are left to finish on their own.
    pub(crate) async fn shutdown(&self, grace: Duration) -> Result<()> {
        self.tracker.close();
        debug!("Waiting for {} in-flight flushes", self.tracker.len());

        timeout(grace, self.tracker.wait()).await.map_err(|_| {
            let remaining = self.tracker.len();
            warn!("{remaining} flushes still running after {grace:?}, abandoning them");
            Error::dispatch(format!("{remaining} flushes did not finish within {grace:?}"))
        })
    }
}
