//! Observation hooks around every flush attempt

use tracing::{debug, warn};

/// Callbacks bracketing each attempt of a flush
///
/// All hooks run synchronously on the task executing the flush: a worker
/// task, the time-trigger task, or the caller of `close`. They fire on every
/// attempt, so a batch retried twice produces three `before_bulk` calls.
pub trait BulkListener<T>: Send + Sync {
    /// Called before the operation is invoked
    fn before_bulk(&self, batch: &[T]);

    /// Called after the operation succeeded
    fn after_bulk(&self, batch: &[T]);

    /// Called after the operation failed
    fn after_bulk_failure(&self, batch: &[T], failure: &anyhow::Error);
}

/// Listener that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl<T> BulkListener<T> for NoopListener {
    fn before_bulk(&self, _batch: &[T]) {}

    fn after_bulk(&self, _batch: &[T]) {}

    fn after_bulk_failure(&self, _batch: &[T], _failure: &anyhow::Error) {}
}

/// Listener that reports batch sizes through `tracing`
#[derive(Debug, Clone)]
pub struct LoggingListener {
    name: String,
}

impl LoggingListener {
    /// Create a listener whose events carry `name` as the handler field
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl<T> BulkListener<T> for LoggingListener {
    fn before_bulk(&self, batch: &[T]) {
        debug!(handler = %self.name, size = batch.len(), "Executing bulk");
    }

    fn after_bulk(&self, batch: &[T]) {
        debug!(handler = %self.name, size = batch.len(), "Bulk succeeded");
    }

    fn after_bulk_failure(&self, batch: &[T], failure: &anyhow::Error) {
        warn!(
            handler = %self.name,
            size = batch.len(),
            error = %failure,
            "Bulk failed"
        );
    }
}
