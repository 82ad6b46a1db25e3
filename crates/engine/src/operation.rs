//! Trait definition for the per-batch operation

use async_trait::async_trait;

/// The work performed on every flushed batch
///
/// An error marks the attempt as failed. The engine retries the same batch up
/// to `max_retry` more times and never propagates the error to whoever
/// triggered the flush; it is reported through
/// [`BulkListener::after_bulk_failure`](crate::BulkListener::after_bulk_failure).
///
/// A failed attempt may already have had partial side effects. Operations that
/// care should make themselves idempotent.
#[async_trait]
pub trait BulkOperation<T: Send + Sync>: Send + Sync {
    /// Process one batch
    async fn execute(&self, batch: &[T]) -> anyhow::Result<()>;
}

/// Plain closures act as synchronous operations
#[async_trait]
impl<T, F> BulkOperation<T> for F
where
    T: Send + Sync,
    F: Fn(&[T]) -> anyhow::Result<()> + Send + Sync,
{
    async fn execute(&self, batch: &[T]) -> anyhow::Result<()> {
        self(batch)
    }
}
