//! Unbounded ingest buffer shared by producers and flushers

use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// FIFO of pending items
///
/// Every drained item leaves the buffer exactly once: `drain_all` swaps the
/// whole backing vector out under the lock, so concurrent drains partition
/// the items between them.
pub(crate) struct IngestBuffer<T> {
    items: Mutex<Vec<T>>,
    /// Mirror of `items.len()`, only written while the lock is held
    pending: AtomicUsize,
}

impl<T> IngestBuffer<T> {
    pub(crate) fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            pending: AtomicUsize::new(0),
        }
    }

    /// Append an item to the tail; returns the pending count after the push
    pub(crate) async fn push(&self, item: T) -> usize {
        let mut items = self.items.lock().await;
        items.push(item);
        let len = items.len();
        self.pending.store(len, Ordering::Release);
        len
    }

    /// Remove and return every buffered item as one batch
    pub(crate) async fn drain_all(&self) -> Vec<T> {
        let mut items = self.items.lock().await;
        self.pending.store(0, Ordering::Release);
        std::mem::take(&mut *items)
    }

    /// Best-effort pending count, may lag behind concurrent pushes and drains
    pub(crate) fn approx_len(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.approx_len() == 0
    }
}
