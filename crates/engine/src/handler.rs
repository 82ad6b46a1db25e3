//! Bulk handler lifecycle
//!
//! This module wires the ingest buffer, both flush triggers, the worker pool
//! and the retry loop together behind `BulkHandler`, and owns the
//! open/closing/closed state machine.

use crate::{
    buffer::IngestBuffer,
    dispatcher::FlushDispatcher,
    listener::BulkListener,
    operation::BulkOperation,
    retry::{FlushOutcome, RetryLoop},
    trigger::{SizeTrigger, TimeTrigger},
};
use easybulk_core::config::BulkConfig;
use easybulk_core::error::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

/// Lifecycle state of a handler; transitions only move forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Open,
    Closing,
    Closed,
}

/// State reachable from the caller, the timer task and the worker tasks
struct Shared<T: Send + Sync + 'static> {
    /// Read side is held while an item is checked and enqueued
    state: RwLock<EngineState>,
    buffer: IngestBuffer<T>,
    size_trigger: SizeTrigger,
    dispatcher: FlushDispatcher,
    retry: RetryLoop<T>,
}

impl<T: Send + Sync + 'static> Shared<T> {
    /// Drain the buffer and run the retry loop over whatever came out
    async fn flush(&self) -> Option<FlushOutcome> {
        let batch = self.buffer.drain_all().await;
        if batch.is_empty() {
            trace!("Nothing to flush, buffer already drained");
            return None;
        }

        debug!("Flushing batch of {} items", batch.len());
        let outcome = self.retry.run(&batch).await;
        debug!(
            "Batch of {} items finished after {} attempt(s), success: {}",
            batch.len(),
            outcome.attempts(),
            outcome.is_success()
        );
        Some(outcome)
    }

    async fn submit_flush(self: &Arc<Self>) {
        let shared = Arc::clone(self);
        self.dispatcher
            .submit(async move {
                shared.flush().await;
            })
            .await;
    }

    /// Stop the timer, flush the residue and join the worker pool
    async fn shut_down(self: Arc<Self>, timer: Option<TimeTrigger>, grace: Duration) {
        if let Some(mut trigger) = timer {
            trigger.stop(grace).await;
        }

        // The residue takes a worker slot like any other flush
        if let Some(outcome) = self.dispatcher.run_inline(self.flush(), grace).await {
            if !outcome.is_success() {
                warn!(
                    "Final flush failed after {} attempt(s), items were handed to the failure listener",
                    outcome.attempts()
                );
            }
        }

        debug!(
            "Joining worker pool ({} flushes in flight)",
            self.dispatcher.in_flight()
        );
        if let Err(e) = self.dispatcher.shutdown(grace).await {
            warn!("Worker pool did not drain cleanly: {e}");
        }

        *self.state.write().await = EngineState::Closed;
        info!("Bulk handler closed");
    }

    async fn on_timer(self: &Arc<Self>) {
        if *self.state.read().await != EngineState::Open {
            return;
        }
        if self.buffer.is_empty() {
            return;
        }

        trace!("Time trigger requesting flush");
        self.submit_flush().await;
    }
}

/// Accumulates items and flushes them in batches
///
/// A flush is requested when the pending count reaches `bulk_actions` or when
/// `flush_interval` elapses, whichever comes first. Must be created inside a
/// Tokio runtime; `close` should be awaited before dropping the handler so the
/// remaining items are flushed.
pub struct BulkHandler<T: Send + Sync + 'static> {
    shared: Arc<Shared<T>>,
    config: BulkConfig,
    /// The lock also serializes concurrent closes
    shutdown: Mutex<Shutdown>,
}

/// Resources handed from the handler to its shutdown task
struct Shutdown {
    /// Taken when the shutdown task starts
    timer: Option<TimeTrigger>,
    /// Running shutdown; survives a cancelled `close`
    task: Option<JoinHandle<()>>,
}

impl<T: Send + Sync + 'static> BulkHandler<T> {
    /// Create handler configuration from builder
    pub fn builder() -> BulkHandlerBuilder<T> {
        BulkHandlerBuilder::default()
    }

    /// Create a new handler and arm its time trigger
    pub fn new(
        config: BulkConfig,
        operation: Arc<dyn BulkOperation<T>>,
        listener: Arc<dyn BulkListener<T>>,
    ) -> Result<Self> {
        config.validate()?;
        tokio::runtime::Handle::try_current().map_err(|e| {
            Error::config(format!("BulkHandler must be created inside a Tokio runtime: {e}"))
        })?;

        let shared = Arc::new(Shared {
            state: RwLock::new(EngineState::Open),
            buffer: IngestBuffer::new(),
            size_trigger: SizeTrigger::new(config.size_threshold()),
            dispatcher: FlushDispatcher::new(config.concurrency),
            retry: RetryLoop::new(operation, listener, config.max_retry),
        });

        let ticker = Arc::clone(&shared);
        let timer = TimeTrigger::start(config.flush_interval(), move || {
            let shared = Arc::clone(&ticker);
            async move { shared.on_timer().await }
        });

        info!(
            "Bulk handler started (bulk_actions: {}, flush_interval: {:?}, max_retry: {}, concurrency: {})",
            config.bulk_actions,
            config.flush_interval(),
            config.max_retry,
            config.concurrency
        );

        Ok(Self {
            shared,
            config,
            shutdown: Mutex::new(Shutdown {
                timer: Some(timer),
                task: None,
            }),
        })
    }

    /// Submit one item
    ///
    /// Returns `Error::Closed` once `close` has begun; the item is then dropped
    /// without being buffered. If the item brings the pending count to
    /// `bulk_actions`, a flush is requested before returning. With
    /// `concurrency == 1` this waits for that flush, retries included.
    ///
    /// Operation failures never surface here.
    pub async fn add(&self, item: T) -> Result<()> {
        {
            let state = self.shared.state.read().await;
            if *state != EngineState::Open {
                return Err(Error::Closed);
            }
            self.shared.buffer.push(item).await;
        }

        if self
            .shared
            .size_trigger
            .should_flush(self.shared.buffer.approx_len())
        {
            trace!("Size trigger requesting flush");
            self.shared.submit_flush().await;
        }

        Ok(())
    }

    /// Shut the handler down, flushing everything still buffered
    ///
    /// Only the first call starts the shutdown; concurrent and later callers
    /// wait for the same shutdown to finish. The sequence is: stop accepting
    /// items, stop the time trigger, flush the residue with the full retry
    /// policy once a worker slot is free, wait for flushes already running on
    /// the worker pool, mark the handler closed. Each wait is bounded by
    /// `shutdown_timeout`, except the final flush which is bounded only by
    /// the operation itself.
    ///
    /// The shutdown runs on its own task, so dropping this future does not
    /// lose the residue; calling `close` again resumes waiting for it.
    pub async fn close(&self) {
        let mut shutdown = self.shutdown.lock().await;

        if shutdown.task.is_none() {
            {
                let mut state = self.shared.state.write().await;
                match *state {
                    EngineState::Closed => return,
                    EngineState::Open => *state = EngineState::Closing,
                    EngineState::Closing => {}
                }
            }
            info!(
                "Closing bulk handler ({} items pending)",
                self.shared.buffer.approx_len()
            );

            let shared = Arc::clone(&self.shared);
            let timer = shutdown.timer.take();
            let grace = self.config.shutdown_timeout();
            shutdown.task = Some(tokio::spawn(shared.shut_down(timer, grace)));
        }

        if let Some(task) = shutdown.task.as_mut() {
            if let Err(e) = task.await {
                error!("Bulk handler shutdown task failed: {e}");
            }
            shutdown.task = None;
        }
    }

    /// Approximate number of buffered items
    pub fn pending(&self) -> usize {
        self.shared.buffer.approx_len()
    }

    /// Current lifecycle state
    pub async fn state(&self) -> EngineState {
        *self.shared.state.read().await
    }

    /// Whether `close` has completed
    pub async fn is_closed(&self) -> bool {
        self.state().await == EngineState::Closed
    }

    /// The configuration this handler was built with
    pub fn config(&self) -> &BulkConfig {
        &self.config
    }
}

impl<T: Send + Sync + 'static> Drop for BulkHandler<T> {
    fn drop(&mut self) {
        // The time trigger cancels itself when dropped along with `shutdown`
        if let Ok(state) = self.shared.state.try_read() {
            if *state == EngineState::Open && !self.shared.buffer.is_empty() {
                warn!(
                    "Bulk handler dropped without close, {} items were not flushed",
                    self.shared.buffer.approx_len()
                );
            }
        }
    }
}

/// Builder for BulkHandler
pub struct BulkHandlerBuilder<T: Send + Sync + 'static> {
    config: BulkConfig,
    operation: Option<Arc<dyn BulkOperation<T>>>,
    listener: Option<Arc<dyn BulkListener<T>>>,
}

impl<T: Send + Sync + 'static> Default for BulkHandlerBuilder<T> {
    fn default() -> Self {
        Self {
            config: BulkConfig::default(),
            operation: None,
            listener: None,
        }
    }
}

impl<T: Send + Sync + 'static> BulkHandlerBuilder<T> {
    /// Replace every setting with a loaded configuration
    pub fn config(mut self, config: BulkConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the pending count that triggers a flush; `-1` disables it
    pub fn bulk_actions(mut self, bulk_actions: i64) -> Self {
        self.config.bulk_actions = bulk_actions;
        self
    }

    /// Set the fixed delay between time-triggered flushes
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.config.flush_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the number of extra attempts after a failed one
    pub fn max_retry(mut self, max_retry: u32) -> Self {
        self.config.max_retry = max_retry;
        self
    }

    /// Set the number of flush worker slots
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    /// Set the bound on each wait performed while closing
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config.shutdown_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the operation run on every batch
    pub fn operation(mut self, operation: impl BulkOperation<T> + 'static) -> Self {
        self.operation = Some(Arc::new(operation));
        self
    }

    /// Set the listener notified around every attempt
    pub fn listener(mut self, listener: impl BulkListener<T> + 'static) -> Self {
        self.listener = Some(Arc::new(listener));
        self
    }

    /// Build the handler
    pub fn build(self) -> Result<BulkHandler<T>> {
        let operation = self
            .operation
            .ok_or_else(|| Error::config("an operation is required"))?;
        let listener = self
            .listener
            .ok_or_else(|| Error::config("a listener is required"))?;
        BulkHandler::new(self.config, operation, listener)
    }
}
