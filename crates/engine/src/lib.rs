#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

//! Size- and time-triggered bulk execution
//!
//! This crate accumulates items submitted one at a time and hands them, in
//! batches, to a caller-supplied operation. It provides:
//! - A thread-safe unbounded ingest buffer with atomic full drains
//! - A size trigger evaluated on every `add` and a fixed-delay time trigger
//! - A bounded worker pool, with synchronous backpressure when `concurrency == 1`
//! - Bounded retry of failed batches with before/after/failure listener hooks
//! - A graceful `close` that drains whatever is still buffered
//!
//! # Example
//!
//! ```no_run
//! use easybulk::{BulkHandler, LoggingListener};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let handler = BulkHandler::builder()
//!     .bulk_actions(100)
//!     .flush_interval(Duration::from_millis(200))
//!     .max_retry(3)
//!     .operation(|batch: &[String]| -> anyhow::Result<()> {
//!         println!("writing {} records", batch.len());
//!         Ok(())
//!     })
//!     .listener(LoggingListener::new("example"))
//!     .build()?;
//!
//! handler.add("record".to_string()).await?;
//! handler.close().await;
//! # Ok(())
//! # }
//! ```

// Private implementation modules
mod buffer;
mod dispatcher;
mod handler;
mod listener;
mod operation;
mod retry;
mod trigger;

// Public exports - minimal API surface
pub use easybulk_core::{BulkConfig, Error, Result};
pub use handler::{BulkHandler, BulkHandlerBuilder, EngineState};
pub use listener::{BulkListener, LoggingListener, NoopListener};
pub use operation::BulkOperation;
pub use retry::FlushOutcome;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::handler::BulkHandler;
    pub use crate::listener::BulkListener;
    pub use crate::operation::BulkOperation;
}
