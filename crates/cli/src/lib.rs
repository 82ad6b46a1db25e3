//! Library interface for the easybulk CLI
//!
//! This module exposes the batch sink and the command-line configuration
//! overrides for integration testing while keeping the main binary logic in
//! main.rs.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod args;
pub mod sink;

// Re-export commonly needed types for tests
pub use anyhow::Result;
pub use args::BulkArgs;
pub use sink::JsonLinesSink;
