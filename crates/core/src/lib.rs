#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

//! Core types shared by the easybulk crates
//!
//! This crate provides:
//!
//! - **Configuration**: the validated `BulkConfig` and its file/environment loading
//! - **Error handling**: the unified `Error` type surfaced by the engine
//!

pub mod config;
pub mod error;

// Re-export main types for convenience
pub use config::BulkConfig;
pub use error::{Error, Result};

/// Version of the core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::BulkConfig;
    pub use crate::error::{Error, Result};
}
