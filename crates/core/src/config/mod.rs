//! Configuration module for the bulk handler
//!
//! `BulkConfig` is frozen once a handler is built. It can be assembled in code,
//! parsed from TOML, or loaded from a file with environment variable overrides.

mod defaults;
mod loading;


use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub use defaults::SIZE_TRIGGER_DISABLED;

use defaults::*;

/// Returns the path to the global configuration file
///
/// The global config is stored at `~/.easybulk/config.toml`.
pub fn global_config_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| Error::config("Unable to determine home directory".to_string()))?;
    Ok(home_dir.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILE))
}

/// Immutable configuration for a bulk handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkConfig {
    /// Pending item count that triggers a flush; `-1` disables size triggering
    #[serde(default = "default_bulk_actions")]
    pub bulk_actions: i64,

    /// Fixed delay between time-triggered flush attempts, in milliseconds
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,

    /// Extra attempts on the same batch after the first one fails
    #[serde(default = "default_max_retry")]
    pub max_retry: u32,

    /// Number of flush worker slots; `1` makes `add` wait for the flush it triggers
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Upper bound on each wait performed while closing, in milliseconds
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            bulk_actions: default_bulk_actions(),
            flush_interval_ms: default_flush_interval_ms(),
            max_retry: default_max_retry(),
            concurrency: default_concurrency(),
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
        }
    }
}

impl BulkConfig {
    /// Size threshold for the size trigger, `None` when it is disabled
    pub fn size_threshold(&self) -> Option<usize> {
        if self.bulk_actions == SIZE_TRIGGER_DISABLED {
            None
        } else {
            usize::try_from(self.bulk_actions).ok()
        }
    }

    /// Get the flush interval duration
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    /// Get the shutdown timeout duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Whether triggering callers wait for their flush to complete
    pub fn is_synchronous(&self) -> bool {
        self.concurrency == 1
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.bulk_actions != SIZE_TRIGGER_DISABLED && self.bulk_actions < 1 {
            return Err(Error::config(format!(
                "bulk_actions must be positive or {SIZE_TRIGGER_DISABLED} to disable (got {})",
                self.bulk_actions
            )));
        }

        if self.flush_interval_ms == 0 {
            return Err(Error::config(
                "flush_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.concurrency == 0 {
            return Err(Error::config(
                "concurrency must be greater than 0".to_string(),
            ));
        }

        if self.shutdown_timeout_ms == 0 {
            return Err(Error::config(
                "shutdown_timeout_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
