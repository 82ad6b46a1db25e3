//! Command-line overrides for the bulk configuration

use clap::Args;
use easybulk_core::config::BulkConfig;

/// Flags that take precedence over the config file and environment
#[derive(Debug, Clone, Default, Args)]
pub struct BulkArgs {
    /// Pending lines that trigger a flush (-1 disables size-based flushing)
    #[arg(long, allow_negative_numbers = true)]
    pub bulk_actions: Option<i64>,

    /// Milliseconds between time-based flushes
    #[arg(long)]
    pub flush_interval_ms: Option<u64>,

    /// Extra attempts for a batch whose write failed
    #[arg(long)]
    pub max_retry: Option<u32>,

    /// Concurrent batch writers (1 makes reading wait for each write)
    #[arg(long)]
    pub concurrency: Option<usize>,
}

impl BulkArgs {
    /// Apply every flag that was given on top of `config`
    pub fn apply(&self, mut config: BulkConfig) -> BulkConfig {
        if let Some(bulk_actions) = self.bulk_actions {
            config.bulk_actions = bulk_actions;
        }
        if let Some(flush_interval_ms) = self.flush_interval_ms {
            config.flush_interval_ms = flush_interval_ms;
        }
        if let Some(max_retry) = self.max_retry {
            config.max_retry = max_retry;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        config
    }
}
