//! Default values and functions for configuration

/// Sentinel for `bulk_actions` that turns size-triggered flushing off
pub const SIZE_TRIGGER_DISABLED: i64 = -1;

pub(crate) const DEFAULT_CONFIG_DIR: &str = ".easybulk";
pub(crate) const DEFAULT_CONFIG_FILE: &str = "config.toml";
pub(crate) const ENV_PREFIX: &str = "EASYBULK";

pub(crate) fn default_bulk_actions() -> i64 {
    1000
}

pub(crate) fn default_flush_interval_ms() -> u64 {
    100
}

pub(crate) fn default_max_retry() -> u32 {
    0
}

pub(crate) fn default_concurrency() -> usize {
    1
}

pub(crate) fn default_shutdown_timeout_ms() -> u64 {
    60_000 // 1 minute
}
