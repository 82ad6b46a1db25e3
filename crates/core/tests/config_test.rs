use easybulk_core::config::{global_config_path, BulkConfig, SIZE_TRIGGER_DISABLED};
use easybulk_core::Error;

#[test]
fn test_load_with_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bulk.toml");
    std::fs::write(&path, "bulk_actions = -1\nconcurrency = 8\n").unwrap();

    let config = BulkConfig::load(Some(&path)).unwrap();
    assert_eq!(config.bulk_actions, SIZE_TRIGGER_DISABLED);
    assert_eq!(config.concurrency, 8);
    assert!(config.validate().is_ok());
}

#[test]
fn test_loaded_config_still_needs_validation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bulk.toml");
    std::fs::write(&path, "concurrency = 0\n").unwrap();

    let config = BulkConfig::load(Some(&path)).unwrap();
    assert!(matches!(config.validate(), Err(Error::Config(_))));
}

#[test]
fn test_global_config_path_location() {
    if let Ok(path) = global_config_path() {
        assert!(path.ends_with(".easybulk/config.toml"));
    }
}

#[test]
fn test_closed_error_display() {
    let err = Error::Closed;
    assert!(err.is_closed());
    assert_eq!(err.to_string(), "bulk handler already closed");
}
