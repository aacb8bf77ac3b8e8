use std::io::Write;
use std::time::Duration;

use registry_heartbeat::{ConfigError, HeartbeatConfig};

#[test]
fn test_load_from_toml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[heartbeat]
heartbeat_interval_secs = 30
max_concurrent_beats = 8
shard_count = 64
shutdown_timeout_secs = 10
"#
    )
    .unwrap();

    let config = HeartbeatConfig::load(file.path()).unwrap();
    assert_eq!(config.period(), Duration::from_secs(30));
    assert_eq!(config.max_concurrent(), 8);
    assert_eq!(config.shards(), 64);
    assert_eq!(config.shutdown_timeout(), Duration::from_secs(10));
}

#[test]
fn test_missing_file_is_io_error() {
    let err = HeartbeatConfig::load("/nonexistent/heartbeat.toml").unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_init_tracing_is_idempotent() {
    registry_heartbeat::logging::init_tracing();
    assert!(!registry_heartbeat::logging::init_tracing());
}
