//! Unit tests for the logging subsystem.

use std::{fs, path::PathBuf};

use tracing_subscriber::layer::SubscriberExt;

use super::{manager::build_layers, service::logger_config_from, *};

#[test]
fn test_logger_config_builder_pattern() {
    let config = LoggerConfig::new("test-service".to_string())
        .with_service_version("2.0.0".to_string())
        .with_json_logging(true);

    assert_eq!(config.service_name, "test-service");
    assert_eq!(config.service_version, Some("2.0.0".to_string()));
    assert!(config.stdout_config.json_format);
    assert!(config.file_logging_config.is_none());
}

#[test]
fn test_format_service_name() {
    assert_eq!(format_service_name("via-bridge", None), "via-bridge");
    assert_eq!(format_service_name("via-bridge", Some("dev")), "via-bridge%dev");
}

#[test]
fn test_logger_config_from_settings() {
    let dir = PathBuf::from("/var/log/via");
    let settings = LoggingInitConfig {
        service_base_name: "via-bridge",
        service_label: Some("regtest"),
        log_dir: Some(&dir),
        log_file_prefix: None,
        json_format: Some(true),
        default_log_prefix: "bridge",
    };

    let config = logger_config_from(&settings);
    assert_eq!(config.service_name, "via-bridge%regtest");
    assert!(config.stdout_config.json_format);
    let file = config.file_logging_config.expect("file logging configured");
    assert_eq!(file.directory, dir);
    assert_eq!(file.file_name_prefix, "bridge");
    assert!(!file.json_format);
}

#[test]
fn test_file_layer_writes_events() {
    let dir = tempfile::tempdir().unwrap();
    let config = LoggerConfig::new("test-service".to_string()).with_file_logging(
        FileLoggingConfig::new(dir.path().to_path_buf(), "bridge".to_string())
            .with_rotation(Rotation::NEVER),
    );

    let (layers, guard) = build_layers(&config).unwrap();
    assert_eq!(layers.len(), 2);
    let subscriber = tracing_subscriber::registry().with(layers);
    tracing::subscriber::with_default(subscriber, || {
        tracing::warn!(txid = "abc", "deposit broadcast");
    });
    // Dropping the guard flushes the background writer.
    drop(guard);

    let contents: String = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|entry| fs::read_to_string(entry.unwrap().path()).ok())
        .collect();
    assert!(contents.contains("deposit broadcast"), "log file: {contents}");
    assert!(contents.contains("txid"));
}

#[test]
fn test_stdout_only_has_no_guard() {
    let (layers, guard) = build_layers(&LoggerConfig::default()).unwrap();
    assert_eq!(layers.len(), 1);
    assert!(guard.is_none());
}
