//! Unit tests for config.rs module

use std::fs;

use stockroom::config::AppConfig;
use stockroom::StockroomError;
use tempfile::tempdir;

#[test]
fn test_default_config_values() {
    let config = AppConfig::default();

    assert_eq!(config.database.path, "data/inventory.db");
    assert_eq!(config.database.max_connections, 4);
    assert_eq!(config.database.connection_timeout_secs, 30);
}

#[test]
fn test_default_logging_config() {
    let config = AppConfig::default();

    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.file_path, None);
    assert_eq!(config.logging.format, "text");
}

#[test]
fn test_default_inventory_and_export_config() {
    let config = AppConfig::default();

    assert_eq!(config.inventory.alert_threshold, 0);
    assert_eq!(config.export.default_format, "csv");
    assert_eq!(config.export.output_directory, "./output");
}

#[test]
fn test_default_config_is_valid() {
    assert!(AppConfig::default().validate().is_ok());
}

#[test]
fn test_validate_zero_max_connections() {
    let mut config = AppConfig::default();
    config.database.max_connections = 0;
    assert!(matches!(config.validate(), Err(StockroomError::InvalidConfig(_))));
}

#[test]
fn test_validate_zero_timeout() {
    let mut config = AppConfig::default();
    config.database.connection_timeout_secs = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_empty_database_path() {
    let mut config = AppConfig::default();
    config.database.path = "  ".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_invalid_log_level() {
    let mut config = AppConfig::default();
    config.logging.level = "loud".to_string();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("Invalid log level"));
}

#[test]
fn test_validate_all_log_levels() {
    for level in ["trace", "debug", "info", "warn", "error"] {
        let mut config = AppConfig::default();
        config.logging.level = level.to_string();
        assert!(config.validate().is_ok(), "level {level} should be accepted");
    }
}

#[test]
fn test_validate_invalid_log_format() {
    let mut config = AppConfig::default();
    config.logging.format = "xml".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_invalid_export_format() {
    let mut config = AppConfig::default();
    config.export.default_format = "pdf".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_load_from_explicit_file() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let path = temp_dir.path().join("stockroom.toml");
    fs::write(
        &path,
        r#"
[database]
path = "/tmp/shop.db"

[inventory]
alert_threshold = 3

[export]
default_format = "json"
"#,
    )
    .unwrap();

    let config = AppConfig::load(Some(&path)).unwrap();

    assert_eq!(config.database.path, "/tmp/shop.db");
    assert_eq!(config.database.max_connections, 4);
    assert_eq!(config.inventory.alert_threshold, 3);
    assert_eq!(config.export.default_format, "json");
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_load_rejects_invalid_values() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let path = temp_dir.path().join("stockroom.toml");
    fs::write(&path, "[database]\nmax_connections = 0\n").unwrap();

    assert!(matches!(AppConfig::load(Some(&path)), Err(StockroomError::InvalidConfig(_))));
}

#[test]
fn test_load_missing_explicit_file() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let path = temp_dir.path().join("absent.toml");

    assert!(AppConfig::load(Some(&path)).is_err());
}

#[test]
fn test_config_serialization_roundtrip() {
    let config = AppConfig::default();
    let json = serde_json::to_string(&config).unwrap();
    let parsed: AppConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.database.path, config.database.path);
    assert_eq!(parsed.inventory.alert_threshold, config.inventory.alert_threshold);
}
