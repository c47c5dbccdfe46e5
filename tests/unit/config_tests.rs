// ==========================
// tests/unit/config_tests.rs
// ==========================
//! Unit tests for the configuration module
use social_backend::config::{ConfigError, Settings, StorageBackend};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_settings_default() {
    let settings = Settings::default();

    assert_eq!(settings.server.host, "127.0.0.1");
    assert_eq!(settings.server.port, 8000);
    assert_eq!(settings.storage.backend, StorageBackend::File);
    assert_eq!(settings.storage.path, PathBuf::from("data"));
    assert_eq!(settings.storage.database, "social_network");
    assert_eq!(settings.rate_limit.max_requests, 300);
    assert_eq!(settings.rate_limit.window_secs, 60);
    assert_eq!(settings.auth.token_ttl_secs, 1800);
    assert!(settings.auth.jwt_secret.is_none());
    assert_eq!(settings.log.level, "info");
}

#[test]
fn test_database_dir() {
    let mut settings = Settings::default();
    settings.storage.path = PathBuf::from("/srv/social");
    settings.storage.database = "staging".to_string();
    assert_eq!(settings.storage.database_dir(), PathBuf::from("/srv/social/staging"));
}

#[test]
fn test_load_config_from_file() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("social.toml");

    let config_content = r#"
        [server]
        host = "0.0.0.0"
        port = 9000

        [storage]
        backend = "memory"

        [auth]
        admin_emails = ["root@example.com"]

        [rate_limit]
        max_requests = 50
        window_secs = 30
    "#;
    fs::write(&config_path, config_content).unwrap();

    let settings = Settings::load(Some(&config_path)).unwrap();
    assert_eq!(settings.server.host, "0.0.0.0");
    assert_eq!(settings.server.port, 9000);
    assert_eq!(settings.storage.backend, StorageBackend::Memory);
    assert_eq!(settings.rate_limit.max_requests, 50);
    assert_eq!(settings.rate_limit.window_secs, 30);
    // untouched sections keep their defaults
    assert_eq!(settings.auth.token_ttl_secs, 1800);
    assert!(settings.auth.is_admin_email("ROOT@example.com "));
}

#[test]
fn test_load_missing_file() {
    let temp_dir = tempdir().unwrap();
    let missing = temp_dir.path().join("absent.toml");
    assert!(matches!(
        Settings::load(Some(&missing)),
        Err(ConfigError::MissingFile(_))
    ));
}

#[test]
fn test_invalid_file_values_rejected() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("social.toml");
    fs::write(&config_path, "[auth]\njwt_secret = \"too-short\"\n").unwrap();

    assert!(matches!(
        Settings::load(Some(&config_path)),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn test_bind_addr() {
    let mut settings = Settings::default();
    settings.server.port = 3000;
    assert_eq!(settings.server.bind_addr().unwrap().to_string(), "127.0.0.1:3000");

    settings.server.host = "not an address".to_string();
    assert!(settings.validate().is_err());
}
