//! Loading configuration from files on disk.

use std::io::Write;

use strand_config::{ConfigError, ConfigLoader};
use tempfile::NamedTempFile;

fn file_with(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_toml_file() {
    let file = file_with(
        ".toml",
        r#"
        [server]
        http_addr = "127.0.0.1:4000"

        [logging]
        format = "pretty"
        filter = "warn,strand::access=info"

        [basic_auth]
        realm = "staff only"
        "#,
    );

    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();

    assert_eq!(config.server.http_addr, "127.0.0.1:4000");
    assert_eq!(config.server.shutdown_timeout_secs, 30);
    assert_eq!(
        config.logging.log_config().directive(),
        "warn,strand::access=info"
    );
    assert_eq!(config.basic_auth.unit(|_, _| true).challenge(), "Basic realm=staff%20only");
}

#[test]
fn test_json_file() {
    let file = file_with(".json", r#"{"server": {"shutdown_timeout_secs": 3}}"#);
    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
    assert_eq!(
        config.server.server_config().shutdown_timeout(),
        std::time::Duration::from_secs(3)
    );
}

#[test]
fn test_unknown_field_in_file() {
    let file = file_with(".toml", "[logger]\ntarget = \"app\"\n");
    let err = ConfigLoader::new().with_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::TomlError(_)));
}

#[test]
fn test_missing_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    assert!(matches!(
        ConfigLoader::new().with_file(&path),
        Err(ConfigError::FileNotFound { .. })
    ));
    assert!(ConfigLoader::new().with_optional_file(&path).is_ok());
}

#[test]
fn test_unsupported_extension() {
    let file = file_with(".yaml", "server: {}");
    assert!(matches!(
        ConfigLoader::new().with_file(file.path()),
        Err(ConfigError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_file_layers_over_profile() {
    let file = file_with(".toml", "[logging]\nformat = \"compact\"\n");
    let config = ConfigLoader::new()
        .with_production()
        .with_file(file.path())
        .unwrap()
        .load()
        .unwrap();

    assert_eq!(config.logging.format, strand_telemetry::LogFormat::Compact);
    assert!(!config.logger.backtraces);
}
