//! Configuration loading and graceful degradation
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate SLIDECAST_CONFIG or SLIDECAST_API_URL are marked
//! with #[serial] so they run sequentially, not in parallel.

use serial_test::serial;
use slidecast_common::config::{
    load_config, resolve_config_path, TomlConfig, API_URL_ENV_VAR, CONFIG_ENV_VAR,
    DEFAULT_API_BASE_URL,
};
use std::env;
use std::io::Write;
use std::path::PathBuf;
use tempfile::{NamedTempFile, TempDir};

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_cli_path_takes_priority_over_env() {
    env::set_var(CONFIG_ENV_VAR, "/from/env.toml");

    let cli = PathBuf::from("/from/cli.toml");
    let resolved = resolve_config_path(Some(&cli));
    assert_eq!(resolved, Some(cli));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_path_used_without_cli() {
    env::set_var(CONFIG_ENV_VAR, "/from/env.toml");

    let resolved = resolve_config_path(None);
    assert_eq!(resolved, Some(PathBuf::from("/from/env.toml")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_missing_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.toml");

    let config = load_config(Some(&missing)).expect("missing file must not be fatal");
    assert_eq!(config.wizard.countdown_secs, 30);
    assert!(config.api_base_url.is_none());
}

#[test]
#[serial]
fn test_loads_values_from_file() {
    let file = write_config(
        r#"
        api_base_url = "http://courses.internal:8000"
        api_key = "secret"
        request_timeout_secs = 10

        [wizard]
        countdown_secs = 12

        [playback]
        advance_delay_ms = 250
        initial_volume = 0.8

        [loader]
        fallback_max_positions = 20
        fallback_failure_limit = 3
        fallback_concurrency = 4

        [logging]
        level = "debug"
        "#,
    );

    let config = load_config(Some(file.path())).unwrap();
    assert_eq!(config.api_key.as_deref(), Some("secret"));
    assert_eq!(config.wizard.countdown_secs, 12);
    assert_eq!(config.playback.advance_delay_ms, 250);
    assert_eq!(config.loader.fallback_max_positions, 20);
    assert_eq!(config.loader.fallback_concurrency, 4);
    assert_eq!(config.logging.level, "debug");
}

#[test]
#[serial]
fn test_malformed_file_is_an_error() {
    let file = write_config("api_base_url = [not valid");
    assert!(load_config(Some(file.path())).is_err());
}

#[test]
#[serial]
fn test_invalid_values_are_rejected() {
    let file = write_config(
        r#"
        [loader]
        fallback_concurrency = 0
        "#,
    );
    assert!(load_config(Some(file.path())).is_err());
}

#[test]
#[serial]
fn test_api_url_resolution_order() {
    env::remove_var(API_URL_ENV_VAR);

    let mut config = TomlConfig::default();
    assert_eq!(config.resolve_api_base_url(None), DEFAULT_API_BASE_URL);

    config.api_base_url = Some("http://from-toml:8000".to_string());
    assert_eq!(config.resolve_api_base_url(None), "http://from-toml:8000");

    env::set_var(API_URL_ENV_VAR, "http://from-env:8000/");
    assert_eq!(config.resolve_api_base_url(None), "http://from-env:8000");

    assert_eq!(
        config.resolve_api_base_url(Some("http://from-cli:8000")),
        "http://from-cli:8000"
    );

    env::remove_var(API_URL_ENV_VAR);
}
