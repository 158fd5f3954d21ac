//! Remote service URL resolution and settings loading
//!
//! Tests that touch REGLEX_SERVICE_URL are `#[serial]` so they never observe
//! each other's environment.

use reglex_analysis::config::{
    resolve_service_url, AnalysisSettings, DEFAULT_SERVICE_URL, SERVICE_URL_ENV,
};
use reglex_common::config::{load_or_default, TomlConfig};
use serial_test::serial;
use std::time::Duration;

fn toml_with_url(url: Option<&str>) -> TomlConfig {
    let mut config = TomlConfig::default();
    config.remote.base_url = url.map(str::to_string);
    config
}

#[test]
#[serial]
fn test_cli_overrides_env_and_toml() {
    std::env::set_var(SERVICE_URL_ENV, "http://env-host:8000");
    let url = resolve_service_url(
        Some("http://cli-host:9000/"),
        &toml_with_url(Some("http://toml-host:8000")),
    )
    .unwrap();
    std::env::remove_var(SERVICE_URL_ENV);

    assert_eq!(url, "http://cli-host:9000");
}

#[test]
#[serial]
fn test_env_overrides_toml() {
    std::env::set_var(SERVICE_URL_ENV, "https://env-host");
    let url = resolve_service_url(None, &toml_with_url(Some("http://toml-host:8000"))).unwrap();
    std::env::remove_var(SERVICE_URL_ENV);

    assert_eq!(url, "https://env-host");
}

#[test]
#[serial]
fn test_toml_used_when_env_blank() {
    std::env::set_var(SERVICE_URL_ENV, "   ");
    let url = resolve_service_url(None, &toml_with_url(Some("http://toml-host:8000"))).unwrap();
    std::env::remove_var(SERVICE_URL_ENV);

    assert_eq!(url, "http://toml-host:8000");
}

#[test]
#[serial]
fn test_default_when_unconfigured() {
    std::env::remove_var(SERVICE_URL_ENV);
    let url = resolve_service_url(None, &TomlConfig::default()).unwrap();
    assert_eq!(url, DEFAULT_SERVICE_URL);
}

#[test]
#[serial]
fn test_invalid_url_is_config_error() {
    std::env::remove_var(SERVICE_URL_ENV);
    let err = resolve_service_url(Some("ftp://files.example.com"), &TomlConfig::default())
        .unwrap_err();
    assert!(matches!(err, reglex_common::Error::Config(_)));
}

#[test]
fn test_settings_from_toml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reglex-analysis.toml");
    std::fs::write(
        &path,
        r#"
[remote]
base_url = "http://analysis.internal:8000"
upload_path = "/v2/upload"
health_cache_secs = 5

[retry]
max_attempts = 5
base_delay_ms = 500

[sessions]
ttl_secs = 120
"#,
    )
    .unwrap();

    let config = load_or_default(&path).unwrap();
    let url = config.remote.base_url.clone().unwrap();
    let settings = AnalysisSettings::from_config(&config, &url).unwrap();

    assert_eq!(settings.upload_url, "http://analysis.internal:8000/v2/upload");
    assert_eq!(settings.health_url, "http://analysis.internal:8000/health");
    assert_eq!(settings.health_cache_window, Duration::from_secs(5));
    assert_eq!(settings.retry.max_attempts, 5);
    assert_eq!(settings.retry.base_delay, Duration::from_millis(500));
    assert_eq!(settings.retry.multiplier, 1.5);
    assert_eq!(settings.session_ttl, Duration::from_secs(120));
    assert_eq!(settings.max_file_size, 50 * 1024 * 1024);
}
