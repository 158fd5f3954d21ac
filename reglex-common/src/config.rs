//! Configuration model and TOML file handling
//!
//! Every section and field has a compiled default, so a partial (or missing)
//! TOML file always yields a complete configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default configuration file name inside the platform config directory
pub const CONFIG_FILE_NAME: &str = "reglex-analysis.toml";

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub remote: RemoteServiceConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub sessions: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5810,
        }
    }
}

/// Remote document-analysis service endpoints and timeouts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteServiceConfig {
    /// Base URL, e.g. `http://127.0.0.1:8000`
    pub base_url: Option<String>,
    pub health_path: String,
    pub upload_path: String,
    /// Liveness probe timeout (seconds)
    pub probe_timeout_secs: u64,
    /// Upload request timeout (seconds)
    pub upload_timeout_secs: u64,
    /// How long a probe verdict is reused (seconds)
    pub health_cache_secs: u64,
}

impl Default for RemoteServiceConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            health_path: "/health".to_string(),
            upload_path: "/upload".to_string(),
            probe_timeout_secs: 15,
            upload_timeout_secs: 600,
            health_cache_secs: 60,
        }
    }
}

/// Retry/backoff policy for remote requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 2000,
            multiplier: 1.5,
        }
    }
}

/// Session lifetime and upload limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Sessions older than this are swept (seconds, measured from creation)
    pub ttl_secs: u64,
    pub sweep_interval_secs: u64,
    pub max_file_size_bytes: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            sweep_interval_secs: 300,
            max_file_size_bytes: 50 * 1024 * 1024,
        }
    }
}

/// Logging settings (RUST_LOG takes precedence when set)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Platform default path of the configuration file
///
/// `~/.config/reglex/reglex-analysis.toml` on Linux, the platform config
/// directory elsewhere.
pub fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join("reglex").join(CONFIG_FILE_NAME))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
}

/// Load and parse a TOML configuration file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}

/// Load configuration, falling back to defaults when the file does not exist
///
/// A file that exists but cannot be parsed is still an error.
pub fn load_or_default(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        info!(
            "No config file at {}, using compiled defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }
    let config = load_toml_config(path)?;
    debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Write configuration atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = TomlConfig::default();
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay_ms, 2000);
        assert!((config.retry.multiplier - 1.5).abs() < f64::EPSILON);
        assert_eq!(config.remote.probe_timeout_secs, 15);
        assert_eq!(config.remote.health_cache_secs, 60);
        assert_eq!(config.sessions.ttl_secs, 3600);
        assert_eq!(config.sessions.max_file_size_bytes, 52_428_800);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            [remote]
            base_url = "http://analysis.internal:9000"

            [retry]
            max_attempts = 5
            "#,
        )
        .unwrap();

        assert_eq!(
            config.remote.base_url.as_deref(),
            Some("http://analysis.internal:9000")
        );
        assert_eq!(config.remote.upload_path, "/upload");
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay_ms, 2000);
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
    }
}
