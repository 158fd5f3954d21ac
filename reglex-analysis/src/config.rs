//! Configuration resolution for reglex-analysis
//!
//! Remote service URL priority: CLI flag → `REGLEX_SERVICE_URL` → TOML → default.
//! Everything else comes from the TOML file (or its compiled defaults).

use reglex_common::config::TomlConfig;
use reglex_common::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::registry::AnalysisServices;
use crate::services::{ConnectionHealthMonitor, HttpUploadTransport, RetryPolicy};

/// Environment variable overriding the remote service URL
pub const SERVICE_URL_ENV: &str = "REGLEX_SERVICE_URL";

/// Remote service URL used when no source configures one
pub const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:8000";

/// Accepted range limits for the `[retry]` section
pub const MAX_RETRY_ATTEMPTS: u32 = 10;
pub const MAX_RETRY_BASE_DELAY_MS: u64 = 60_000;
pub const MAX_RETRY_MULTIPLIER: f64 = 10.0;

/// Resolve the remote service base URL from all configuration tiers
pub fn resolve_service_url(cli_url: Option<&str>, toml_config: &TomlConfig) -> Result<String> {
    let env_url = std::env::var(SERVICE_URL_ENV).ok();
    let toml_url = toml_config.remote.base_url.as_deref();

    let candidates = [
        ("command line", cli_url),
        ("environment", env_url.as_deref()),
        ("TOML", toml_url),
    ];

    let sources: Vec<&str> = candidates
        .iter()
        .filter(|(_, url)| url.is_some_and(is_set))
        .map(|(source, _)| *source)
        .collect();

    if sources.len() > 1 {
        warn!(
            "Remote service URL found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    for (source, url) in candidates {
        if let Some(url) = url.filter(|u| is_set(u)) {
            let url = validate_service_url(url)?;
            info!("Remote service URL loaded from {}: {}", source, url);
            return Ok(url);
        }
    }

    info!("Remote service URL not configured, using default {}", DEFAULT_SERVICE_URL);
    Ok(DEFAULT_SERVICE_URL.to_string())
}

fn is_set(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Require an absolute http(s) URL; returns it without a trailing slash
pub fn validate_service_url(url: &str) -> Result<String> {
    let trimmed = url.trim();
    let parsed = reqwest::Url::parse(trimmed)
        .map_err(|e| Error::Config(format!("Invalid remote service URL '{}': {}", trimmed, e)))?;

    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(Error::Config(format!(
            "Remote service URL must be an http(s) URL with a host: '{}'",
            trimmed
        )));
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Fully resolved runtime settings
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    pub service_url: String,
    pub health_url: String,
    pub upload_url: String,
    pub probe_timeout: Duration,
    pub upload_timeout: Duration,
    pub health_cache_window: Duration,
    pub retry: RetryPolicy,
    pub session_ttl: Duration,
    pub sweep_interval: Duration,
    pub max_file_size: u64,
}

impl AnalysisSettings {
    pub fn from_config(toml_config: &TomlConfig, service_url: &str) -> Result<Self> {
        let remote = &toml_config.remote;
        let retry = &toml_config.retry;
        let sessions = &toml_config.sessions;

        if retry.max_attempts == 0 || retry.max_attempts > MAX_RETRY_ATTEMPTS {
            return Err(Error::Config(format!(
                "retry.max_attempts must be between 1 and {} (got {})",
                MAX_RETRY_ATTEMPTS, retry.max_attempts
            )));
        }
        if retry.base_delay_ms > MAX_RETRY_BASE_DELAY_MS {
            return Err(Error::Config(format!(
                "retry.base_delay_ms must be at most {} (got {})",
                MAX_RETRY_BASE_DELAY_MS, retry.base_delay_ms
            )));
        }
        if !(1.0..=MAX_RETRY_MULTIPLIER).contains(&retry.multiplier) {
            return Err(Error::Config(format!(
                "retry.multiplier must be between 1.0 and {} (got {})",
                MAX_RETRY_MULTIPLIER, retry.multiplier
            )));
        }
        if sessions.sweep_interval_secs == 0 {
            return Err(Error::Config(
                "sessions.sweep_interval_secs must be positive".to_string(),
            ));
        }

        let service_url = validate_service_url(service_url)?;

        Ok(Self {
            health_url: join_url(&service_url, &remote.health_path),
            upload_url: join_url(&service_url, &remote.upload_path),
            service_url,
            probe_timeout: Duration::from_secs(remote.probe_timeout_secs),
            upload_timeout: Duration::from_secs(remote.upload_timeout_secs),
            health_cache_window: Duration::from_secs(remote.health_cache_secs),
            retry: RetryPolicy {
                max_attempts: retry.max_attempts,
                base_delay: Duration::from_millis(retry.base_delay_ms),
                multiplier: retry.multiplier,
            },
            session_ttl: Duration::from_secs(sessions.ttl_secs),
            sweep_interval: Duration::from_secs(sessions.sweep_interval_secs),
            max_file_size: sessions.max_file_size_bytes,
        })
    }

    /// Build the HTTP-backed collaborators; the monitor is also returned for
    /// the health endpoints
    pub fn build_services(&self) -> Result<(AnalysisServices, Arc<ConnectionHealthMonitor>)> {
        let monitor = Arc::new(
            ConnectionHealthMonitor::new(
                self.health_url.clone(),
                self.probe_timeout,
                self.health_cache_window,
            )
            .map_err(|e| Error::Internal(format!("Health monitor setup failed: {}", e)))?,
        );
        let transport = HttpUploadTransport::new(self.upload_url.clone(), self.upload_timeout)
            .map_err(|e| Error::Internal(format!("Upload transport setup failed: {}", e)))?;

        let services = AnalysisServices::new(monitor.clone(), Arc::new(transport), self.retry)
            .with_max_file_size(self.max_file_size);

        Ok((services, monitor))
    }
}
