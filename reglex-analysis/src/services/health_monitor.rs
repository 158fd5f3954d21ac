//! Remote service liveness probing
//!
//! Probes `GET /health` and caches the verdict for a fixed window. Any probe
//! failure (timeout, non-2xx, transport error) means "unavailable"; nothing is
//! ever thrown to the caller.

use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::services::TransportError;

/// Default verdict cache window
pub const DEFAULT_CACHE_WINDOW: Duration = Duration::from_secs(60);

/// Reachability check consulted before each remote attempt
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Whether the remote service is currently reachable
    async fn is_available(&self) -> bool;

    /// Forget any cached verdict so the next call probes again
    async fn reset_cache(&self);
}

#[derive(Debug, Clone, Copy)]
struct CachedVerdict {
    available: bool,
    checked_at: Instant,
}

/// HTTP liveness monitor with a cached verdict
pub struct ConnectionHealthMonitor {
    http_client: reqwest::Client,
    health_url: String,
    cache_window: Duration,
    cache: Mutex<Option<CachedVerdict>>,
}

impl ConnectionHealthMonitor {
    pub fn new(
        health_url: impl Into<String>,
        probe_timeout: Duration,
        cache_window: Duration,
    ) -> Result<Self, TransportError> {
        let http_client = reqwest::Client::builder()
            .user_agent(crate::USER_AGENT)
            .timeout(probe_timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            health_url: health_url.into(),
            cache_window,
            cache: Mutex::new(None),
        })
    }

    async fn probe(&self) -> bool {
        match self.http_client.get(&self.health_url).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(url = %self.health_url, "Remote health probe succeeded");
                true
            }
            Ok(response) => {
                tracing::warn!(
                    url = %self.health_url,
                    status = response.status().as_u16(),
                    "Remote health probe returned non-success status"
                );
                false
            }
            Err(e) => {
                tracing::warn!(
                    url = %self.health_url,
                    timeout = e.is_timeout(),
                    error = %e,
                    "Remote health probe failed"
                );
                false
            }
        }
    }
}

#[async_trait]
impl HealthCheck for ConnectionHealthMonitor {
    async fn is_available(&self) -> bool {
        // Held across the probe so concurrent callers share one request
        let mut cache = self.cache.lock().await;

        if let Some(verdict) = *cache {
            if verdict.checked_at.elapsed() < self.cache_window {
                return verdict.available;
            }
        }

        let available = self.probe().await;
        *cache = Some(CachedVerdict {
            available,
            checked_at: Instant::now(),
        });
        available
    }

    async fn reset_cache(&self) {
        *self.cache.lock().await = None;
        tracing::info!(url = %self.health_url, "Remote health cache reset");
    }
}
