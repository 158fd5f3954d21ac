//! Test helper utilities
//!
//! Shared utilities for testing reglex-analysis
#![allow(dead_code)]

pub mod fake_remote;
pub mod log_capture;

pub use fake_remote::{analysis_payload, FakeRemote};
pub use log_capture::LogCapture;

use async_trait::async_trait;
use reglex_analysis::config::AnalysisSettings;
use reglex_analysis::models::{AnalysisSession, RawAnalysisPayload, SessionId, ValidatedDocument};
use reglex_analysis::services::{
    ConnectionHealthMonitor, DocumentTransport, HealthCheck, ProgressCallback, TransportError,
};
use reglex_analysis::{AnalysisRegistry, AnalysisServices};
use reglex_common::config::TomlConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Config pointing at `base_url` with millisecond-scale backoff
pub fn fast_settings(base_url: &str) -> AnalysisSettings {
    let mut config = TomlConfig::default();
    config.retry.base_delay_ms = 10;
    config.remote.probe_timeout_secs = 5;
    config.remote.upload_timeout_secs = 30;
    AnalysisSettings::from_config(&config, base_url).unwrap()
}

/// Registry wired to the fake remote over real HTTP
pub fn http_registry(remote: &FakeRemote) -> (AnalysisRegistry, Arc<ConnectionHealthMonitor>) {
    let (services, monitor) = fast_settings(&remote.base_url).build_services().unwrap();
    (AnalysisRegistry::new(services), monitor)
}

/// Poll until the session reaches a terminal status
pub async fn wait_for_terminal(registry: &AnalysisRegistry, id: SessionId) -> AnalysisSession {
    tokio::time::timeout(Duration::from_secs(20), async {
        loop {
            if let Some(session) = registry.get_session(id) {
                if session.is_terminal() {
                    return session;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("session did not reach a terminal state in time")
}

/// Minimal PDF header padded to `size` bytes
pub fn pdf_bytes(size: usize) -> Vec<u8> {
    let mut bytes = b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n".to_vec();
    bytes.resize(size.max(bytes.len()), b' ');
    bytes
}

/// Health check with a switchable verdict
pub struct StaticHealth(pub AtomicBool);

impl StaticHealth {
    pub fn new(available: bool) -> Arc<Self> {
        Arc::new(Self(AtomicBool::new(available)))
    }
}

#[async_trait]
impl HealthCheck for StaticHealth {
    async fn is_available(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    async fn reset_cache(&self) {}
}

/// Transport answering every upload with the same payload
pub struct CannedTransport(pub serde_json::Value);

#[async_trait]
impl DocumentTransport for CannedTransport {
    async fn upload(
        &self,
        _document: &ValidatedDocument,
        on_progress: ProgressCallback,
    ) -> Result<RawAnalysisPayload, TransportError> {
        on_progress(100);
        serde_json::from_value(self.0.clone()).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

/// Transport failing every upload with the same error
pub struct FailingTransport(pub TransportError);

#[async_trait]
impl DocumentTransport for FailingTransport {
    async fn upload(
        &self,
        _document: &ValidatedDocument,
        _on_progress: ProgressCallback,
    ) -> Result<RawAnalysisPayload, TransportError> {
        Err(self.0.clone())
    }
}

/// Registry with in-memory collaborators
pub fn stub_registry(available: bool) -> (AnalysisRegistry, Arc<StaticHealth>) {
    let health = StaticHealth::new(available);
    let services = AnalysisServices::new(
        health.clone(),
        Arc::new(CannedTransport(analysis_payload(8, 10))),
        fast_settings("http://127.0.0.1:8000").retry,
    );
    (AnalysisRegistry::new(services), health)
}
