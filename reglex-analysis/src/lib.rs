//! reglex-analysis library interface
//!
//! Document compliance analysis sessions: validation, resilient upload to the
//! remote analysis service, offline fallback, enrichment and live progress.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod registry;
pub mod services;
pub mod validation;

pub use crate::error::{ApiError, ApiResult};
pub use crate::registry::{AnalysisRegistry, AnalysisServices, Subscription};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::services::HealthCheck;

/// User-Agent sent on every remote request
pub const USER_AGENT: &str = concat!("reglex-analysis/", env!("CARGO_PKG_VERSION"));

/// Multipart framing allowance on top of the file size limit
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: AnalysisRegistry,
    /// Same monitor the executor consults
    pub health: Arc<dyn HealthCheck>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(registry: AnalysisRegistry, health: Arc<dyn HealthCheck>) -> Self {
        Self {
            registry,
            health,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = usize::try_from(state.registry.services().max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .merge(api::analysis_routes())
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
