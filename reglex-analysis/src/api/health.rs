//! Health check endpoints

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "ok" while this process serves requests
    pub status: String,
    pub module: String,
    pub version: String,
    pub uptime_seconds: u64,
    /// Cached remote reachability verdict (may probe)
    pub remote_available: bool,
    pub active_sessions: usize,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);

    Json(HealthResponse {
        status: "ok".to_string(),
        module: "reglex-analysis".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime.num_seconds().max(0) as u64,
        remote_available: state.health.is_available().await,
        active_sessions: state.registry.session_count(),
    })
}

/// POST /remote/health/reset
///
/// Forget the cached verdict, e.g. after the remote service restarted.
pub async fn reset_remote_health(State(state): State<AppState>) -> StatusCode {
    state.health.reset_cache().await;
    StatusCode::NO_CONTENT
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/remote/health/reset", post(reset_remote_health))
}
