//! Analysis session API handlers
//!
//! POST /analyses, GET /analyses/:id

use axum::{
    extract::{rejection::PathRejection, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{AnalysisSession, AnalysisStatus, DocumentFile},
    AppState,
};

/// POST /analyses response
#[derive(Debug, Serialize)]
pub struct StartAnalysisResponse {
    pub session_id: Uuid,
    pub status: AnalysisStatus,
    pub file_name: String,
}

/// POST /analyses
///
/// Multipart fields: `file` (required), `lang` or `language` (required).
/// Returns 202 Accepted with the session id; validation failures return 400
/// and create no session.
pub async fn start_analysis(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<StartAnalysisResponse>)> {
    let mut file: Option<DocumentFile> = None;
    let mut language = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("file") => {
                let name = field.file_name().map(str::to_string);
                let mime_type = field.content_type().map(str::to_string);
                let contents = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;
                file = Some(DocumentFile::new(name, mime_type, contents.to_vec()));
            }
            Some("lang") | Some("language") => {
                language = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read language: {}", e)))?;
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| ApiError::BadRequest("Missing 'file' field".to_string()))?;
    let session_id = state.registry.start_analysis(file, &language)?;

    let session = state
        .registry
        .get_session(session_id)
        .ok_or_else(|| ApiError::Internal(format!("Session {} vanished", session_id)))?;

    Ok((
        StatusCode::ACCEPTED,
        Json(StartAnalysisResponse {
            session_id,
            status: session.status,
            file_name: session.file_name,
        }),
    ))
}

/// GET /analyses/:id
pub async fn get_analysis(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<AnalysisSession>> {
    let Path(session_id) = path?;
    state
        .registry
        .get_session(session_id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Analysis session {}", session_id)))
}

/// Build analysis routes
pub fn analysis_routes() -> Router<AppState> {
    Router::new()
        .route("/analyses", post(start_analysis))
        .route("/analyses/:id", get(get_analysis))
        .route("/analyses/:id/events", get(super::sse::analysis_event_stream))
}
