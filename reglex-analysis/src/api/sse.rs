//! Server-Sent Events for live session progress
//!
//! Each event is a full session snapshot (`event: session`). The stream ends
//! after a terminal snapshot has been sent.

use axum::{
    extract::{rejection::PathRejection, Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::AnalysisSession;
use crate::AppState;

/// GET /analyses/:id/events
pub async fn analysis_event_stream(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let Path(session_id) = path?;
    let (tx, mut rx) = mpsc::unbounded_channel::<AnalysisSession>();

    // Replays the current snapshot into the channel before returning
    let subscription = state
        .registry
        .subscribe(session_id, move |snapshot| {
            let _ = tx.send(snapshot.clone());
        })
        .ok_or_else(|| ApiError::NotFound(format!("Analysis session {}", session_id)))?;

    info!(session_id = %session_id, "SSE client connected to analysis events");

    let stream = async_stream::stream! {
        // Dropped with the stream, which unsubscribes
        let _subscription = subscription;

        while let Some(snapshot) = rx.recv().await {
            let terminal = snapshot.is_terminal();
            match serde_json::to_string(&snapshot) {
                Ok(json) => {
                    debug!(
                        session_id = %session_id,
                        status = ?snapshot.status,
                        progress = snapshot.progress,
                        "SSE: Sending session snapshot"
                    );
                    yield Ok(Event::default().event("session").data(json));
                }
                Err(e) => {
                    warn!(session_id = %session_id, "SSE: Failed to serialize snapshot: {}", e);
                }
            }
            if terminal {
                break;
            }
        }

        info!(session_id = %session_id, "SSE: Analysis event stream closed");
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    ))
}
