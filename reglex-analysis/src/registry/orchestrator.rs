//! Background task driving one session to a terminal state
//!
//! **Stages:**
//! 1. UPLOADING (0-40%): upload through the retrying executor
//! 2. PROCESSING (50%): payload obtained, remote or offline
//! 3. ANALYZING (75%): enrichment into the canonical model
//! 4. COMPLETED (100%) or ERROR
//!
//! Connectivity failures switch to the offline synthesizer; rejected uploads
//! and unusable payloads end the session in ERROR. Nothing escapes the task.

use chrono::Utc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use super::AnalysisRegistry;
use crate::models::{AnalysisStatus, SessionId, SessionUpdate, ValidatedDocument};
use crate::services::ProgressCallback;

/// Share of overall progress covered by the upload stage
const UPLOAD_PROGRESS_SPAN: u16 = 40;
const PROCESSING_PROGRESS: u8 = 50;
const ANALYZING_PROGRESS: u8 = 75;

pub(super) async fn run_analysis(
    registry: AnalysisRegistry,
    session_id: SessionId,
    document: ValidatedDocument,
) {
    let services = registry.services().clone();
    let start_time = Instant::now();

    info!(
        session_id = %session_id,
        file_name = %document.file_name,
        "Starting document analysis"
    );

    let on_progress = upload_progress(registry.clone(), session_id);
    let upload = services
        .executor
        .run("document upload", || {
            let transport = services.transport.clone();
            let document = document.clone();
            let on_progress = on_progress.clone();
            async move { transport.upload(&document, on_progress).await }
        })
        .await;

    let payload = match upload {
        Ok(payload) => payload,
        Err(e) if e.is_connectivity() => {
            warn!(
                session_id = %session_id,
                error = %e,
                "Remote analysis unavailable, falling back to offline analysis"
            );
            services.synthesizer.synthesize(&document.file_name)
        }
        Err(e) => {
            fail(&registry, session_id, format!("Document upload failed: {}", e));
            return;
        }
    };

    if !advance(
        &registry,
        session_id,
        SessionUpdate::stage(AnalysisStatus::Processing, PROCESSING_PROGRESS),
    ) {
        return;
    }
    if !advance(
        &registry,
        session_id,
        SessionUpdate::stage(AnalysisStatus::Analyzing, ANALYZING_PROGRESS),
    ) {
        return;
    }

    match services
        .enrichment
        .enrich(&payload, &document.info(), Utc::now())
    {
        Ok(analysis) => {
            let score = analysis.overall_score;
            let synthetic = analysis.is_synthetic();
            if advance(&registry, session_id, SessionUpdate::completed(analysis)) {
                info!(
                    session_id = %session_id,
                    score,
                    synthetic,
                    elapsed_ms = start_time.elapsed().as_millis() as u64,
                    "Document analysis completed"
                );
            }
        }
        Err(e) => fail(&registry, session_id, format!("Analysis data error: {}", e)),
    }
}

/// Map upload percentage into the UPLOADING span, skipping unchanged values
fn upload_progress(registry: AnalysisRegistry, session_id: SessionId) -> ProgressCallback {
    let last = Arc::new(AtomicU8::new(0));
    Arc::new(move |percent: u8| {
        let mapped = (u16::from(percent.min(100)) * UPLOAD_PROGRESS_SPAN / 100) as u8;
        if last.fetch_max(mapped, Ordering::Relaxed) >= mapped {
            return;
        }
        // Late chunks after the stage moved on are harmless
        let _ = registry.update_session(session_id, SessionUpdate::progress(mapped));
    })
}

fn advance(registry: &AnalysisRegistry, session_id: SessionId, update: SessionUpdate) -> bool {
    match registry.update_session(session_id, update) {
        Ok(_) => true,
        Err(e) => {
            warn!(session_id = %session_id, error = %e, "Session update rejected, stopping analysis");
            false
        }
    }
}

fn fail(registry: &AnalysisRegistry, session_id: SessionId, message: String) {
    error!(session_id = %session_id, error = %message, "Document analysis failed");
    if let Err(e) = registry.update_session(session_id, SessionUpdate::failed(message)) {
        warn!(session_id = %session_id, error = %e, "Could not record analysis failure");
    }
}
