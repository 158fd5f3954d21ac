//! Analysis session state machine
//!
//! A session moves forward only:
//! UPLOADING → PROCESSING → ANALYZING → COMPLETED, with ERROR reachable from any
//! non-terminal state. Progress never decreases, except that ERROR forces it to 100.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::DocumentAnalysis;

/// Opaque session identifier
pub type SessionId = Uuid;

/// Session workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    /// Multipart upload in flight (including retries)
    Uploading,
    /// Remote payload (or fallback) obtained
    Processing,
    /// Enrichment into the canonical model
    Analyzing,
    /// Result available
    Completed,
    /// Fatal failure for this session
    Error,
}

impl AnalysisStatus {
    /// Position in the forward-only ordering
    fn rank(self) -> u8 {
        match self {
            AnalysisStatus::Uploading => 0,
            AnalysisStatus::Processing => 1,
            AnalysisStatus::Analyzing => 2,
            AnalysisStatus::Completed | AnalysisStatus::Error => 3,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, AnalysisStatus::Completed | AnalysisStatus::Error)
    }

    /// Whether `next` is a legal successor of `self`
    ///
    /// Staying in the same non-terminal status is legal (progress updates).
    pub fn can_transition_to(self, next: AnalysisStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == AnalysisStatus::Error || next.rank() >= self.rank()
    }

    /// Fixed human-readable stage label shown by the dashboard
    pub fn stage_label(self) -> &'static str {
        match self {
            AnalysisStatus::Uploading => "Uploading document",
            AnalysisStatus::Processing => "Processing document",
            AnalysisStatus::Analyzing => "Analyzing compliance",
            AnalysisStatus::Completed => "Analysis complete",
            AnalysisStatus::Error => "Analysis failed",
        }
    }
}

/// Snapshot of one document's analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSession {
    pub id: SessionId,
    pub file_name: String,
    pub file_size: u64,
    pub status: AnalysisStatus,
    /// 0-100
    pub progress: u8,
    pub current_stage: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<DocumentAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Incremented on every applied update
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AnalysisSession {
    /// Create new session at UPLOADING / 0%
    pub fn new(file_name: String, file_size: u64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            file_name,
            file_size,
            status: AnalysisStatus::Uploading,
            progress: 0,
            current_stage: AnalysisStatus::Uploading.stage_label().to_string(),
            result: None,
            error: None,
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Age measured from creation, independent of status
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.created_at)
    }

    /// Merge a partial update, enforcing the state-machine invariants
    pub fn apply(&mut self, update: SessionUpdate) -> Result<(), SessionError> {
        let next_status = update.status.unwrap_or(self.status);

        if self.is_terminal() {
            return Err(SessionError::Terminal {
                id: self.id,
                status: self.status,
            });
        }
        if !self.status.can_transition_to(next_status) {
            return Err(SessionError::IllegalTransition {
                id: self.id,
                from: self.status,
                to: next_status,
            });
        }
        if update.result.is_some() && next_status != AnalysisStatus::Completed {
            return Err(SessionError::InvalidUpdate(
                "result may only accompany the completed status".to_string(),
            ));
        }
        if update.error.is_some() && next_status != AnalysisStatus::Error {
            return Err(SessionError::InvalidUpdate(
                "error may only accompany the error status".to_string(),
            ));
        }
        if next_status == AnalysisStatus::Completed && update.result.is_none() {
            return Err(SessionError::InvalidUpdate(
                "completed status requires a result".to_string(),
            ));
        }

        match next_status {
            AnalysisStatus::Error => {
                self.progress = 100;
                self.error = Some(
                    update
                        .error
                        .unwrap_or_else(|| "Analysis failed".to_string()),
                );
            }
            AnalysisStatus::Completed => {
                self.progress = 100;
                self.result = update.result;
            }
            _ => {
                if let Some(progress) = update.progress {
                    self.progress = self.progress.max(progress.min(100));
                }
            }
        }

        self.status = next_status;
        self.current_stage = next_status.stage_label().to_string();
        self.revision += 1;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Partial session update; unset fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct SessionUpdate {
    pub status: Option<AnalysisStatus>,
    pub progress: Option<u8>,
    pub result: Option<DocumentAnalysis>,
    pub error: Option<String>,
}

impl SessionUpdate {
    pub fn progress(progress: u8) -> Self {
        Self {
            progress: Some(progress),
            ..Self::default()
        }
    }

    pub fn stage(status: AnalysisStatus, progress: u8) -> Self {
        Self {
            status: Some(status),
            progress: Some(progress),
            ..Self::default()
        }
    }

    pub fn completed(result: DocumentAnalysis) -> Self {
        Self {
            status: Some(AnalysisStatus::Completed),
            progress: Some(100),
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: Some(AnalysisStatus::Error),
            progress: Some(100),
            result: None,
            error: Some(message.into()),
        }
    }
}

/// Session table errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(SessionId),

    #[error("Session {id} is already {status:?}")]
    Terminal {
        id: SessionId,
        status: AnalysisStatus,
    },

    #[error("Illegal transition for session {id}: {from:?} -> {to:?}")]
    IllegalTransition {
        id: SessionId,
        from: AnalysisStatus,
        to: AnalysisStatus,
    },

    #[error("Invalid session update: {0}")]
    InvalidUpdate(String),
}
