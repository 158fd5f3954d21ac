//! Data models for reglex-analysis
//!
//! - Session state machine
//! - Raw remote payload
//! - Canonical document model
//! - Uploaded document input

pub mod document;
pub mod file;
pub mod payload;
pub mod session;

pub use document::{
    ActionItem, ActionPriority, ActionStatus, ClauseAnalysis, ComplianceArea, DocumentAnalysis,
    FindingSeverity, KeyFinding, Provenance, RiskLevel,
};
pub use file::{DocumentFile, DocumentKind, FileInfo, ValidatedDocument};
pub use payload::{
    ComplianceResults, GroupedComplianceResults, RawAnalysisPayload, RawClause,
    RawComplianceResult, RawRiskExplanation, Severity,
};
pub use session::{AnalysisSession, AnalysisStatus, SessionError, SessionId, SessionUpdate};
