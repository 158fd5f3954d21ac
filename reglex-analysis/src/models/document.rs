//! Canonical document model
//!
//! Output of the enrichment pipeline. The shape is identical whether the
//! source payload came from the remote service or from the fallback synthesizer;
//! only `provenance` tells them apart.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Overall document risk bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// ≥80 → low, ≥60 → medium, else high
    pub fn from_score(score: u8) -> Self {
        if score >= 80 {
            RiskLevel::Low
        } else if score >= 60 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}

/// Where the analyzed payload came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Real,
    Synthetic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingSeverity {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionPriority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Pending,
    InProgress,
    Done,
}

/// Per-category aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceArea {
    pub total: u32,
    pub compliant: u32,
    pub non_compliant: u32,
    /// Percentage compliant, 0-100
    pub score: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyFinding {
    pub severity: FindingSeverity,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    pub id: String,
    pub clause_id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: ActionPriority,
    pub status: ActionStatus,
    pub due_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClauseAnalysis {
    pub clause_id: String,
    pub clause_text: String,
    pub compliant: bool,
    /// 0.0-1.0
    pub confidence: f64,
    pub risk_level: RiskLevel,
    pub category: String,
    pub explanation: String,
    pub recommendations: Vec<String>,
}

/// Canonical result attached to a completed session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    pub file_name: String,
    pub file_size: u64,
    pub provenance: Provenance,
    pub overall_score: u8,
    pub risk_level: RiskLevel,
    pub total_clauses: u32,
    pub compliant_clauses: u32,
    pub non_compliant_clauses: u32,
    pub high_risk_clauses: u32,
    pub medium_risk_clauses: u32,
    pub low_risk_clauses: u32,
    pub compliance_areas: BTreeMap<String, ComplianceArea>,
    pub key_findings: Vec<KeyFinding>,
    pub action_items: Vec<ActionItem>,
    pub clause_analysis: Vec<ClauseAnalysis>,
    pub summary: String,
    pub timelines: serde_json::Value,
    pub analyzed_at: DateTime<Utc>,
}

impl DocumentAnalysis {
    pub fn is_synthetic(&self) -> bool {
        self.provenance == Provenance::Synthetic
    }
}
