//! Raw analysis payload as returned by `POST /upload`
//!
//! The fallback synthesizer produces this same type, so the enrichment
//! pipeline never branches on where a payload came from.

use serde::{Deserialize, Serialize};

/// Remote service response body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAnalysisPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    /// Passed through untouched
    #[serde(default)]
    pub timelines: serde_json::Value,
    #[serde(default)]
    pub clauses: Vec<RawClause>,
    #[serde(default)]
    pub compliance_results: ComplianceResults,
    /// Explicit fallback marker; real responses omit it
    #[serde(default)]
    pub synthetic: bool,
}

impl RawAnalysisPayload {
    /// Summary text, if any non-blank text is present
    pub fn summary_text(&self) -> Option<&str> {
        self.summary
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// One clause extracted from the document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawClause {
    #[serde(default, alias = "id")]
    pub clause_id: Option<String>,
    #[serde(default, alias = "text_en")]
    pub text: Option<String>,
}

/// Per-clause compliance verdicts, in either wire form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ComplianceResults {
    /// Flat list, one verdict per clause with its risk inline
    List(Vec<RawComplianceResult>),
    /// Verdicts and risk explanations as parallel lists
    Grouped(GroupedComplianceResults),
}

impl Default for ComplianceResults {
    fn default() -> Self {
        ComplianceResults::List(Vec::new())
    }
}

impl ComplianceResults {
    pub fn len(&self) -> usize {
        match self {
            ComplianceResults::List(results) => results.len(),
            ComplianceResults::Grouped(grouped) => grouped.verification_results.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten to one result per clause, attaching index-aligned risk
    /// explanations from the grouped form
    pub fn normalized(&self) -> Vec<RawComplianceResult> {
        match self {
            ComplianceResults::List(results) => results.clone(),
            ComplianceResults::Grouped(grouped) => grouped
                .verification_results
                .iter()
                .enumerate()
                .map(|(idx, result)| {
                    let mut result = result.clone();
                    if result.risk.is_none() {
                        result.risk = grouped.risk_explanations.get(idx).cloned().flatten();
                    }
                    result
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupedComplianceResults {
    #[serde(default)]
    pub verification_results: Vec<RawComplianceResult>,
    #[serde(default)]
    pub risk_explanations: Vec<Option<RawRiskExplanation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliance_stats: Option<serde_json::Value>,
}

/// Verdict for one clause
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawComplianceResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clause_id: Option<String>,
    /// Clause text as echoed by the verifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clause: Option<String>,
    #[serde(default)]
    pub is_compliant: bool,
    #[serde(default, alias = "reason", skip_serializing_if = "Option::is_none")]
    pub final_reason: Option<String>,
    /// Regulatory area named by the verifier
    #[serde(default, alias = "Section", skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<RawRiskExplanation>,
}

/// Risk assessment attached to a verdict
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRiskExplanation {
    /// `High`, `Medium`, `Low` or `None`
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub risk_score: Option<f64>,
    #[serde(default)]
    pub impact: Option<String>,
    #[serde(default)]
    pub mitigation: Option<String>,
}

/// Parsed clause severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    None,
    Low,
    Medium,
    High,
}

impl RawRiskExplanation {
    pub fn severity(&self) -> Severity {
        match self
            .severity
            .as_deref()
            .map(|s| s.trim().to_ascii_lowercase())
            .as_deref()
        {
            Some("high") | Some("critical") => Severity::High,
            Some("medium") | Some("moderate") => Severity::Medium,
            Some("low") => Severity::Low,
            _ => Severity::None,
        }
    }
}

impl RawComplianceResult {
    pub fn severity(&self) -> Severity {
        self.risk
            .as_ref()
            .map(RawRiskExplanation::severity)
            .unwrap_or(Severity::None)
    }
}
