//! Raw payload to canonical document model
//!
//! Pure transformation: the same payload, file info and timestamp always
//! produce the same model. Real and synthetic payloads take the same path.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::models::{
    ActionItem, ActionPriority, ActionStatus, ClauseAnalysis, ComplianceArea, DocumentAnalysis,
    FileInfo, FindingSeverity, KeyFinding, Provenance, RawAnalysisPayload, RawClause,
    RawComplianceResult, RiskLevel, Severity,
};

/// Confidence used when the verifier reports none
pub const DEFAULT_CONFIDENCE: f64 = 0.85;

/// Days from analysis until an action item falls due
pub const ACTION_DUE_DAYS: i64 = 7;

/// Category used when a verdict names neither a risk category nor a section
pub const DEFAULT_CATEGORY: &str = "General";

/// Payload cannot be reconciled into a document model
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnrichmentError {
    #[error("Analysis payload contains no clauses, no compliance results and no summary")]
    EmptyPayload,
}

/// Stateless enrichment stage
#[derive(Debug, Clone, Default)]
pub struct EnrichmentPipeline;

impl EnrichmentPipeline {
    pub fn new() -> Self {
        Self
    }

    pub fn enrich(
        &self,
        payload: &RawAnalysisPayload,
        file: &FileInfo,
        now: DateTime<Utc>,
    ) -> Result<DocumentAnalysis, EnrichmentError> {
        let results = payload.compliance_results.normalized();

        if payload.clauses.is_empty() && results.is_empty() && payload.summary_text().is_none() {
            return Err(EnrichmentError::EmptyPayload);
        }

        let total = payload.clauses.len().max(results.len()).max(1) as u32;
        let compliant = results.iter().filter(|r| r.is_compliant).count() as u32;
        let non_compliant = total - compliant;
        let overall_score = percentage(compliant, total);

        let mut high = 0u32;
        let mut medium = 0u32;
        let mut low = 0u32;
        for result in results.iter().filter(|r| !r.is_compliant) {
            match result.severity() {
                Severity::High => high += 1,
                Severity::Medium => medium += 1,
                Severity::Low => low += 1,
                Severity::None => {}
            }
        }

        let clause_analysis: Vec<ClauseAnalysis> = results
            .iter()
            .enumerate()
            .map(|(idx, result)| clause_entry(idx, result, &payload.clauses))
            .collect();

        let action_items = action_items(&results, &payload.clauses, now);
        let key_findings = key_findings(overall_score, compliant, total, high);

        let analysis = DocumentAnalysis {
            file_name: file.name.clone(),
            file_size: file.size,
            provenance: if payload.synthetic {
                Provenance::Synthetic
            } else {
                Provenance::Real
            },
            overall_score,
            risk_level: RiskLevel::from_score(overall_score),
            total_clauses: total,
            compliant_clauses: compliant,
            non_compliant_clauses: non_compliant,
            high_risk_clauses: high,
            medium_risk_clauses: medium,
            low_risk_clauses: low,
            compliance_areas: compliance_areas(&results),
            key_findings,
            action_items,
            clause_analysis,
            summary: payload.summary_text().unwrap_or_default().to_string(),
            timelines: if payload.timelines.is_null() {
                serde_json::Value::Object(Default::default())
            } else {
                payload.timelines.clone()
            },
            analyzed_at: now,
        };

        tracing::debug!(
            file_name = %analysis.file_name,
            score = analysis.overall_score,
            total = analysis.total_clauses,
            high_risk = analysis.high_risk_clauses,
            synthetic = analysis.is_synthetic(),
            "Enriched analysis payload"
        );

        Ok(analysis)
    }
}

fn percentage(part: u32, whole: u32) -> u8 {
    if whole == 0 {
        return 0;
    }
    (100.0 * part as f64 / whole as f64).round().clamp(0.0, 100.0) as u8
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Risk category, then verifier section, then [`DEFAULT_CATEGORY`]
fn category_of(result: &RawComplianceResult) -> String {
    let risk_category = non_blank(result.risk.as_ref().and_then(|r| r.category.as_deref()))
        .filter(|c| !c.eq_ignore_ascii_case("none"));

    risk_category
        .or_else(|| non_blank(result.section.as_deref()))
        .unwrap_or(DEFAULT_CATEGORY)
        .to_string()
}

fn clause_id_of(idx: usize, result: &RawComplianceResult, clauses: &[RawClause]) -> String {
    non_blank(result.clause_id.as_deref())
        .or_else(|| clauses.get(idx).and_then(|c| non_blank(c.clause_id.as_deref())))
        .map(str::to_string)
        .unwrap_or_else(|| format!("C-{}", idx + 1))
}

/// Echoed text, then the clause with a matching id, then the clause at the same position
fn clause_text_of(idx: usize, result: &RawComplianceResult, clauses: &[RawClause]) -> String {
    if let Some(text) = non_blank(result.clause.as_deref()) {
        return text.to_string();
    }

    let by_id = result.clause_id.as_deref().and_then(|id| {
        clauses
            .iter()
            .find(|c| c.clause_id.as_deref() == Some(id))
    });

    by_id
        .or_else(|| clauses.get(idx))
        .and_then(|c| non_blank(c.text.as_deref()))
        .unwrap_or_default()
        .to_string()
}

fn severity_risk_level(severity: Severity) -> RiskLevel {
    match severity {
        Severity::High => RiskLevel::High,
        Severity::Medium => RiskLevel::Medium,
        Severity::Low | Severity::None => RiskLevel::Low,
    }
}

fn clause_entry(idx: usize, result: &RawComplianceResult, clauses: &[RawClause]) -> ClauseAnalysis {
    let risk = result.risk.as_ref();
    let explanation = non_blank(result.final_reason.as_deref())
        .or_else(|| non_blank(risk.and_then(|r| r.impact.as_deref())))
        .map(str::to_string)
        .unwrap_or_else(|| {
            if result.is_compliant {
                "Clause meets the applicable requirements".to_string()
            } else {
                "Clause does not meet the applicable requirements".to_string()
            }
        });

    ClauseAnalysis {
        clause_id: clause_id_of(idx, result, clauses),
        clause_text: clause_text_of(idx, result, clauses),
        compliant: result.is_compliant,
        confidence: result
            .confidence
            .filter(|c| c.is_finite())
            .map(|c| c.clamp(0.0, 1.0))
            .unwrap_or(DEFAULT_CONFIDENCE),
        risk_level: severity_risk_level(result.severity()),
        category: category_of(result),
        explanation,
        recommendations: non_blank(risk.and_then(|r| r.mitigation.as_deref()))
            .map(|m| vec![m.to_string()])
            .unwrap_or_default(),
    }
}

fn compliance_areas(results: &[RawComplianceResult]) -> BTreeMap<String, ComplianceArea> {
    let mut areas: BTreeMap<String, ComplianceArea> = BTreeMap::new();

    for result in results {
        let area = areas.entry(category_of(result)).or_insert(ComplianceArea {
            total: 0,
            compliant: 0,
            non_compliant: 0,
            score: 0,
        });
        area.total += 1;
        if result.is_compliant {
            area.compliant += 1;
        } else {
            area.non_compliant += 1;
        }
    }

    for area in areas.values_mut() {
        area.score = percentage(area.compliant, area.total);
    }
    areas
}

/// Score-band finding first, then the high-risk finding when any exist
fn key_findings(score: u8, compliant: u32, total: u32, high: u32) -> Vec<KeyFinding> {
    let mut findings = Vec::with_capacity(2);

    let (severity, title) = if score >= 80 {
        (FindingSeverity::Success, "Strong compliance posture")
    } else if score >= 60 {
        (FindingSeverity::Warning, "Moderate compliance gaps")
    } else {
        (FindingSeverity::Error, "Significant compliance gaps")
    };
    findings.push(KeyFinding {
        severity,
        title: title.to_string(),
        description: format!(
            "{} of {} clauses are compliant ({}%).",
            compliant, total, score
        ),
    });

    if high > 0 {
        findings.push(KeyFinding {
            severity: FindingSeverity::Error,
            title: "High-risk clauses detected".to_string(),
            description: format!(
                "{} clause{} carry high regulatory risk and need immediate review.",
                high,
                if high == 1 { "" } else { "s" }
            ),
        });
    }

    findings
}

fn action_items(
    results: &[RawComplianceResult],
    clauses: &[RawClause],
    now: DateTime<Utc>,
) -> Vec<ActionItem> {
    let due_date = now + Duration::days(ACTION_DUE_DAYS);

    results
        .iter()
        .enumerate()
        .filter(|(_, result)| !result.is_compliant)
        .enumerate()
        .map(|(n, (idx, result))| {
            let clause_id = clause_id_of(idx, result, clauses);
            let category = category_of(result);
            let risk = result.risk.as_ref();
            let description = non_blank(risk.and_then(|r| r.mitigation.as_deref()))
                .or_else(|| non_blank(result.final_reason.as_deref()))
                .unwrap_or("Review the clause against the applicable requirements")
                .to_string();

            ActionItem {
                id: format!("AI-{}", n + 1),
                title: format!("Remediate {} clause {}", category, clause_id),
                clause_id,
                description,
                category,
                priority: match result.severity() {
                    Severity::High => ActionPriority::High,
                    Severity::Medium => ActionPriority::Medium,
                    Severity::Low | Severity::None => ActionPriority::Low,
                },
                status: ActionStatus::Pending,
                due_date,
            }
        })
        .collect()
}
