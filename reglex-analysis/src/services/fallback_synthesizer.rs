//! Offline analysis payload generator
//!
//! Used when the remote service cannot be reached. Output has exactly the
//! shape of a real `POST /upload` response and is marked through the
//! `synthetic` field only; summary text is never altered to carry the flag.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use crate::models::{
    ComplianceResults, RawAnalysisPayload, RawClause, RawComplianceResult, RawRiskExplanation,
};

/// Clause count bounds (inclusive)
pub const MIN_SYNTHETIC_CLAUSES: usize = 4;
pub const MAX_SYNTHETIC_CLAUSES: usize = 8;

const COMPLIANT_RATIO: f64 = 0.7;

const CATEGORIES: [&str; 3] = ["Legal", "Financial", "Operational"];

const CLAUSE_TEMPLATES: [(&str, &str); 8] = [
    (
        "Confidentiality",
        "The parties shall keep all confidential information strictly confidential and shall not disclose it to any third party without prior written consent.",
    ),
    (
        "Payment Terms",
        "The client shall pay all invoices within thirty (30) days of receipt. Late payments accrue interest at the statutory rate.",
    ),
    (
        "Termination",
        "Either party may terminate this agreement with ninety (90) days written notice to the other party.",
    ),
    (
        "Data Protection",
        "Personal data shall be processed only for the purposes described herein and in accordance with applicable data protection law.",
    ),
    (
        "Liability",
        "Neither party shall be liable for indirect or consequential losses arising out of this agreement.",
    ),
    (
        "Governing Law",
        "This agreement shall be governed by and construed in accordance with the laws of the jurisdiction of the service provider.",
    ),
    (
        "Know Your Customer",
        "The customer shall provide identification documents sufficient to satisfy applicable customer due diligence requirements.",
    ),
    (
        "Service Levels",
        "The provider shall maintain system availability of not less than 99.5 percent measured monthly.",
    ),
];

/// Generates plausible synthetic payloads
#[derive(Debug, Clone, Default)]
pub struct FallbackSynthesizer {
    seed: Option<u64>,
}

impl FallbackSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic output for a fixed seed
    pub fn with_seed(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    pub fn synthesize(&self, file_name: &str) -> RawAnalysisPayload {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let clause_count = rng.gen_range(MIN_SYNTHETIC_CLAUSES..=MAX_SYNTHETIC_CLAUSES);
        let mut clauses = Vec::with_capacity(clause_count);
        let mut results = Vec::with_capacity(clause_count);

        for idx in 0..clause_count {
            let (title, text) = CLAUSE_TEMPLATES[idx % CLAUSE_TEMPLATES.len()];
            let clause_id = format!("C-{}", idx + 1);
            let category = CATEGORIES[rng.gen_range(0..CATEGORIES.len())];
            let is_compliant = rng.gen_bool(COMPLIANT_RATIO);
            let confidence = rng.gen_range(0.6..0.95);

            let (severity, final_reason, mitigation) = if is_compliant {
                (
                    "None",
                    format!("{} clause meets the applicable requirements", title),
                    None,
                )
            } else {
                (
                    pick_severity(&mut rng),
                    format!("{} clause does not satisfy the applicable requirements", title),
                    Some(format!(
                        "Revise the {} clause to address the identified gap",
                        title.to_lowercase()
                    )),
                )
            };

            clauses.push(RawClause {
                clause_id: Some(clause_id.clone()),
                text: Some(text.to_string()),
            });
            results.push(RawComplianceResult {
                clause_id: Some(clause_id),
                clause: Some(text.to_string()),
                is_compliant,
                final_reason: Some(final_reason),
                section: Some(title.to_string()),
                confidence: Some(confidence),
                risk: Some(RawRiskExplanation {
                    severity: Some(severity.to_string()),
                    category: Some(category.to_string()),
                    risk_score: Some(if is_compliant { 0.0 } else { rng.gen_range(0.3..1.0) }),
                    impact: None,
                    mitigation,
                }),
            });
        }

        let compliant = results.iter().filter(|r| r.is_compliant).count();
        tracing::debug!(
            file_name,
            clauses = clause_count,
            compliant,
            "Synthesized offline analysis payload"
        );

        RawAnalysisPayload {
            document_id: Some(format!("offline-{}", Uuid::new_v4())),
            summary: Some(format!(
                "Offline analysis of {}: {} clauses reviewed, {} compliant.",
                file_name, clause_count, compliant
            )),
            timelines: serde_json::Value::Object(Default::default()),
            clauses,
            compliance_results: ComplianceResults::List(results),
            synthetic: true,
        }
    }
}

/// High 25%, Medium 45%, Low 30%
fn pick_severity(rng: &mut StdRng) -> &'static str {
    let roll: f64 = rng.gen();
    if roll < 0.25 {
        "High"
    } else if roll < 0.70 {
        "Medium"
    } else {
        "Low"
    }
}
