//! Analysis record model shared across the store, engine, and CLI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tier::Tier;

/// Severity of a risk or impact of an opportunity. Premium-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    /// Parse a level from model output, tolerating case and surrounding noise.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// A single identified risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Risk {
    pub description: String,
    pub explanation: String,
    /// Severity level. Always `None` on free-tier records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Level>,
}

/// A single identified opportunity or benefit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub description: String,
    pub explanation: String,
    /// Impact level. Always `None` on free-tier records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<Level>,
}

/// Breakdown of the compensation or financial terms. Premium-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompensationTerms {
    #[serde(default)]
    pub base_salary: String,
    #[serde(default)]
    pub bonuses: String,
    #[serde(default)]
    pub equity: String,
    #[serde(default)]
    pub other_benefits: String,
}

impl CompensationTerms {
    pub fn is_empty(&self) -> bool {
        self.base_salary.is_empty()
            && self.bonuses.is_empty()
            && self.equity.is_empty()
            && self.other_benefits.is_empty()
    }
}

/// Owner feedback attached to a stored record after the fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub rating: u8,
    pub comments: String,
}

/// The parser's output: one analysed contract, sans persistence metadata.
///
/// Invariants: `risks` and `opportunities` are never null (empty on total
/// failure); `overall_score` is within 0–100, with 0 as the sentinel for
/// "no score recoverable".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub risks: Vec<Risk>,
    pub opportunities: Vec<Opportunity>,
    pub summary: String,
    pub overall_score: u8,
    pub recommendations: Vec<String>,
    pub key_clauses: Vec<String>,
    pub legal_compliance: String,
    pub negotiation_points: Vec<String>,
    pub contract_duration: String,
    pub termination_conditions: String,
    pub compensation: CompensationTerms,
    pub performance_metrics: Vec<String>,
    pub specific_clauses: String,
    /// Set when parsing fell back to partial salvage or the response was
    /// missing a required section. Not an error: the record is still served.
    #[serde(default)]
    pub degraded: bool,
}

impl AnalysisOutcome {
    /// Enforce tier invariants on a freshly parsed outcome: clamp the score
    /// and strip levels plus the extended field set from free-tier results.
    pub fn normalise_for(mut self, tier: Tier) -> Self {
        self.overall_score = self.overall_score.min(100);
        if !tier.supports_levels() {
            for risk in &mut self.risks {
                risk.severity = None;
            }
            for opp in &mut self.opportunities {
                opp.impact = None;
            }
            self.key_clauses.clear();
            self.legal_compliance.clear();
            self.negotiation_points.clear();
            self.contract_duration.clear();
            self.termination_conditions.clear();
            self.compensation = CompensationTerms::default();
            self.performance_metrics.clear();
            self.specific_clauses.clear();
        }
        self
    }
}

/// A durable, owned contract analysis.
///
/// Created once by the orchestrator after generation and parsing; mutated
/// only by feedback attachment. `contract_text` is immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub owner_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub contract_text: String,
    pub contract_type: String,
    /// ISO-639-1 code of the detected source language.
    pub language: String,
    pub tier: Tier,
    #[serde(flatten)]
    pub outcome: AnalysisOutcome,
    /// Derived from `contract_duration` at creation time. Premium-only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
    pub created_at: DateTime<Utc>,
}

/// A transient analysis request, created per upload.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub owner_id: String,
    pub project_id: Option<String>,
    pub document_text: String,
    pub tier: Tier,
    pub contract_type: String,
    pub language_hint: Option<String>,
}
