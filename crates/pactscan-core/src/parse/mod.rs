//! Staged parser for model analysis output.
//!
//! The generator is asked for a single JSON object but may wrap it in code
//! fences or prose, emit unquoted keys or trailing commas, or truncate the
//! object mid-stream when it runs out of output budget. Parsing therefore
//! proceeds in stages, each applied only if the previous one did not yield a
//! valid parse:
//!
//! 1. Strip the envelope (fences and prose outside the outermost braces).
//! 2. Strict JSON parse.
//! 3. Bounded syntactic repair (quote bare keys, drop trailing commas), retry.
//! 4. Field-level salvage: extract each top-level field independently with
//!    bracket-depth-aware scanning.
//!
//! The entry point never fails: any input produces a usable
//! [`AnalysisOutcome`], with unlocatable fields at their baseline defaults
//! and the `degraded` flag set when a required section was missing.

mod repair;
mod salvage;

pub use repair::repair;

use serde_json::Value;

use crate::record::{AnalysisOutcome, CompensationTerms, Level, Opportunity, Risk};
use crate::tier::Tier;

pub const DEFAULT_RISK: &str = "Unknown risk";
pub const DEFAULT_OPPORTUNITY: &str = "Unknown opportunity";
pub const DEFAULT_EXPLANATION: &str = "No explanation provided";

/// Parse raw generator output into an analysis outcome. Never fails.
///
/// The outcome is normalised for `tier`: scores clamped to 0–100 and the
/// premium-only fields stripped from free-tier results.
pub fn parse_analysis(raw: &str, tier: Tier) -> AnalysisOutcome {
    let stripped = strip_envelope(raw);

    // Stage 2: strict parse.
    if let Ok(value) = serde_json::from_str::<Value>(stripped)
        && value.is_object()
    {
        return outcome_from_value(&value).normalise_for(tier);
    }

    // Stage 3: bounded syntactic repair, then retry the strict parse.
    let repaired = repair::repair(stripped);
    if let Ok(value) = serde_json::from_str::<Value>(&repaired)
        && value.is_object()
    {
        return outcome_from_value(&value).normalise_for(tier);
    }

    // Stage 4: field-level salvage. Always degraded.
    let mut outcome = salvage::salvage(&repaired);
    outcome.degraded = true;
    outcome.normalise_for(tier)
}

/// Drop code-fence markers and any prose outside the outermost braces.
///
/// When the text holds no closing brace (truncated output) everything from
/// the first `{` onward is kept for the later stages.
pub fn strip_envelope(raw: &str) -> &str {
    let s = raw.trim();
    match s.find('{') {
        Some(start) => match s.rfind('}') {
            Some(end) if end > start => &s[start..=end],
            _ => &s[start..],
        },
        None => s,
    }
}

// ── Value mapping (stages 2 and 3) ──

/// Map a parsed JSON object onto the outcome schema.
///
/// Undeclared keys are ignored; declared keys with the wrong shape fall back
/// to their baseline defaults. `degraded` is set when any of the required
/// sections (summary, risks, opportunities) is absent entirely.
fn outcome_from_value(value: &Value) -> AnalysisOutcome {
    let risks = value
        .get("risks")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| risk_from_value(item))
                .collect()
        })
        .unwrap_or_default();

    let opportunities = value
        .get("opportunities")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| opportunity_from_value(item))
                .collect()
        })
        .unwrap_or_default();

    let complete = value.get("summary").is_some()
        && value.get("risks").is_some()
        && value.get("opportunities").is_some();

    AnalysisOutcome {
        risks,
        opportunities,
        summary: string_field(value, &["summary"]),
        overall_score: score_from_value(value.get("overallScore")),
        recommendations: list_field(value, &["recommendations"]),
        key_clauses: list_field(value, &["keyClauses"]),
        legal_compliance: string_field(value, &["legalCompliance"]),
        negotiation_points: list_field(value, &["negotiationPoints"]),
        contract_duration: string_field(value, &["contractDuration"]),
        termination_conditions: string_field(value, &["terminationConditions"]),
        compensation: compensation_from_value(value),
        performance_metrics: list_field(value, &["performanceMetrics"]),
        specific_clauses: string_field(value, &["specificClauses"]),
        degraded: !complete,
    }
}

fn risk_from_value(item: &Value) -> Option<Risk> {
    let obj = item.as_object()?;
    Some(Risk {
        description: member_string(obj, &["risk", "description"])
            .unwrap_or_else(|| DEFAULT_RISK.to_string()),
        explanation: member_string(obj, &["explanation"])
            .unwrap_or_else(|| DEFAULT_EXPLANATION.to_string()),
        severity: member_string(obj, &["severity"]).and_then(|s| Level::parse(&s)),
    })
}

fn opportunity_from_value(item: &Value) -> Option<Opportunity> {
    let obj = item.as_object()?;
    Some(Opportunity {
        description: member_string(obj, &["opportunity", "description"])
            .unwrap_or_else(|| DEFAULT_OPPORTUNITY.to_string()),
        explanation: member_string(obj, &["explanation"])
            .unwrap_or_else(|| DEFAULT_EXPLANATION.to_string()),
        impact: member_string(obj, &["impact"]).and_then(|s| Level::parse(&s)),
    })
}

fn member_string(
    obj: &serde_json::Map<String, Value>,
    keys: &[&str],
) -> Option<String> {
    keys.iter()
        .find_map(|k| obj.get(*k))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn string_field(value: &Value, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|k| value.get(*k))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}

/// A string-array field. A bare string is accepted as a single-element list.
fn list_field(value: &Value, keys: &[&str]) -> Vec<String> {
    match keys.iter().find_map(|k| value.get(*k)) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Coerce a score to 0–100, accepting numbers and numeric strings.
/// Anything else yields the sentinel 0 ("no score recoverable").
fn score_from_value(value: Option<&Value>) -> u8 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .map(|f| f.clamp(0.0, 100.0).round() as u8)
        .unwrap_or(0)
}

fn compensation_from_value(value: &Value) -> CompensationTerms {
    let Some(obj) = ["compensationStructure", "compensationOrFinancialTerms"]
        .iter()
        .find_map(|k| value.get(*k))
        .and_then(Value::as_object)
    else {
        return CompensationTerms::default();
    };
    CompensationTerms {
        base_salary: member_string(obj, &["baseSalary"]).unwrap_or_default(),
        bonuses: member_string(obj, &["bonuses"]).unwrap_or_default(),
        equity: member_string(obj, &["equity"]).unwrap_or_default(),
        other_benefits: member_string(obj, &["otherBenefits"]).unwrap_or_default(),
    }
}
