//! Follow-up questions against a stored analysis.

use pactscan_core::AnalysisRecord;
use serde::Serialize;

/// One answered follow-up question.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatAnswer {
    pub answer: String,
    /// False when the model declared the question off-topic.
    pub is_contract_related: bool,
    /// True when the model deferred to professional counsel.
    pub requires_legal_advice: bool,
    /// Up to three follow-up questions the caller might ask next.
    pub follow_up_suggestions: Vec<String>,
}

/// Topics that earn a follow-up suggestion when the answer raises them and
/// the question did not. Matched in order; first terms double as question
/// suppressors.
const TOPIC_RULES: &[(&[&str], &str)] = &[
    (
        &["compensation", "salary"],
        "Can you explain more about the compensation structure?",
    ),
    (
        &["termination", "end of contract"],
        "What are the specific conditions for contract termination?",
    ),
    (
        &["intellectual property", "ip"],
        "Can you elaborate on the intellectual property clauses?",
    ),
    (&["benefits"], "What other benefits are included in the contract?"),
    (
        &["non-compete"],
        "Can you explain the non-compete clause in more detail?",
    ),
    (
        &["performance"],
        "Are there any performance-related clauses or metrics in the contract?",
    ),
];

const GENERIC_SUGGESTIONS: &[&str] = &[
    "What are the key points I should be aware of in this contract?",
    "Are there any unusual or potentially concerning clauses in this contract?",
    "How does this contract compare to industry standards?",
];

const MAX_SUGGESTIONS: usize = 3;

/// Derive structured signals and follow-up suggestions from a raw answer.
pub fn interpret_answer(answer: String, question: &str) -> ChatAnswer {
    let lower_answer = answer.to_lowercase();
    let is_contract_related = !lower_answer.contains("not related to the contract");
    let requires_legal_advice =
        lower_answer.contains("recommend consulting with a legal professional");
    let follow_up_suggestions = suggestions(&lower_answer, &question.to_lowercase());
    ChatAnswer {
        answer,
        is_contract_related,
        requires_legal_advice,
        follow_up_suggestions,
    }
}

fn suggestions(lower_answer: &str, lower_question: &str) -> Vec<String> {
    let mut picked = Vec::new();
    for (terms, suggestion) in TOPIC_RULES {
        let raised = terms.iter().any(|t| lower_answer.contains(t));
        let already_asked = terms.iter().any(|t| lower_question.contains(t));
        if raised && !already_asked {
            picked.push(suggestion.to_string());
        }
    }
    if picked.is_empty() {
        picked.extend(GENERIC_SUGGESTIONS.iter().map(|s| s.to_string()));
    }
    picked.truncate(MAX_SUGGESTIONS);
    picked
}

/// Bounded analysis context embedded in the chat prompt.
pub fn chat_context(record: &AnalysisRecord) -> String {
    let mut context = format!(
        "Contract type: {}\nLanguage: {}\nOverall score: {}\nSummary: {}",
        record.contract_type, record.language, record.outcome.overall_score, record.outcome.summary,
    );
    if !record.outcome.contract_duration.is_empty() {
        context.push_str("\nDuration: ");
        context.push_str(&record.outcome.contract_duration);
    }
    if !record.outcome.termination_conditions.is_empty() {
        context.push_str("\nTermination conditions: ");
        context.push_str(&record.outcome.termination_conditions);
    }
    if !record.outcome.key_clauses.is_empty() {
        context.push_str("\nKey clauses: ");
        context.push_str(&record.outcome.key_clauses.join("; "));
    }
    if !record.outcome.compensation.is_empty() {
        let c = &record.outcome.compensation;
        context.push_str(&format!(
            "\nCompensation: base {}, bonuses {}, equity {}, other {}",
            c.base_salary, c.bonuses, c.equity, c.other_benefits
        ));
    }
    if !record.outcome.risks.is_empty() {
        context.push_str("\nIdentified risks:");
        for risk in &record.outcome.risks {
            context.push_str("\n- ");
            context.push_str(&risk.description);
        }
    }
    if !record.outcome.opportunities.is_empty() {
        context.push_str("\nIdentified opportunities:");
        for opp in &record.outcome.opportunities {
            context.push_str("\n- ");
            context.push_str(&opp.description);
        }
    }
    context
}
