//! Vertical card display for analysis records.

use pactscan_core::{AnalysisRecord, Level, Opportunity, Risk};
use pactscan_engine::ChatAnswer;

const MAX_LIST_ITEMS: usize = 10;

// ── Public API ──

/// Print one stored analysis as a grouped, human-readable card.
pub fn print_analysis_card(record: &AnalysisRecord) {
    println!("=== {} ({}) ===", record.contract_type, record.language);
    println!();

    println!("Identity");
    println!("  {:<26} {}", "id", record.id);
    println!("  {:<26} {}", "tier", record.tier.as_str());
    println!("  {:<26} {}", "created_at", record.created_at.format("%Y-%m-%d %H:%M UTC"));
    if let Some(expiry) = record.expiration_date {
        println!("  {:<26} {}", "expiration_date", expiry.format("%Y-%m-%d"));
    }
    if let Some(project) = &record.project_id {
        println!("  {:<26} {}", "project", project);
    }
    println!();

    println!("Assessment");
    println!("  {:<26} {}/100", "overall_score", record.outcome.overall_score);
    if record.outcome.degraded {
        println!("  {:<26} yes (the response was partially recovered)", "degraded");
    }
    if !record.outcome.summary.is_empty() {
        println!("  {:<26} {}", "summary", record.outcome.summary);
    }
    println!();

    print_risks(&record.outcome.risks);
    print_opportunities(&record.outcome.opportunities);
    print_string_list("Recommendations", &record.outcome.recommendations);
    print_string_list("Key Clauses", &record.outcome.key_clauses);

    if !record.outcome.legal_compliance.is_empty()
        || !record.outcome.contract_duration.is_empty()
        || !record.outcome.termination_conditions.is_empty()
    {
        println!("Terms");
        print_field("legal_compliance", &record.outcome.legal_compliance);
        print_field("contract_duration", &record.outcome.contract_duration);
        print_field("termination_conditions", &record.outcome.termination_conditions);
        println!();
    }

    print_string_list("Negotiation Points", &record.outcome.negotiation_points);

    if !record.outcome.compensation.is_empty() {
        println!("Compensation");
        print_field("base_salary", &record.outcome.compensation.base_salary);
        print_field("bonuses", &record.outcome.compensation.bonuses);
        print_field("equity", &record.outcome.compensation.equity);
        print_field("other_benefits", &record.outcome.compensation.other_benefits);
        println!();
    }

    print_string_list("Performance Metrics", &record.outcome.performance_metrics);
    if !record.outcome.specific_clauses.is_empty() {
        println!("Other Clauses");
        println!("  {}", record.outcome.specific_clauses);
        println!();
    }

    if let Some(feedback) = &record.feedback {
        println!("Feedback");
        println!("  {:<26} {}/5", "rating", feedback.rating);
        print_field("comments", &feedback.comments);
        println!();
    }
}

/// Print one answered follow-up question.
pub fn print_chat_answer(question: &str, answer: &ChatAnswer) {
    println!("Q: {question}");
    println!("A: {}", answer.answer);
    if !answer.is_contract_related {
        println!("   (the question was not related to the contract)");
    }
    if answer.requires_legal_advice {
        println!("   (consider consulting a legal professional)");
    }
    if !answer.follow_up_suggestions.is_empty() {
        println!("   You could ask next:");
        for suggestion in &answer.follow_up_suggestions {
            println!("   - {suggestion}");
        }
    }
    println!();
}

// ── Section rendering ──

fn print_risks(risks: &[Risk]) {
    if risks.is_empty() {
        return;
    }
    println!("Risks ({}):", risks.len());
    for risk in risks.iter().take(MAX_LIST_ITEMS) {
        match risk.severity {
            Some(level) => println!("  [{}] {}", level_tag(level), risk.description),
            None => println!("  - {}", risk.description),
        }
        if !risk.explanation.is_empty() {
            println!("      {}", risk.explanation);
        }
    }
    if risks.len() > MAX_LIST_ITEMS {
        println!("  ... and {} more", risks.len() - MAX_LIST_ITEMS);
    }
    println!();
}

fn print_opportunities(opportunities: &[Opportunity]) {
    if opportunities.is_empty() {
        return;
    }
    println!("Opportunities ({}):", opportunities.len());
    for opp in opportunities.iter().take(MAX_LIST_ITEMS) {
        match opp.impact {
            Some(level) => println!("  [{}] {}", level_tag(level), opp.description),
            None => println!("  - {}", opp.description),
        }
        if !opp.explanation.is_empty() {
            println!("      {}", opp.explanation);
        }
    }
    if opportunities.len() > MAX_LIST_ITEMS {
        println!("  ... and {} more", opportunities.len() - MAX_LIST_ITEMS);
    }
    println!();
}

fn print_string_list(header: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("{header}");
    for item in items.iter().take(MAX_LIST_ITEMS) {
        println!("  - {item}");
    }
    if items.len() > MAX_LIST_ITEMS {
        println!("  ... and {} more", items.len() - MAX_LIST_ITEMS);
    }
    println!();
}

// ── Helpers ──

fn print_field(name: &str, value: &str) {
    if !value.is_empty() {
        println!("  {:<26} {}", name, value);
    }
}

fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Low => "low",
        Level::Medium => "med",
        Level::High => "HIGH",
    }
}
