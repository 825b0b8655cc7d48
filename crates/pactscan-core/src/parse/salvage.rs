//! Field-level salvage for truncated or unrepairable output.
//!
//! Extracts each top-level field independently with bounded, bracket-depth-
//! aware scans. Splitting the risks/opportunities arrays on a literal `},`
//! would break the moment a string value contains that sequence, so item
//! boundaries are found by tracking nesting depth with string-literal state
//! instead. A truncated final item is kept when it yielded at least one
//! usable member.

use crate::record::{AnalysisOutcome, CompensationTerms, Level, Opportunity, Risk};

use super::{DEFAULT_EXPLANATION, DEFAULT_OPPORTUNITY, DEFAULT_RISK};

/// Best-effort extraction of every top-level field. Fields that cannot be
/// located default to their baseline values; the caller sets `degraded`.
pub(crate) fn salvage(text: &str) -> AnalysisOutcome {
    AnalysisOutcome {
        risks: findings(text, "risks", &["risk", "description"])
            .into_iter()
            .map(|f| Risk {
                description: f.description.unwrap_or_else(|| DEFAULT_RISK.to_string()),
                explanation: f
                    .explanation
                    .unwrap_or_else(|| DEFAULT_EXPLANATION.to_string()),
                severity: f.level,
            })
            .collect(),
        opportunities: findings(text, "opportunities", &["opportunity", "description"])
            .into_iter()
            .map(|f| Opportunity {
                description: f
                    .description
                    .unwrap_or_else(|| DEFAULT_OPPORTUNITY.to_string()),
                explanation: f
                    .explanation
                    .unwrap_or_else(|| DEFAULT_EXPLANATION.to_string()),
                impact: f.level,
            })
            .collect(),
        summary: string_field(text, "summary"),
        overall_score: score_field(text),
        recommendations: list_field(text, "recommendations"),
        key_clauses: list_field(text, "keyClauses"),
        legal_compliance: string_field(text, "legalCompliance"),
        negotiation_points: list_field(text, "negotiationPoints"),
        contract_duration: string_field(text, "contractDuration"),
        termination_conditions: string_field(text, "terminationConditions"),
        compensation: compensation_field(text),
        performance_metrics: list_field(text, "performanceMetrics"),
        specific_clauses: string_field(text, "specificClauses"),
        degraded: true,
    }
}

struct RawFinding {
    description: Option<String>,
    explanation: Option<String>,
    level: Option<Level>,
}

/// Locate the named array and extract one finding per object item.
fn findings(text: &str, key: &str, description_keys: &[&str]) -> Vec<RawFinding> {
    let Some(pos) = find_key(text, key) else {
        return Vec::new();
    };
    let Some(span) = array_span(text, pos) else {
        return Vec::new();
    };
    let inner = span.strip_prefix('[').unwrap_or(span);
    let inner = inner.strip_suffix(']').unwrap_or(inner);

    split_objects(inner)
        .into_iter()
        .filter_map(|item| {
            let description = description_keys
                .iter()
                .find_map(|k| find_key(item, k).and_then(|p| string_at(item, p)));
            let explanation =
                find_key(item, "explanation").and_then(|p| string_at(item, p));
            let level = ["severity", "impact"]
                .iter()
                .find_map(|k| find_key(item, k).and_then(|p| string_at(item, p)))
                .and_then(|s| Level::parse(&s));
            // A dangling `{"ri` fragment has nothing usable: skip it rather
            // than emit an all-default finding.
            if description.is_none() && explanation.is_none() {
                return None;
            }
            Some(RawFinding {
                description,
                explanation,
                level,
            })
        })
        .collect()
}

fn string_field(text: &str, key: &str) -> String {
    find_key(text, key)
        .and_then(|pos| string_at(text, pos))
        .unwrap_or_default()
}

fn score_field(text: &str) -> u8 {
    find_key(text, "overallScore")
        .and_then(|pos| number_at(text, pos))
        .map(|f| f.clamp(0.0, 100.0).round() as u8)
        .unwrap_or(0)
}

fn list_field(text: &str, key: &str) -> Vec<String> {
    let Some(pos) = find_key(text, key) else {
        return Vec::new();
    };
    let Some(span) = array_span(text, pos) else {
        return Vec::new();
    };
    let inner = span.strip_prefix('[').unwrap_or(span);
    let inner = inner.strip_suffix(']').unwrap_or(inner);
    top_level_strings(inner)
}

fn compensation_field(text: &str) -> CompensationTerms {
    let span = ["compensationStructure", "compensationOrFinancialTerms"]
        .iter()
        .find_map(|k| find_key(text, k).and_then(|pos| object_span(text, pos)));
    let Some(span) = span else {
        return CompensationTerms::default();
    };
    CompensationTerms {
        base_salary: string_field(span, "baseSalary"),
        bonuses: string_field(span, "bonuses"),
        equity: string_field(span, "equity"),
        other_benefits: string_field(span, "otherBenefits"),
    }
}

// ── Scanning primitives ──

/// Byte offset just past the colon of a `"key":` (or bare `key:`) member.
fn find_key(text: &str, key: &str) -> Option<usize> {
    let quoted = format!("\"{key}\"");
    let mut search = 0;
    while let Some(rel) = text[search..].find(&quoted) {
        let end = search + rel + quoted.len();
        if let Some(colon) = colon_after(text, end) {
            return Some(colon);
        }
        search = end;
    }
    // Bare key, bounded on both sides by non-identifier characters.
    search = 0;
    while let Some(rel) = text[search..].find(key) {
        let start = search + rel;
        let end = start + key.len();
        let prev_ok = text[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_ascii_alphanumeric() && c != '_' && c != '"');
        let next_ok = text[end..]
            .chars()
            .next()
            .is_some_and(|c| !c.is_ascii_alphanumeric() && c != '_');
        if prev_ok && next_ok {
            if let Some(colon) = colon_after(text, end) {
                return Some(colon);
            }
        }
        search = end;
    }
    None
}

/// Offset just past the colon, if the next significant char after `from` is one.
fn colon_after(text: &str, from: usize) -> Option<usize> {
    let mut offset = from;
    for c in text[from..].chars() {
        if c.is_whitespace() {
            offset += c.len_utf8();
            continue;
        }
        return (c == ':').then_some(offset + 1);
    }
    None
}

/// The array span starting at the first significant char after `pos`: from
/// `[` to its matching `]`, or to the end of text when truncated.
fn array_span(text: &str, pos: usize) -> Option<&str> {
    delimited_span(text, pos, '[', ']')
}

/// As [`array_span`], for an object.
fn object_span(text: &str, pos: usize) -> Option<&str> {
    delimited_span(text, pos, '{', '}')
}

fn delimited_span(text: &str, pos: usize, open: char, close: char) -> Option<&str> {
    let rest = &text[pos..];
    let open_rel = rest.find(open)?;
    if rest[..open_rel].chars().any(|c| !c.is_whitespace()) {
        return None;
    }
    let start = pos + open_rel;

    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape = false;
    for (i, c) in text[start..].char_indices() {
        if in_string {
            if escape {
                escape = false;
            } else if c == '\\' {
                escape = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth -= 1;
                if depth == 0 {
                    return (c == close).then(|| &text[start..start + i + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    // Truncated: the span runs to the end of the text.
    Some(&text[start..])
}

/// Split array content into its object items at depth-zero brace pairs.
/// A trailing unterminated object is returned as a final partial item.
fn split_objects(inner: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape = false;
    let mut item_start: Option<usize> = None;

    for (i, c) in inner.char_indices() {
        if in_string {
            if escape {
                escape = false;
            } else if c == '\\' {
                escape = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => {
                if depth == 0 && c == '{' && item_start.is_none() {
                    item_start = Some(i);
                }
                depth += 1;
            }
            '}' | ']' => {
                depth -= 1;
                if depth == 0 && c == '}'
                    && let Some(start) = item_start.take()
                {
                    items.push(&inner[start..=i]);
                }
            }
            _ => {}
        }
    }
    if let Some(start) = item_start {
        items.push(&inner[start..]);
    }
    items
}

/// Collect the string literals sitting at depth zero of an array's content.
fn top_level_strings(inner: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut i = 0;
    while i < inner.len() {
        let c = match inner[i..].chars().next() {
            Some(c) => c,
            None => break,
        };
        match c {
            '"' if depth == 0 => {
                let (value, end) = read_string(inner, i);
                out.push(value);
                i = end;
                continue;
            }
            '"' => {
                let (_, end) = read_string(inner, i);
                i = end;
                continue;
            }
            '[' | '{' => depth += 1,
            ']' | '}' => depth -= 1,
            _ => {}
        }
        i += c.len_utf8();
    }
    out
}

/// Parse the string literal at the first significant char after `pos`.
fn string_at(text: &str, pos: usize) -> Option<String> {
    let rest = &text[pos..];
    let quote_rel = rest.find('"')?;
    if rest[..quote_rel].chars().any(|c| !c.is_whitespace()) {
        return None;
    }
    let (value, _) = read_string(text, pos + quote_rel);
    Some(value)
}

/// Decode the string literal starting at `text[start] == '"'`.
///
/// Returns the value and the offset just past the closing quote, or the end
/// of the text when the literal is truncated. Malformed unicode escapes are
/// kept literally rather than rejected.
fn read_string(text: &str, start: usize) -> (String, usize) {
    let mut out = String::new();
    let body = &text[start + 1..];
    let mut chars = body.char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return (out, start + 1 + i + 1),
            '\\' => match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, 't')) => out.push('\t'),
                Some((_, 'r')) => out.push('\r'),
                Some((_, 'b')) => out.push('\u{0008}'),
                Some((_, 'f')) => out.push('\u{000C}'),
                Some((j, 'u')) => {
                    let hex = body.get(j + 1..j + 5).unwrap_or("");
                    match u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
                        Some(decoded) if hex.len() == 4 => {
                            out.push(decoded);
                            for _ in 0..4 {
                                chars.next();
                            }
                        }
                        _ => out.push_str("\\u"),
                    }
                }
                Some((_, other)) => out.push(other),
                None => return (out, text.len()),
            },
            _ => out.push(c),
        }
    }
    (out, text.len())
}

/// Parse a number (or numeric string) at the first significant char after `pos`.
fn number_at(text: &str, pos: usize) -> Option<f64> {
    let rest = text[pos..].trim_start();
    if rest.starts_with('"') {
        return string_at(text, pos).and_then(|s| s.trim().parse().ok());
    }
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')))
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_risks_array_recovered_from_truncated_object() {
        let raw = r#"{"risks": [{"risk": "Non-compete too broad", "explanation": "5 year radius"}], "opportuniti"#;
        let out = salvage(raw);
        assert_eq!(out.risks.len(), 1);
        assert_eq!(out.risks[0].description, "Non-compete too broad");
        assert_eq!(out.risks[0].explanation, "5 year radius");
        assert!(out.opportunities.is_empty());
        assert_eq!(out.summary, "");
        assert_eq!(out.overall_score, 0);
    }

    #[test]
    fn item_boundaries_survive_braces_in_string_values() {
        // The literal "}," sequence inside a value must not split the item.
        let raw = r#"{"risks": [
            {"risk": "Clause {4}, restraint", "explanation": "see {a}, {b}", "severity": "high"},
            {"risk": "Second", "explanation": "e2"}
        ], "summary": "s""#;
        let out = salvage(raw);
        assert_eq!(out.risks.len(), 2);
        assert_eq!(out.risks[0].description, "Clause {4}, restraint");
        assert_eq!(out.risks[0].explanation, "see {a}, {b}");
        assert_eq!(out.risks[0].severity, Some(Level::High));
        assert_eq!(out.risks[1].description, "Second");
        assert_eq!(out.summary, "s");
    }

    #[test]
    fn final_item_without_separator_is_kept() {
        // Truncated mid-item, but a description was already complete.
        let raw = r#"{"risks": [{"risk": "a", "explanation": "ea"}, {"risk": "b", "expl"#;
        let out = salvage(raw);
        assert_eq!(out.risks.len(), 2);
        assert_eq!(out.risks[1].description, "b");
        assert_eq!(out.risks[1].explanation, "No explanation provided");
    }

    #[test]
    fn dangling_fragment_item_is_skipped() {
        let raw = r#"{"risks": [{"risk": "a", "explanation": "ea"}, {"ri"#;
        let out = salvage(raw);
        assert_eq!(out.risks.len(), 1);
    }

    #[test]
    fn missing_members_take_defaults() {
        let raw = r#"{"opportunities": [{"explanation": "only this"}]"#;
        let out = salvage(raw);
        assert_eq!(out.opportunities.len(), 1);
        assert_eq!(out.opportunities[0].description, "Unknown opportunity");
        assert_eq!(out.opportunities[0].explanation, "only this");
    }

    #[test]
    fn summary_and_score_extracted_individually() {
        let raw = r#"{"summary": "A short summary", "overallScore": 73, "risks": ["#;
        let out = salvage(raw);
        assert_eq!(out.summary, "A short summary");
        assert_eq!(out.overall_score, 73);
        assert!(out.risks.is_empty());
    }

    #[test]
    fn score_clamped_and_accepts_quoted_numbers() {
        assert_eq!(salvage(r#"{"overallScore": 180"#).overall_score, 100);
        assert_eq!(salvage(r#"{"overallScore": "64""#).overall_score, 64);
        assert_eq!(salvage(r#"{"overallScore": "n/a""#).overall_score, 0);
    }

    #[test]
    fn string_lists_recovered() {
        let raw = r#"{"recommendations": ["Negotiate notice", "Cap liability"], "keyClauses": ["Clause 9""#;
        let out = salvage(raw);
        assert_eq!(
            out.recommendations,
            vec!["Negotiate notice".to_string(), "Cap liability".to_string()]
        );
        // Truncated list still yields its complete entries.
        assert_eq!(out.key_clauses, vec!["Clause 9".to_string()]);
    }

    #[test]
    fn compensation_object_recovered() {
        let raw = r#"{"compensationStructure": {"baseSalary": "$90,000", "bonuses": "none"}, "summ"#;
        let out = salvage(raw);
        assert_eq!(out.compensation.base_salary, "$90,000");
        assert_eq!(out.compensation.bonuses, "none");
        assert_eq!(out.compensation.equity, "");
    }

    #[test]
    fn escapes_decoded_and_malformed_unicode_kept() {
        let raw = r#"{"summary": "line\none \"quoted\" é and \uZZZZ tail""#;
        let out = salvage(raw);
        assert_eq!(out.summary, "line\none \"quoted\" é and \\uZZZZ tail");
    }

    #[test]
    fn bare_keys_also_found() {
        let raw = r#"{summary: "bare", overallScore: 40"#;
        let out = salvage(raw);
        assert_eq!(out.summary, "bare");
        assert_eq!(out.overall_score, 40);
    }

    #[test]
    fn nothing_located_yields_baseline() {
        let out = salvage("complete nonsense");
        assert!(out.risks.is_empty());
        assert!(out.opportunities.is_empty());
        assert_eq!(out.summary, "");
        assert_eq!(out.overall_score, 0);
        assert!(out.recommendations.is_empty());
    }
}
