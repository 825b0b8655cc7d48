//! Bounded syntactic repairs for almost-JSON output.
//!
//! Two substitutions, both idempotent and both blind to string-literal
//! contents: wrap bare object keys in quotes, and drop trailing commas
//! before a closing bracket. These are pattern substitutions, not a grammar
//! fix — anything they cannot mend falls through to field salvage.

/// Apply the repair set. Re-applying to already-correct text is a no-op.
pub fn repair(input: &str) -> String {
    strip_trailing_commas(&quote_bare_keys(input))
}

/// Wrap bare identifier keys in quotes: `{risk: "x"}` → `{"risk": "x"}`.
///
/// A bare identifier counts as a key only when the previous significant
/// character opens an object or separates members (`{` or `,`) and the next
/// significant character is a colon, so bare words in value position
/// (`true`, `null`) are left alone.
fn quote_bare_keys(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 16);
    let mut chars = input.char_indices().peekable();
    let mut in_string = false;
    let mut prev_significant = '\0';

    while let Some((i, c)) = chars.next() {
        if in_string {
            out.push(c);
            if c == '\\' {
                if let Some((_, escaped)) = chars.next() {
                    out.push(escaped);
                }
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        if c == '"' {
            in_string = true;
            out.push(c);
            prev_significant = c;
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            // Collect the whole identifier.
            let start = i;
            let mut end = i + c.len_utf8();
            while let Some(&(j, next)) = chars.peek() {
                if next.is_ascii_alphanumeric() || next == '_' {
                    chars.next();
                    end = j + next.len_utf8();
                } else {
                    break;
                }
            }
            let ident = &input[start..end];
            let next_significant = input[end..].chars().find(|ch| !ch.is_whitespace());
            let key_position = matches!(prev_significant, '{' | ',');
            if key_position && next_significant == Some(':') {
                out.push('"');
                out.push_str(ident);
                out.push('"');
            } else {
                out.push_str(ident);
            }
            prev_significant = ident.chars().next_back().unwrap_or(c);
            continue;
        }

        out.push(c);
        if !c.is_whitespace() {
            prev_significant = c;
        }
    }

    out
}

/// Drop commas directly before a closing bracket: `[1, 2,]` → `[1, 2]`.
fn strip_trailing_commas(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.char_indices();
    let mut in_string = false;

    while let Some((i, c)) = chars.next() {
        if in_string {
            out.push(c);
            if c == '\\' {
                if let Some((_, escaped)) = chars.next() {
                    out.push(escaped);
                }
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next_significant =
                    input[i + 1..].chars().find(|ch| !ch.is_whitespace());
                if !matches!(next_significant, Some('}') | Some(']')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_bare_keys() {
        assert_eq!(
            repair(r#"{risk: "x", explanation: "y"}"#),
            r#"{"risk": "x", "explanation": "y"}"#
        );
    }

    #[test]
    fn strips_trailing_commas() {
        assert_eq!(repair(r#"{"a": [1, 2,],}"#), r#"{"a": [1, 2]}"#);
    }

    #[test]
    fn valid_json_is_untouched() {
        let valid = r#"{"risks": [{"risk": "a", "severity": "high"}], "score": 5}"#;
        assert_eq!(repair(valid), valid);
    }

    #[test]
    fn idempotent() {
        let sloppy = r#"{risks: [{risk: "a",}, {risk: "b"},], summary: "s",}"#;
        let once = repair(sloppy);
        let twice = repair(&once);
        assert_eq!(once, twice);
        assert!(serde_json::from_str::<serde_json::Value>(&once).is_ok());
    }

    #[test]
    fn string_values_are_never_altered() {
        // Braces, commas, colons, and a bare-key lookalike inside a value.
        let tricky = r#"{"summary": "clauses: {a: 1}, then, more,", "x": "a},b"}"#;
        assert_eq!(repair(tricky), tricky);
    }

    #[test]
    fn bare_words_in_value_position_are_kept() {
        assert_eq!(
            repair(r#"{enforceable: true, notes: null}"#),
            r#"{"enforceable": true, "notes": null}"#
        );
        assert_eq!(repair(r#"[alpha, beta]"#), r#"[alpha, beta]"#);
    }

    #[test]
    fn unicode_in_values_passes_through() {
        let text = r#"{clause: "Kündigungsfrist: 30 Tage"}"#;
        assert_eq!(repair(text), r#"{"clause": "Kündigungsfrist: 30 Tage"}"#);
    }

    #[test]
    fn truncated_input_is_repaired_best_effort() {
        // Repair cannot close the object, but must not mangle what is there.
        assert_eq!(
            repair(r#"{risks: [{risk: "a"}], opportuni"#),
            r#"{"risks": [{"risk": "a"}], opportuni"#
        );
    }
}
