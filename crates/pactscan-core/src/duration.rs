//! Expiration date derivation from a free-text contract duration.

use chrono::{DateTime, Duration, Months, Utc};

/// Derive an expiration date from a duration phrase like "2 years",
/// "a term of 18 months", or "90 days", anchored at `from`.
///
/// The first `<number> <year|month|day>` pair wins; unit matching is
/// case-insensitive and tolerates plurals. Returns `None` when no such pair
/// can be found, mirroring the lenient behaviour expected of model output.
pub fn expiration_from_duration(duration: &str, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let mut tokens = duration.split(|c: char| !c.is_ascii_alphanumeric());
    while let Some(token) = tokens.next() {
        if token.is_empty() {
            continue;
        }
        // Accept both "2 years" and "2years".
        let (digits, rest) = split_leading_digits(token);
        if digits.is_empty() {
            continue;
        }
        let amount: u32 = match digits.parse() {
            Ok(n) => n,
            Err(_) => continue,
        };
        let unit = if rest.is_empty() {
            match tokens.clone().find(|t| !t.is_empty()) {
                Some(next) => next.to_string(),
                None => continue,
            }
        } else {
            rest.to_string()
        };
        if let Some(date) = apply_unit(from, amount, &unit) {
            return Some(date);
        }
    }
    None
}

fn split_leading_digits(token: &str) -> (&str, &str) {
    let end = token
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(token.len());
    token.split_at(end)
}

fn apply_unit(from: DateTime<Utc>, amount: u32, unit: &str) -> Option<DateTime<Utc>> {
    let unit = unit.to_ascii_lowercase();
    if unit.starts_with("year") {
        from.checked_add_months(Months::new(amount.checked_mul(12)?))
    } else if unit.starts_with("month") {
        from.checked_add_months(Months::new(amount))
    } else if unit.starts_with("day") {
        from.checked_add_signed(Duration::days(i64::from(amount)))
    } else {
        None
    }
}
