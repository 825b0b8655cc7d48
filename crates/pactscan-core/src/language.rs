//! Word-list fallback for language detection.
//!
//! Used when the model-based detector is unavailable: scans the document for
//! common function words and returns the first language with a hit. This is
//! deliberately crude — the model call is the primary path.

/// Function-word tables, checked in order. First hit wins.
const LANGUAGES: &[(&str, &[&str])] = &[
    ("en", &["the", "a", "an", "and", "or", "but"]),
    ("fr", &["le", "la", "les", "et", "ou", "mais"]),
    ("es", &["el", "la", "los", "las", "y", "o", "pero"]),
    ("de", &["der", "die", "das", "und", "oder", "aber"]),
];

/// Classify the document language by common function words.
///
/// Returns an ISO-639-1 code, defaulting to "en" when nothing matches.
pub fn detect_language_heuristic(text: &str) -> &'static str {
    for (code, words) in LANGUAGES {
        let hit = text
            .split(|c: char| !c.is_alphabetic())
            .filter(|w| !w.is_empty())
            .any(|w| {
                let w = w.to_lowercase();
                words.contains(&w.as_str())
            });
        if hit {
            return code;
        }
    }
    "en"
}
