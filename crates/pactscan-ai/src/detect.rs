//! Model-backed detection of document language and contract category.
//!
//! Both detectors send a bounded prefix of the document, never the whole
//! text. Detection failures surface as errors so the caller decides whether
//! to fall back to a heuristic or abort.

use tracing::debug;

use crate::generator::{GenerateError, Generator};
use crate::prompt;

/// Characters of document text forwarded to the detection prompts.
const DETECT_PREFIX_CHARS: usize = 2000;

/// Take the first `DETECT_PREFIX_CHARS` characters, on a char boundary.
fn prefix(text: &str) -> &str {
    match text.char_indices().nth(DETECT_PREFIX_CHARS) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}

/// Identify the document language as a two-letter code.
///
/// The completion is sanitised to lowercase alphabetic characters; anything
/// unusable falls back to `"en"`.
pub async fn detect_language(
    generator: &dyn Generator,
    text: &str,
) -> Result<String, GenerateError> {
    let raw = generator
        .generate(&prompt::detect_language_prompt(prefix(text)))
        .await?;
    let code: String = raw
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .flat_map(|c| c.to_lowercase())
        .collect();
    let code = if code.is_empty() {
        "en".to_string()
    } else {
        code
    };
    debug!(language = %code, "language detected");
    Ok(code)
}

/// Identify the contract category as free-form text.
///
/// The trimmed completion is used verbatim; an empty completion becomes
/// `"Unknown"`.
pub async fn detect_contract_type(
    generator: &dyn Generator,
    text: &str,
) -> Result<String, GenerateError> {
    let raw = generator
        .generate(&prompt::detect_type_prompt(prefix(text)))
        .await?;
    let category = raw.trim();
    let category = if category.is_empty() {
        "Unknown".to_string()
    } else {
        category.to_string()
    };
    debug!(contract_type = %category, "contract type detected");
    Ok(category)
}
