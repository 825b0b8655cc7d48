//! Upload text extraction behind a trait, keyed on file extension.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    Unsupported(String),
    #[error("file is not valid UTF-8 text")]
    InvalidEncoding,
    #[error("file contains no text")]
    Empty,
}

pub trait TextExtractor: Send + Sync {
    /// Pull plain text out of an uploaded file.
    fn extract(&self, bytes: &[u8], filename: &str) -> Result<String, ExtractError>;
}

/// Extractor for plain-text formats (`.txt`, `.md`). Rejects anything else
/// by extension rather than sniffing content.
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8], filename: &str) -> Result<String, ExtractError> {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if extension != "txt" && extension != "md" {
            return Err(ExtractError::Unsupported(extension));
        }
        let text = std::str::from_utf8(bytes).map_err(|_| ExtractError::InvalidEncoding)?;
        if text.trim().is_empty() {
            return Err(ExtractError::Empty);
        }
        Ok(text.to_string())
    }
}
