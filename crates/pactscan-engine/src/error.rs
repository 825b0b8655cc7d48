use pactscan_ai::GenerateError;
use pactscan_store::StoreError;
use thiserror::Error;

use crate::extract::ExtractError;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("text extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("generation failed: {0}")]
    Generation(#[from] GenerateError),

    #[error("invalid request: {0}")]
    Validation(&'static str),

    #[error("stored analysis limit reached ({0} analyses); delete one or upgrade")]
    QuotaExceeded(usize),

    #[error("too many requests, try again later")]
    RateLimited,

    /// Covers both genuinely missing records and records the caller does
    /// not own.
    #[error("analysis not found")]
    NotFoundOrUnauthorized,

    #[error("store error: {0}")]
    Store(String),
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => Self::NotFoundOrUnauthorized,
            StoreError::QuotaExceeded(max) => Self::QuotaExceeded(max),
            other => Self::Store(other.to_string()),
        }
    }
}
