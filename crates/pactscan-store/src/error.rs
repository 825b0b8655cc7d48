use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Missing records and records owned by someone else are reported
    /// identically, so a caller cannot probe for other owners' ids.
    #[error("analysis not found")]
    NotFound,

    #[error("stored analysis limit reached ({0} analyses)")]
    QuotaExceeded(usize),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store backend error: {0}")]
    Backend(String),
}
