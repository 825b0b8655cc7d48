//! Persistence layer: the durable analysis store, the cache in front of it,
//! and cache-backed rate limiting.

pub mod analyses;
pub mod cache;
pub mod document;
pub mod error;
pub mod rate_limit;

pub use analyses::AnalysisStore;
pub use cache::{Cache, MemoryCache};
pub use document::{DocumentStore, MemoryStore};
pub use error::StoreError;
pub use rate_limit::{RateDecision, RateLimiter};
