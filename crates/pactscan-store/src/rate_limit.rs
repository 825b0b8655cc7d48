//! Fixed-window rate limiting on top of the cache's atomic counters.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::cache::Cache;

/// Default window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(900);
/// Default operations allowed per window.
pub const DEFAULT_MAX: i64 = 10;

/// Outcome of one rate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    /// Operations left in the current window. Zero once denied.
    pub remaining: i64,
}

/// Fixed-window limiter keyed by caller identity.
///
/// The first operation in a window creates the counter and stamps the
/// window's expiry; the window does not slide. A cache fault lets the
/// operation through with a warning rather than failing it.
pub struct RateLimiter {
    cache: Arc<dyn Cache>,
    max: i64,
    window: Duration,
}

impl RateLimiter {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self::with_limits(cache, DEFAULT_MAX, DEFAULT_WINDOW)
    }

    pub fn with_limits(cache: Arc<dyn Cache>, max: i64, window: Duration) -> Self {
        Self { cache, max, window }
    }

    /// Record one operation for `identity` and decide whether it may proceed.
    pub async fn check(&self, identity: &str) -> RateDecision {
        let key = format!("rate:{identity}");
        let count = match self.cache.increment(&key).await {
            Ok(count) => count,
            Err(e) => {
                warn!(identity, error = %e, "rate limiter unavailable, allowing request");
                return RateDecision {
                    allowed: true,
                    remaining: self.max,
                };
            }
        };
        if count == 1
            && let Err(e) = self.cache.expire(&key, self.window).await
        {
            warn!(identity, error = %e, "failed to stamp rate window expiry");
        }
        RateDecision {
            allowed: count <= self.max,
            remaining: (self.max - count).max(0),
        }
    }
}
