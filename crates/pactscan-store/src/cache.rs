//! Key/value cache with per-key expiry and atomic counters.
//!
//! The trait mirrors the small command set the store and the rate limiter
//! actually need. [`MemoryCache`] is the in-process implementation used by
//! the CLI and the tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::error::StoreError;

#[async_trait]
pub trait Cache: Send + Sync {
    /// Fetch a value. Expired keys read as absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store a value. A zero `ttl` means the key never expires.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Remove a key. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Atomically add one to a counter key, creating it at 1 with no expiry.
    /// Returns the value after the increment.
    async fn increment(&self, key: &str) -> Result<i64, StoreError>;

    /// Set the expiry of an existing key. Returns false if the key is absent.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError>;
}

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn live(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(at) => now < at,
            None => true,
        }
    }
}

/// In-process [`Cache`] backed by a mutex-guarded map.
///
/// Expiry is lazy: dead entries are dropped when touched, not on a timer.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn deadline(ttl: Duration) -> Option<Instant> {
        (!ttl.is_zero()).then(|| Instant::now() + ttl)
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut entries = self.entries.lock().unwrap();
        let now = Instant::now();
        match entries.get(key) {
            Some(entry) if entry.live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Self::deadline(ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        let mut entries = self.entries.lock().unwrap();
        let now = Instant::now();
        let next = match entries.get(key) {
            Some(entry) if entry.live(now) => {
                let current: i64 = entry
                    .value
                    .parse()
                    .map_err(|_| StoreError::Cache(format!("key {key} holds a non-counter value")))?;
                current + 1
            }
            _ => 1,
        };
        let expires_at = entries.get(key).and_then(|e| e.expires_at).filter(|_| next > 1);
        entries.insert(
            key.to_string(),
            Entry {
                value: next.to_string(),
                expires_at,
            },
        );
        Ok(next)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let mut entries = self.entries.lock().unwrap();
        let now = Instant::now();
        match entries.get_mut(key) {
            Some(entry) if entry.live(now) => {
                entry.expires_at = Self::deadline(ttl);
                Ok(true)
            }
            Some(_) => {
                entries.remove(key);
                Ok(false)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_delete_round_trip() {
        let cache = MemoryCache::new();
        cache.set("k", "v", Duration::ZERO).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));
        cache.delete("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_keys_read_as_absent() {
        let cache = MemoryCache::new();
        cache.set("k", "v", Duration::from_nanos(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn zero_ttl_never_expires() {
        let cache = MemoryCache::new();
        cache.set("k", "v", Duration::ZERO).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn increment_counts_from_one() {
        let cache = MemoryCache::new();
        assert_eq!(cache.increment("n").await.unwrap(), 1);
        assert_eq!(cache.increment("n").await.unwrap(), 2);
        assert_eq!(cache.increment("n").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn increment_restarts_after_expiry() {
        let cache = MemoryCache::new();
        cache.increment("n").await.unwrap();
        assert!(cache.expire("n", Duration::from_nanos(1)).await.unwrap());
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(cache.increment("n").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn increment_rejects_non_counter_values() {
        let cache = MemoryCache::new();
        cache.set("k", "not a number", Duration::ZERO).await.unwrap();
        assert!(cache.increment("k").await.is_err());
    }

    #[tokio::test]
    async fn expire_on_absent_key_is_false() {
        let cache = MemoryCache::new();
        assert!(!cache.expire("missing", Duration::from_secs(1)).await.unwrap());
    }
}
