//! Cache-aside access to stored analyses, with ownership enforcement.
//!
//! Every read and mutation takes the caller's owner id; a record owned by
//! someone else is reported as [`StoreError::NotFound`], the same as a
//! missing one. Mutations invalidate the affected cache keys before they
//! return, so a read issued after a mutation completes never sees the old
//! value. Cache faults degrade to store reads with a warning; they never
//! fail a request.

use std::sync::Arc;
use std::time::Duration;

use pactscan_core::{AnalysisRecord, Feedback};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::Cache;
use crate::document::DocumentStore;
use crate::error::StoreError;

/// TTL for a single cached record.
const RECORD_TTL: Duration = Duration::from_secs(3600);
/// TTL for a cached per-owner listing. Short, since listings change often.
const LISTING_TTL: Duration = Duration::from_secs(300);

fn record_key(id: Uuid) -> String {
    format!("analysis:{id}")
}

fn listing_key(owner_id: &str) -> String {
    format!("owner-analyses:{owner_id}")
}

pub struct AnalysisStore {
    store: Arc<dyn DocumentStore>,
    cache: Arc<dyn Cache>,
}

impl AnalysisStore {
    pub fn new(store: Arc<dyn DocumentStore>, cache: Arc<dyn Cache>) -> Self {
        Self { store, cache }
    }

    /// Persist a new record, enforcing `quota` as a per-owner cap.
    ///
    /// The fresh record is cached immediately and the owner's stale listing
    /// is dropped before this returns.
    pub async fn create(
        &self,
        record: AnalysisRecord,
        quota: Option<usize>,
    ) -> Result<(), StoreError> {
        let id = record.id;
        let owner = record.owner_id.clone();
        let json = serde_json::to_string(&record)?;
        self.store.insert_checked(record, quota).await?;

        if let Err(e) = self.cache.set(&record_key(id), &json, RECORD_TTL).await {
            warn!(%id, error = %e, "failed to cache new analysis");
        }
        self.invalidate_listing(&owner).await;
        Ok(())
    }

    /// Fetch one record, checking ownership.
    pub async fn get(&self, id: Uuid, owner_id: &str) -> Result<AnalysisRecord, StoreError> {
        let key = record_key(id);
        match self.cache.get(&key).await {
            Ok(Some(json)) => match serde_json::from_str::<AnalysisRecord>(&json) {
                Ok(record) if record.owner_id == owner_id => {
                    debug!(%id, "analysis served from cache");
                    return Ok(record);
                }
                Ok(_) => return Err(StoreError::NotFound),
                Err(e) => warn!(%id, error = %e, "dropping undecodable cache entry"),
            },
            Ok(None) => {}
            Err(e) => warn!(%id, error = %e, "cache read failed, falling back to store"),
        }

        let record = self.store.get(id).await?.ok_or(StoreError::NotFound)?;
        if record.owner_id != owner_id {
            return Err(StoreError::NotFound);
        }
        if let Ok(json) = serde_json::to_string(&record)
            && let Err(e) = self.cache.set(&key, &json, RECORD_TTL).await
        {
            warn!(%id, error = %e, "failed to repopulate cache");
        }
        Ok(record)
    }

    /// One owner's records, newest first, optionally restricted to a project.
    ///
    /// The cache always holds the full unfiltered listing; the project
    /// filter is applied after the cache lookup.
    pub async fn list_by_owner(
        &self,
        owner_id: &str,
        project: Option<&str>,
    ) -> Result<Vec<AnalysisRecord>, StoreError> {
        let mut records = self.list_all(owner_id).await?;
        if let Some(project) = project {
            records.retain(|r| r.project_id.as_deref() == Some(project));
        }
        Ok(records)
    }

    async fn list_all(&self, owner_id: &str) -> Result<Vec<AnalysisRecord>, StoreError> {
        let key = listing_key(owner_id);
        match self.cache.get(&key).await {
            Ok(Some(json)) => match serde_json::from_str::<Vec<AnalysisRecord>>(&json) {
                Ok(records) => {
                    debug!(owner = %owner_id, count = records.len(), "listing served from cache");
                    return Ok(records);
                }
                Err(e) => warn!(owner = %owner_id, error = %e, "dropping undecodable listing"),
            },
            Ok(None) => {}
            Err(e) => warn!(owner = %owner_id, error = %e, "cache read failed, falling back to store"),
        }

        let records = self.store.list_by_owner(owner_id).await?;
        if let Ok(json) = serde_json::to_string(&records)
            && let Err(e) = self.cache.set(&key, &json, LISTING_TTL).await
        {
            warn!(owner = %owner_id, error = %e, "failed to cache listing");
        }
        Ok(records)
    }

    /// Fetch one record straight from the durable store, checking ownership.
    ///
    /// For callers that must not trust a cached copy, such as an ownership
    /// re-check before acting on a record.
    pub async fn get_durable(
        &self,
        id: Uuid,
        owner_id: &str,
    ) -> Result<AnalysisRecord, StoreError> {
        let record = self.store.get(id).await?.ok_or(StoreError::NotFound)?;
        if record.owner_id != owner_id {
            return Err(StoreError::NotFound);
        }
        Ok(record)
    }

    /// Count of records held by one owner, read from the durable store.
    pub async fn count_by_owner(&self, owner_id: &str) -> Result<usize, StoreError> {
        self.store.count_by_owner(owner_id).await
    }

    /// Delete one record, checking ownership. Both the record key and the
    /// owner's listing are invalidated before returning.
    pub async fn delete(&self, id: Uuid, owner_id: &str) -> Result<(), StoreError> {
        let record = self.store.get(id).await?.ok_or(StoreError::NotFound)?;
        if record.owner_id != owner_id {
            return Err(StoreError::NotFound);
        }
        self.store.delete(id).await?;
        self.invalidate_record(id).await;
        self.invalidate_listing(owner_id).await;
        Ok(())
    }

    /// Attach feedback to a record, checking ownership.
    pub async fn attach_feedback(
        &self,
        id: Uuid,
        owner_id: &str,
        feedback: Feedback,
    ) -> Result<(), StoreError> {
        let record = self.store.get(id).await?.ok_or(StoreError::NotFound)?;
        if record.owner_id != owner_id {
            return Err(StoreError::NotFound);
        }
        self.store.set_feedback(id, feedback).await?;
        self.invalidate_record(id).await;
        self.invalidate_listing(owner_id).await;
        Ok(())
    }

    async fn invalidate_record(&self, id: Uuid) {
        if let Err(e) = self.cache.delete(&record_key(id)).await {
            warn!(%id, error = %e, "failed to invalidate cached analysis");
        }
    }

    async fn invalidate_listing(&self, owner_id: &str) {
        if let Err(e) = self.cache.delete(&listing_key(owner_id)).await {
            warn!(owner = %owner_id, error = %e, "failed to invalidate cached listing");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::document::MemoryStore;
    use chrono::Utc;
    use pactscan_core::{AnalysisOutcome, Tier};

    fn record(owner: &str) -> AnalysisRecord {
        AnalysisRecord {
            id: Uuid::new_v4(),
            owner_id: owner.to_string(),
            project_id: None,
            contract_text: "text".to_string(),
            contract_type: "Employment".to_string(),
            language: "en".to_string(),
            tier: Tier::Free,
            outcome: AnalysisOutcome::default(),
            expiration_date: None,
            feedback: None,
            created_at: Utc::now(),
        }
    }

    fn subject() -> (AnalysisStore, Arc<MemoryStore>, Arc<MemoryCache>) {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(MemoryCache::new());
        (AnalysisStore::new(store.clone(), cache.clone()), store, cache)
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let (analyses, _, _) = subject();
        let rec = record("alice");
        let id = rec.id;
        analyses.create(rec, None).await.unwrap();
        let fetched = analyses.get(id, "alice").await.unwrap();
        assert_eq!(fetched.id, id);
    }

    #[tokio::test]
    async fn foreign_owner_sees_not_found() {
        let (analyses, _, _) = subject();
        let rec = record("alice");
        let id = rec.id;
        analyses.create(rec, None).await.unwrap();
        // Cached copy and store copy both refuse the wrong owner.
        assert!(matches!(analyses.get(id, "mallory").await, Err(StoreError::NotFound)));
        assert!(matches!(analyses.delete(id, "mallory").await, Err(StoreError::NotFound)));
        assert!(matches!(
            analyses
                .attach_feedback(id, "mallory", Feedback { rating: 1, comments: "".into() })
                .await,
            Err(StoreError::NotFound)
        ));
        // The record survives the foreign delete attempt.
        assert!(analyses.get(id, "alice").await.is_ok());
    }

    #[tokio::test]
    async fn get_falls_back_to_store_on_cache_miss() {
        let (analyses, _, cache) = subject();
        let rec = record("alice");
        let id = rec.id;
        analyses.create(rec, None).await.unwrap();
        cache.delete(&record_key(id)).await.unwrap();
        assert!(analyses.get(id, "alice").await.is_ok());
        // The miss repopulated the cache.
        assert!(cache.get(&record_key(id)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_invalidates_both_keys() {
        let (analyses, _, cache) = subject();
        let rec = record("alice");
        let id = rec.id;
        analyses.create(rec, None).await.unwrap();
        analyses.list_by_owner("alice", None).await.unwrap();
        assert!(cache.get(&listing_key("alice")).await.unwrap().is_some());

        analyses.delete(id, "alice").await.unwrap();
        assert!(cache.get(&record_key(id)).await.unwrap().is_none());
        assert!(cache.get(&listing_key("alice")).await.unwrap().is_none());
        assert!(matches!(analyses.get(id, "alice").await, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn listing_reflects_mutations_immediately() {
        let (analyses, _, _) = subject();
        let first = record("alice");
        analyses.create(first.clone(), None).await.unwrap();
        assert_eq!(analyses.list_by_owner("alice", None).await.unwrap().len(), 1);

        // A second create lands while the listing is cached.
        analyses.create(record("alice"), None).await.unwrap();
        assert_eq!(analyses.list_by_owner("alice", None).await.unwrap().len(), 2);

        analyses.delete(first.id, "alice").await.unwrap();
        assert_eq!(analyses.list_by_owner("alice", None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn project_filter_applies_after_the_cache() {
        let (analyses, _, _) = subject();
        let mut in_project = record("alice");
        in_project.project_id = Some("acme".to_string());
        analyses.create(in_project, None).await.unwrap();
        analyses.create(record("alice"), None).await.unwrap();

        // Warm the cache with the unfiltered listing.
        assert_eq!(analyses.list_by_owner("alice", None).await.unwrap().len(), 2);
        let filtered = analyses.list_by_owner("alice", Some("acme")).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].project_id.as_deref(), Some("acme"));
        assert!(analyses.list_by_owner("alice", Some("other")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn feedback_is_visible_after_attach() {
        let (analyses, _, _) = subject();
        let rec = record("alice");
        let id = rec.id;
        analyses.create(rec, None).await.unwrap();
        // Warm the record cache, then mutate.
        analyses.get(id, "alice").await.unwrap();
        analyses
            .attach_feedback(id, "alice", Feedback { rating: 4, comments: "good".into() })
            .await
            .unwrap();
        let fetched = analyses.get(id, "alice").await.unwrap();
        assert_eq!(fetched.feedback.unwrap().rating, 4);
    }

    #[tokio::test]
    async fn quota_rejection_leaves_no_cache_residue() {
        let (analyses, _, cache) = subject();
        analyses.create(record("alice"), Some(1)).await.unwrap();
        let denied = record("alice");
        let denied_id = denied.id;
        assert!(matches!(
            analyses.create(denied, Some(1)).await,
            Err(StoreError::QuotaExceeded(1))
        ));
        assert!(cache.get(&record_key(denied_id)).await.unwrap().is_none());
    }
}
