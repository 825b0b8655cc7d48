//! Durable record storage behind a trait, with an in-process implementation.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use pactscan_core::{AnalysisRecord, Feedback};
use uuid::Uuid;

use crate::error::StoreError;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a record, enforcing a per-owner cap in the same step.
    ///
    /// When `max` is given and the owner already holds that many records the
    /// insert fails with [`StoreError::QuotaExceeded`] and nothing is
    /// written. The count and the insert happen under one lock so two
    /// concurrent inserts cannot both slip under the cap.
    async fn insert_checked(
        &self,
        record: AnalysisRecord,
        max: Option<usize>,
    ) -> Result<(), StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<AnalysisRecord>, StoreError>;

    /// All records for one owner, newest first.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<AnalysisRecord>, StoreError>;

    /// Count of records held by one owner.
    async fn count_by_owner(&self, owner_id: &str) -> Result<usize, StoreError>;

    /// Remove a record. Absent ids report [`StoreError::NotFound`].
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;

    /// Replace the feedback on an existing record.
    async fn set_feedback(&self, id: Uuid, feedback: Feedback) -> Result<(), StoreError>;
}

/// In-process [`DocumentStore`] backed by a mutex-guarded map.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<Uuid, AnalysisRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_checked(
        &self,
        record: AnalysisRecord,
        max: Option<usize>,
    ) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap();
        if let Some(max) = max {
            let held = records
                .values()
                .filter(|r| r.owner_id == record.owner_id)
                .count();
            if held >= max {
                return Err(StoreError::QuotaExceeded(max));
            }
        }
        records.insert(record.id, record);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<AnalysisRecord>, StoreError> {
        Ok(self.records.lock().unwrap().get(&id).cloned())
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<AnalysisRecord>, StoreError> {
        let records = self.records.lock().unwrap();
        let mut owned: Vec<AnalysisRecord> = records
            .values()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn count_by_owner(&self, owner_id: &str) -> Result<usize, StoreError> {
        let records = self.records.lock().unwrap();
        Ok(records.values().filter(|r| r.owner_id == owner_id).count())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        match self.records.lock().unwrap().remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound),
        }
    }

    async fn set_feedback(&self, id: Uuid, feedback: Feedback) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap();
        let record = records.get_mut(&id).ok_or(StoreError::NotFound)?;
        record.feedback = Some(feedback);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use pactscan_core::{AnalysisOutcome, Tier};

    fn record(owner: &str, age_minutes: i64) -> AnalysisRecord {
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
            created_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    #[tokio::test]
    async fn insert_checked_enforces_the_cap() {
        let store = MemoryStore::new();
        for _ in 0..3 {
            store.insert_checked(record("alice", 0), Some(3)).await.unwrap();
        }
        let denied = store.insert_checked(record("alice", 0), Some(3)).await;
        assert!(matches!(denied, Err(StoreError::QuotaExceeded(3))));
        // Another owner is unaffected.
        store.insert_checked(record("bob", 0), Some(3)).await.unwrap();
    }

    #[tokio::test]
    async fn uncapped_insert_never_rejects() {
        let store = MemoryStore::new();
        for _ in 0..20 {
            store.insert_checked(record("alice", 0), None).await.unwrap();
        }
        assert_eq!(store.count_by_owner("alice").await.unwrap(), 20);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = MemoryStore::new();
        store.insert_checked(record("alice", 30), None).await.unwrap();
        store.insert_checked(record("alice", 10), None).await.unwrap();
        store.insert_checked(record("alice", 20), None).await.unwrap();
        let listed = store.list_by_owner("alice").await.unwrap();
        let ages: Vec<_> = listed.iter().map(|r| r.created_at).collect();
        assert!(ages.windows(2).all(|w| w[0] >= w[1]));
    }

    #[tokio::test]
    async fn delete_frees_quota() {
        let store = MemoryStore::new();
        let first = record("alice", 0);
        let first_id = first.id;
        store.insert_checked(first, Some(1)).await.unwrap();
        assert!(store.insert_checked(record("alice", 0), Some(1)).await.is_err());
        store.delete(first_id).await.unwrap();
        store.insert_checked(record("alice", 0), Some(1)).await.unwrap();
    }

    #[tokio::test]
    async fn feedback_replaces_previous_feedback() {
        let store = MemoryStore::new();
        let rec = record("alice", 0);
        let id = rec.id;
        store.insert_checked(rec, None).await.unwrap();
        store
            .set_feedback(id, Feedback { rating: 2, comments: "too terse".into() })
            .await
            .unwrap();
        store
            .set_feedback(id, Feedback { rating: 5, comments: "better".into() })
            .await
            .unwrap();
        let stored = store.get(id).await.unwrap().unwrap();
        assert_eq!(stored.feedback.unwrap().rating, 5);
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let store = MemoryStore::new();
        assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
        assert!(matches!(store.delete(Uuid::new_v4()).await, Err(StoreError::NotFound)));
    }
}
