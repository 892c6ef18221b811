//! In-memory user store
//!
//! Each write holds the shard lock for its key, so create-if-absent and
//! merge-update are atomic per identity.

use crate::contract::{CreateOutcome, UserStore};
use crate::error::StoreError;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use recon_model::{HistoryEntry, UserRecord, UserStatus};

/// Concurrent in-memory [`UserStore`]
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    records: DashMap<String, UserRecord>,
}

impl MemoryUserStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create store pre-populated with `records`
    ///
    /// Later records with a duplicate key replace earlier ones.
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = UserRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.put(record);
        }
        store
    }

    /// Unconditionally write `record` (seeding and fixtures only)
    pub fn put(&self, record: UserRecord) {
        self.records.insert(record.id.clone(), record);
    }

    /// Administrative status change, outside of reconciliation
    ///
    /// Returns `false` if no record exists under `id`.
    pub fn set_status(&self, id: &str, status: UserStatus) -> bool {
        match self.records.get_mut(id) {
            Some(mut record) => {
                tracing::info!(user_id = %id, status = %status, "record status set");
                record.status = status;
                true
            }
            None => false,
        }
    }

    /// Copy of the record under `id`
    #[must_use]
    pub fn get(&self, id: &str) -> Option<UserRecord> {
        self.records.get(id).map(|r| r.value().clone())
    }

    /// All records, ordered by key
    #[must_use]
    pub fn snapshot(&self) -> Vec<UserRecord> {
        let mut all: Vec<UserRecord> = self.records.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Number of stored records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get_by_key(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.get(id))
    }

    async fn create_if_absent(&self, record: UserRecord) -> Result<CreateOutcome, StoreError> {
        match self.records.entry(record.id.clone()) {
            Entry::Occupied(_) => Ok(CreateOutcome::AlreadyExists),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(CreateOutcome::Created)
            }
        }
    }

    async fn merge_update(
        &self,
        id: &str,
        name: &str,
        history_entry: &HistoryEntry,
    ) -> Result<UserRecord, StoreError> {
        let mut record = self.records.get_mut(id).ok_or_else(|| StoreError::NotFound {
            id: id.to_string(),
        })?;
        record.apply_merge(name, history_entry);
        Ok(record.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use recon_model::Timestamp;

    fn t(secs: i64) -> Timestamp {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(secs)
    }

    #[tokio::test]
    async fn create_if_absent_reports_existing() {
        let store = MemoryUserStore::new();
        let rec = UserRecord::create("U1", "Alice", t(0));

        assert_eq!(store.create_if_absent(rec.clone()).await, Ok(CreateOutcome::Created));
        let again = UserRecord::create("U1", "Bob", t(1));
        assert_eq!(store.create_if_absent(again).await, Ok(CreateOutcome::AlreadyExists));
        assert_eq!(store.get("U1"), Some(rec));
    }

    #[tokio::test]
    async fn merge_update_is_first_write_wins() {
        let store = MemoryUserStore::from_records([UserRecord::create("U1", "Alice", t(0))]);

        let first = store
            .merge_update("U1", "Bob", &HistoryEntry::new("Bob", t(1)))
            .await
            .unwrap();
        assert_eq!(first.history.get("Bob"), Some(t(1)));

        let second = store
            .merge_update("U1", "Bob", &HistoryEntry::new("Bob", t(2)))
            .await
            .unwrap();
        assert_eq!(second.history.get("Bob"), Some(t(1)));
        assert_eq!(second.name, "Bob");
    }

    #[tokio::test]
    async fn merge_update_missing_record() {
        let store = MemoryUserStore::new();
        let err = store
            .merge_update("U9", "Bob", &HistoryEntry::new("Bob", t(1)))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound { id: "U9".into() });
    }

    #[test]
    fn set_status_and_snapshot() {
        let store = MemoryUserStore::from_records([
            UserRecord::create("U2", "Bob", t(0)),
            UserRecord::create("U1", "Alice", t(0)),
        ]);
        assert!(store.set_status("U1", UserStatus::Locked));
        assert!(!store.set_status("U3", UserStatus::Locked));

        let all = store.snapshot();
        assert_eq!(all[0].id, "U1");
        assert!(all[0].is_locked());
        assert_eq!(store.len(), 2);
    }
}
