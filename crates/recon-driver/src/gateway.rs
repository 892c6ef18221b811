//! Collaborator access shared by both drivers
//!
//! Reads and merges are idempotent and go through the retry policy. Creates
//! are not: after an ambiguous create failure the store is re-read before
//! anything is written again.

use crate::config::RetryPolicy;
use crate::error::{Collaborator, ReconError};
use crate::retry::{retry_transient, Exhausted};
use recon_engine::StorageMutation;
use recon_model::{ExternalIdentity, HistoryEntry, UserRecord};
use recon_store::{CreateOutcome, ExternalUserSource, SourceError, StoreError, UserStore};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of applying one storage mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteOutcome {
    /// The mutation is durable
    Applied,
    /// The store changed under us; re-read and decide again
    Conflict,
}

/// Handles to both collaborators plus the retry policy
#[derive(Clone)]
pub struct Collaborators {
    source: Arc<dyn ExternalUserSource>,
    store: Arc<dyn UserStore>,
    retry: RetryPolicy,
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl Collaborators {
    /// Create with the default retry policy
    pub fn new(source: Arc<dyn ExternalUserSource>, store: Arc<dyn UserStore>) -> Self {
        Self {
            source,
            store,
            retry: RetryPolicy::default(),
        }
    }

    /// With retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fetch and validate the identity behind `lookup_key`
    pub(crate) async fn fetch_external(&self, lookup_key: &str) -> Result<ExternalIdentity, ReconError> {
        let identity = retry_transient(&self.retry, "source.get", || self.source.get(lookup_key))
            .await
            .map_err(source_fault)?;
        identity.validate()?;
        debug!(lookup_key, user_id = %identity.id, "external identity fetched");
        Ok(identity)
    }

    /// Point lookup; absence is not a fault
    pub(crate) async fn load(&self, id: &str) -> Result<Option<UserRecord>, ReconError> {
        let stored = retry_transient(&self.retry, "store.get_by_key", || self.store.get_by_key(id))
            .await
            .map_err(store_fault)?;
        debug!(user_id = %id, found = stored.is_some(), "stored record loaded");
        Ok(stored)
    }

    /// Create `record` unless a record with its key already exists
    pub(crate) async fn create(&self, record: &UserRecord) -> Result<WriteOutcome, ReconError> {
        let max_attempts = self.retry.attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.store.create_if_absent(record.clone()).await {
                Ok(CreateOutcome::Created) => return Ok(WriteOutcome::Applied),
                Ok(CreateOutcome::AlreadyExists) => {
                    warn!(user_id = %record.id, "record created concurrently");
                    return Ok(WriteOutcome::Conflict);
                }
                Err(error) if error.is_transient() && attempt < max_attempts => {
                    let wait = self.retry.backoff(attempt);
                    warn!(
                        user_id = %record.id,
                        attempt,
                        wait_ms = wait.as_millis(),
                        error = %error,
                        "create failed, checking store before retrying"
                    );
                    tokio::time::sleep(wait).await;

                    // The failed create may still have landed.
                    match self.load(&record.id).await? {
                        Some(existing) if existing == *record => return Ok(WriteOutcome::Applied),
                        Some(_) => return Ok(WriteOutcome::Conflict),
                        None => {}
                    }
                }
                Err(error) => {
                    return Err(ReconError::unavailable(Collaborator::UserStore, attempt, error))
                }
            }
        }
    }

    /// Set `name` and offer `entry` to the first-write-wins history
    pub(crate) async fn merge(
        &self,
        id: &str,
        name: &str,
        entry: &HistoryEntry,
    ) -> Result<WriteOutcome, ReconError> {
        let merged = retry_transient(&self.retry, "store.merge_update", || {
            self.store.merge_update(id, name, entry)
        })
        .await;

        match merged {
            Ok(record) => {
                debug!(user_id = %id, history_len = record.history.len(), "record merged");
                Ok(WriteOutcome::Applied)
            }
            Err(Exhausted {
                error: StoreError::NotFound { .. },
                ..
            }) => {
                warn!(user_id = %id, "record vanished before merge");
                Ok(WriteOutcome::Conflict)
            }
            Err(exhausted) => Err(store_fault(exhausted)),
        }
    }

    /// Apply an engine mutation
    pub(crate) async fn apply(&self, mutation: &StorageMutation) -> Result<WriteOutcome, ReconError> {
        match mutation {
            StorageMutation::Create(record) => self.create(record).await,
            StorageMutation::MergeUpdate {
                id,
                name,
                history_entry,
            } => self.merge(id, name, history_entry).await,
        }
    }
}

/// Map an exhausted source call
///
/// An unknown key or a malformed payload means the request cannot succeed.
fn source_fault(exhausted: Exhausted<SourceError>) -> ReconError {
    match exhausted.error {
        SourceError::Unavailable { message } => {
            ReconError::unavailable(Collaborator::ExternalSource, exhausted.attempts, message)
        }
        err @ (SourceError::NotFound { .. } | SourceError::InvalidResponse(_)) => {
            ReconError::invalid_input(err.to_string())
        }
        SourceError::Configuration(message) => ReconError::Config(message),
    }
}

fn store_fault(exhausted: Exhausted<StoreError>) -> ReconError {
    ReconError::unavailable(Collaborator::UserStore, exhausted.attempts, exhausted.error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use recon_store::{MemoryUserStore, StaticUserSource};
    use recon_test_utils::{t0, FlakySource, FlakyStore};

    fn collaborators(source: impl ExternalUserSource + 'static, store: Arc<dyn UserStore>) -> Collaborators {
        Collaborators::new(Arc::new(source), store)
            .with_retry(RetryPolicy::new(3).with_initial_backoff(0))
    }

    #[tokio::test]
    async fn unknown_key_is_invalid_input() {
        let gw = collaborators(StaticUserSource::new(), Arc::new(MemoryUserStore::new()));
        let err = gw.fetch_external("nope").await.unwrap_err();
        assert!(err.is_client_fault());
    }

    #[tokio::test]
    async fn empty_identity_is_rejected() {
        let source = StaticUserSource::new().with("1", ExternalIdentity::new("U1", ""));
        let gw = collaborators(source, Arc::new(MemoryUserStore::new()));
        assert!(gw.fetch_external("1").await.unwrap_err().is_client_fault());
    }

    #[tokio::test]
    async fn source_faults_exhaust_policy() {
        let source = FlakySource::new(StaticUserSource::new(), 10);
        let gw = collaborators(source, Arc::new(MemoryUserStore::new()));
        let err = gw.fetch_external("1").await.unwrap_err();
        assert_eq!(
            err,
            ReconError::unavailable(Collaborator::ExternalSource, 3, "injected source fault")
        );
    }

    #[tokio::test]
    async fn landed_create_is_not_repeated() {
        let store = Arc::new(FlakyStore::new(MemoryUserStore::new()).drop_create_acks(1));
        let gw = collaborators(StaticUserSource::new(), store.clone());

        let record = UserRecord::create("U1", "Alice", t0());
        assert_eq!(gw.create(&record).await.unwrap(), WriteOutcome::Applied);
        assert_eq!(store.creates(), 1);
        assert_eq!(store.inner().get("U1"), Some(record));
    }

    #[tokio::test]
    async fn failed_create_is_retried_after_check() {
        let store = Arc::new(FlakyStore::new(MemoryUserStore::new()).fail_creates(1));
        let gw = collaborators(StaticUserSource::new(), store.clone());

        let record = UserRecord::create("U1", "Alice", t0());
        assert_eq!(gw.create(&record).await.unwrap(), WriteOutcome::Applied);
        assert_eq!(store.creates(), 2);
        assert_eq!(store.reads(), 1);
    }

    #[tokio::test]
    async fn racing_create_is_a_conflict() {
        let store = Arc::new(
            FlakyStore::new(MemoryUserStore::new())
                .race_create_with(UserRecord::create("U1", "Racer", t0())),
        );
        let gw = collaborators(StaticUserSource::new(), store);
        let record = UserRecord::create("U1", "Alice", t0());
        assert_eq!(gw.create(&record).await.unwrap(), WriteOutcome::Conflict);
    }

    #[tokio::test]
    async fn merge_on_missing_record_is_a_conflict() {
        let gw = collaborators(StaticUserSource::new(), Arc::new(MemoryUserStore::new()));
        let outcome = gw
            .merge("U1", "Bob", &HistoryEntry::new("Bob", t0()))
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Conflict);
    }
}
