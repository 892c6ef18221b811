//! Collaborator traits
//!
//! Implementations must be shareable across tasks; drivers hold them as
//! `Arc<dyn ...>` handles passed in at construction.

use crate::error::{SourceError, StoreError};
use async_trait::async_trait;
use recon_model::{ExternalIdentity, HistoryEntry, UserRecord};

/// Upstream source of truth for user identities
#[async_trait]
pub trait ExternalUserSource: Send + Sync {
    /// Look up the identity behind `lookup_key`
    ///
    /// # Errors
    /// `SourceError::Unavailable` for transport faults, `NotFound` for an
    /// unknown key, `InvalidResponse` for a malformed payload.
    async fn get(&self, lookup_key: &str) -> Result<ExternalIdentity, SourceError>;
}

/// Result of a conditional create
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The record was written
    Created,
    /// A record with the same key already existed; nothing was written
    AlreadyExists,
}

/// Keyed store of user records
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Point lookup; absence is `Ok(None)`
    async fn get_by_key(&self, id: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Write `record` only if no record with its key exists
    async fn create_if_absent(&self, record: UserRecord) -> Result<CreateOutcome, StoreError>;

    /// Set `name` unconditionally and add `history_entry` only if its name is
    /// not already a history key; returns the updated record
    ///
    /// Must be atomic per key: concurrent merges for the same new name converge
    /// on one timestamp.
    ///
    /// # Errors
    /// `StoreError::NotFound` if no record exists under `id`.
    async fn merge_update(
        &self,
        id: &str,
        name: &str,
        history_entry: &HistoryEntry,
    ) -> Result<UserRecord, StoreError>;
}
