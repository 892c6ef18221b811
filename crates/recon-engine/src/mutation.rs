//! Storage mutation descriptors
//!
//! What the caller must apply to the user store after a mutating decision.

use recon_model::{HistoryEntry, UserRecord};

/// Mutation computed by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageMutation {
    /// Create the record if it does not exist yet
    Create(UserRecord),

    /// Set `name`; add `history_entry` only if its name is not yet a key
    MergeUpdate {
        /// Record key
        id: String,
        /// New display name
        name: String,
        /// First-write-wins history candidate
        history_entry: HistoryEntry,
    },
}

impl StorageMutation {
    /// Key of the record this mutation targets
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            StorageMutation::Create(record) => &record.id,
            StorageMutation::MergeUpdate { id, .. } => id,
        }
    }

    /// Apply the mutation to an in-memory view of the stored record
    ///
    /// `Create` leaves an existing record untouched; `MergeUpdate` on an
    /// absent record yields `None`.
    #[must_use]
    pub fn apply_to(&self, current: Option<UserRecord>) -> Option<UserRecord> {
        match (self, current) {
            (StorageMutation::Create(record), None) => Some(record.clone()),
            (StorageMutation::Create(_), Some(existing)) => Some(existing),
            (StorageMutation::MergeUpdate { .. }, None) => None,
            (
                StorageMutation::MergeUpdate {
                    name,
                    history_entry,
                    ..
                },
                Some(mut existing),
            ) => {
                existing.apply_merge(name, history_entry);
                Some(existing)
            }
        }
    }
}
