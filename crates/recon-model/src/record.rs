//! Persisted user record

use crate::error::ModelError;
use crate::history::{HistoryEntry, NameHistory, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reconciliation status of a stored record
///
/// `Locked` is set out of band by an administrator; reconciliation only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    /// Record follows the external source
    #[default]
    Active,
    /// Record is frozen against reconciliation
    Locked,
}

impl UserStatus {
    /// Wire representation
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "ACTIVE",
            UserStatus::Locked => "LOCKED",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored user record, keyed by the external identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// External identity, immutable once created
    pub id: String,
    /// Current display name
    pub name: String,
    /// Reconciliation status
    #[serde(default)]
    pub status: UserStatus,
    /// Names ever observed with their first-seen timestamps
    #[serde(default)]
    pub history: NameHistory,
}

impl UserRecord {
    /// Create a first-sighting record: `Active`, history seeded with `name`
    pub fn create(id: impl Into<String>, name: impl Into<String>, created_at: Timestamp) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            history: NameHistory::seeded(name.clone(), created_at),
            name,
            status: UserStatus::Active,
        }
    }

    /// Same record with a different status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: UserStatus) -> Self {
        self.status = status;
        self
    }

    /// Same record with an explicit history
    #[inline]
    #[must_use]
    pub fn with_history(mut self, history: NameHistory) -> Self {
        self.history = history;
        self
    }

    /// Whether the record is frozen against reconciliation
    #[inline]
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.status == UserStatus::Locked
    }

    /// Set `name` and record it in history if never seen before
    ///
    /// Returns `true` if a history entry was added.
    pub fn apply_rename(&mut self, name: impl Into<String>, observed_at: Timestamp) -> bool {
        let name = name.into();
        let appended = self.history.record_if_absent(name.clone(), observed_at);
        self.name = name;
        appended
    }

    /// [`UserRecord::apply_rename`] driven by a prepared history entry
    pub fn apply_merge(&mut self, name: &str, entry: &HistoryEntry) -> bool {
        self.name = name.to_string();
        self.history.record_entry_if_absent(entry)
    }

    /// Check the record belongs to identity `id`
    ///
    /// # Errors
    /// `ModelError::IdMismatch` when the record carries a different identity.
    pub fn ensure_identity(&self, id: &str) -> Result<(), ModelError> {
        if self.id == id {
            Ok(())
        } else {
            Err(ModelError::id_mismatch(id, self.id.clone()))
        }
    }
}
