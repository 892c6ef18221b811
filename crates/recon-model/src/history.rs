//! First-write-wins name history
//!
//! Every name a user has been observed with maps to the moment it was first
//! recorded. Entries are never overwritten and never removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Timestamp used for history entries
pub type Timestamp = DateTime<Utc>;

/// One `(name, first-seen)` pair offered for insertion
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Observed name
    pub name: String,
    /// Candidate first-seen timestamp
    pub observed_at: Timestamp,
}

impl HistoryEntry {
    /// Create new entry
    #[inline]
    pub fn new(name: impl Into<String>, observed_at: Timestamp) -> Self {
        Self {
            name: name.into(),
            observed_at,
        }
    }
}

/// Write-once map of names to first-observed timestamps
///
/// The only mutation is [`NameHistory::record_if_absent`]; there is no way to
/// replace or drop an existing entry through this type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameHistory {
    entries: BTreeMap<String, Timestamp>,
}

impl NameHistory {
    /// Create empty history
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create history holding exactly one entry
    #[must_use]
    pub fn seeded(name: impl Into<String>, observed_at: Timestamp) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(name.into(), observed_at);
        Self { entries }
    }

    /// Insert `name` only if it has never been recorded
    ///
    /// Returns `true` if the entry was added.
    pub fn record_if_absent(&mut self, name: impl Into<String>, observed_at: Timestamp) -> bool {
        match self.entries.entry(name.into()) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(observed_at);
                true
            }
            std::collections::btree_map::Entry::Occupied(_) => false,
        }
    }

    /// Insert an entry only if its name has never been recorded
    #[inline]
    pub fn record_entry_if_absent(&mut self, entry: &HistoryEntry) -> bool {
        self.record_if_absent(entry.name.clone(), entry.observed_at)
    }

    /// First-observed timestamp of `name`
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Timestamp> {
        self.entries.get(name).copied()
    }

    /// Whether `name` has been recorded
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of recorded names
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no name has been recorded
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Timestamp)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Check that `self` keeps every entry of `earlier` with its original timestamp
    #[must_use]
    pub fn preserves(&self, earlier: &NameHistory) -> bool {
        earlier
            .entries
            .iter()
            .all(|(name, at)| self.entries.get(name) == Some(at))
    }
}

impl<S: Into<String>> FromIterator<(S, Timestamp)> for NameHistory {
    /// Build a history; on duplicate names the first occurrence wins
    fn from_iter<I: IntoIterator<Item = (S, Timestamp)>>(iter: I) -> Self {
        let mut history = Self::new();
        for (name, at) in iter {
            history.record_if_absent(name, at);
        }
        history
    }
}
