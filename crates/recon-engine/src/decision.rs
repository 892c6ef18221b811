//! Decision table
//!
//! Guards are raw predicates over `(external, stored)`; they overlap (a locked
//! record with a drifted name matches both `Locked` and `NameChanged`), so the
//! order of [`DECISION_ORDER`] is part of the contract.

use recon_model::{ExternalIdentity, UserRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Action chosen for one reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Stored record is locked; leave it alone
    Locked,
    /// Identity never seen; create the record
    Insert,
    /// Stored name matches; nothing to do
    Unchanged,
    /// Stored name differs; rename and append history
    Rename,
}

impl Decision {
    /// Whether this decision produces a storage mutation
    #[inline]
    #[must_use]
    pub fn mutates(&self) -> bool {
        matches!(self, Decision::Insert | Decision::Rename)
    }

    /// Short label for logs
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Locked => "locked",
            Decision::Insert => "insert",
            Decision::Unchanged => "unchanged",
            Decision::Rename => "rename",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Guard of one branch in the decision table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Guard {
    /// Stored record present with status `LOCKED`
    Locked,
    /// No stored record
    Absent,
    /// Stored record present and its name equals the external name
    NameUnchanged,
    /// Stored record present and its name differs from the external name
    NameChanged,
}

/// Branch precedence; first matching guard wins
pub const DECISION_ORDER: [Guard; 4] = [
    Guard::Locked,
    Guard::Absent,
    Guard::NameUnchanged,
    Guard::NameChanged,
];

impl Guard {
    /// Evaluate the raw predicate
    #[must_use]
    pub fn matches(&self, external: &ExternalIdentity, stored: Option<&UserRecord>) -> bool {
        match (self, stored) {
            (Guard::Locked, Some(record)) => record.is_locked(),
            (Guard::Absent, None) => true,
            (Guard::NameUnchanged, Some(record)) => record.name == external.name,
            (Guard::NameChanged, Some(record)) => record.name != external.name,
            _ => false,
        }
    }

    /// Decision taken when this guard wins
    #[inline]
    #[must_use]
    pub fn decision(&self) -> Decision {
        match self {
            Guard::Locked => Decision::Locked,
            Guard::Absent => Decision::Insert,
            Guard::NameUnchanged => Decision::Unchanged,
            Guard::NameChanged => Decision::Rename,
        }
    }

    /// Whether the guard compares names
    #[inline]
    #[must_use]
    pub fn compares_names(&self) -> bool {
        matches!(self, Guard::NameUnchanged | Guard::NameChanged)
    }
}

/// Pick the decision for `(external, stored)`
///
/// Evaluated in [`DECISION_ORDER`]: the lock check precedes every name
/// comparison.
#[must_use]
pub fn decide(external: &ExternalIdentity, stored: Option<&UserRecord>) -> Decision {
    // Absent and the two name guards partition every input.
    DECISION_ORDER
        .iter()
        .find(|guard| guard.matches(external, stored))
        .map_or(Decision::Insert, Guard::decision)
}
