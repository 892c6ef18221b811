//! Reconciliation outcome descriptor

use crate::record::UserStatus;
use serde::{Deserialize, Serialize};

/// Normalized result of one reconciliation
///
/// At most one of `inserted` / `name_changed` is set; both are clear for a
/// no-op and for a locked short-circuit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationOutcome {
    /// External identity
    pub id: String,
    /// Name the record carries after reconciliation
    pub name: String,
    /// Status the record carries after reconciliation
    pub status: UserStatus,
    /// The stored record was locked and left untouched
    pub user_locked: bool,
    /// An existing record was renamed
    pub name_changed: bool,
    /// A new record was created
    pub inserted: bool,
}

impl ReconciliationOutcome {
    /// Whether this outcome corresponds to a storage mutation
    #[inline]
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        self.inserted || self.name_changed
    }

    /// Short label for logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match (self.user_locked, self.inserted, self.name_changed) {
            (true, _, _) => "locked",
            (_, true, _) => "inserted",
            (_, _, true) => "renamed",
            _ => "unchanged",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ReconciliationOutcome {
        ReconciliationOutcome {
            id: "U1".to_string(),
            name: "Alice".to_string(),
            status: UserStatus::Active,
            user_locked: false,
            name_changed: false,
            inserted: true,
        }
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(
            json,
            r#"{"id":"U1","name":"Alice","status":"ACTIVE","userLocked":false,"nameChanged":false,"inserted":true}"#
        );
    }

    #[test]
    fn kind_and_mutation_flags() {
        let inserted = sample();
        assert!(inserted.is_mutation());
        assert_eq!(inserted.kind(), "inserted");

        let noop = ReconciliationOutcome {
            inserted: false,
            ..sample()
        };
        assert!(!noop.is_mutation());
        assert_eq!(noop.kind(), "unchanged");
    }
}
