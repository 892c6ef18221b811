//! Reconcile operation
//!
//! Pure function of `(external, stored, now)`. Safe to call from any number of
//! threads or tasks at once; holds no mutable state.

use crate::clock::{Clock, SystemClock};
use crate::decision::{decide, Decision};
use crate::error::EngineError;
use crate::mutation::StorageMutation;
use recon_model::{
    ExternalIdentity, HistoryEntry, ReconciliationOutcome, Timestamp, UserRecord, UserStatus,
};
use std::sync::Arc;

/// Result of one reconcile call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Branch taken
    pub decision: Decision,
    /// Response value
    pub outcome: ReconciliationOutcome,
    /// Mutation to apply, if any
    pub mutation: Option<StorageMutation>,
}

impl Reconciliation {
    /// Split into `(outcome, mutation)`
    #[inline]
    #[must_use]
    pub fn into_parts(self) -> (ReconciliationOutcome, Option<StorageMutation>) {
        (self.outcome, self.mutation)
    }
}

/// Reconcile `external` against `stored` at instant `now`
///
/// # Errors
/// `EngineError::InvalidInput` if `external.id` or `external.name` is empty,
/// or if `stored` belongs to a different identity.
pub fn reconcile_at(
    external: &ExternalIdentity,
    stored: Option<&UserRecord>,
    now: Timestamp,
) -> Result<Reconciliation, EngineError> {
    external.validate()?;
    if let Some(record) = stored {
        record.ensure_identity(&external.id)?;
    }

    let decision = decide(external, stored);
    let id = external.id.clone();

    let (outcome, mutation) = match (decision, stored) {
        (Decision::Locked, Some(record)) => (
            ReconciliationOutcome {
                id,
                name: record.name.clone(),
                status: UserStatus::Locked,
                user_locked: true,
                name_changed: false,
                inserted: false,
            },
            None,
        ),
        (Decision::Unchanged, Some(record)) => (
            ReconciliationOutcome {
                id,
                name: record.name.clone(),
                status: record.status,
                user_locked: false,
                name_changed: false,
                inserted: false,
            },
            None,
        ),
        (Decision::Rename, Some(record)) => (
            ReconciliationOutcome {
                id: id.clone(),
                name: external.name.clone(),
                status: record.status,
                user_locked: false,
                name_changed: true,
                inserted: false,
            },
            Some(StorageMutation::MergeUpdate {
                id,
                name: external.name.clone(),
                history_entry: HistoryEntry::new(external.name.clone(), now),
            }),
        ),
        (Decision::Insert, _) | (_, None) => (
            ReconciliationOutcome {
                id: id.clone(),
                name: external.name.clone(),
                status: UserStatus::Active,
                user_locked: false,
                name_changed: false,
                inserted: true,
            },
            Some(StorageMutation::Create(UserRecord::create(
                id,
                external.name.clone(),
                now,
            ))),
        ),
    };

    Ok(Reconciliation {
        decision,
        outcome,
        mutation,
    })
}

/// Reconciliation engine bound to a clock
#[derive(Debug, Clone)]
pub struct ReconciliationEngine {
    clock: Arc<dyn Clock>,
}

impl ReconciliationEngine {
    /// Create engine using the wall clock
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create engine with a custom clock
    #[inline]
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Shared clock handle
    #[inline]
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Reconcile at the clock's current instant
    ///
    /// # Errors
    /// See [`reconcile_at`].
    pub fn reconcile(
        &self,
        external: &ExternalIdentity,
        stored: Option<&UserRecord>,
    ) -> Result<Reconciliation, EngineError> {
        reconcile_at(external, stored, self.clock.now())
    }
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new()
    }
}
