//! Imperative driver
//!
//! fetch external -> load stored -> engine -> apply mutation -> outcome.
//! A storage conflict sends it back to the load step with the same external
//! identity; the engine is pure, so deciding again is always safe.

use crate::config::DriverConfig;
use crate::error::ReconError;
use crate::gateway::{Collaborators, WriteOutcome};
use crate::reconciler::Reconciler;
use async_trait::async_trait;
use recon_engine::{Clock, ReconciliationEngine};
use recon_model::ReconciliationOutcome;
use std::sync::Arc;
use tracing::{info, warn};

/// Sequential realization of the reconciliation driver
#[derive(Debug, Clone)]
pub struct SequentialDriver {
    collaborators: Collaborators,
    engine: ReconciliationEngine,
    max_conflict_retries: u32,
}

impl SequentialDriver {
    /// Create driver; `config.retry` replaces the collaborators' policy
    pub fn new(collaborators: Collaborators, clock: Arc<dyn Clock>, config: &DriverConfig) -> Self {
        Self {
            collaborators: collaborators.with_retry(config.retry.clone()),
            engine: ReconciliationEngine::with_clock(clock),
            max_conflict_retries: config.max_conflict_retries,
        }
    }
}

#[async_trait]
impl Reconciler for SequentialDriver {
    fn name(&self) -> &'static str {
        "sequential"
    }

    #[tracing::instrument(skip(self), fields(driver = "sequential"))]
    async fn reconcile_by_lookup_key(&self, lookup_key: &str) -> Result<ReconciliationOutcome, ReconError> {
        let external = self.collaborators.fetch_external(lookup_key).await?;
        let mut conflicts = 0;

        loop {
            let stored = self.collaborators.load(&external.id).await?;
            let reconciliation = self.engine.reconcile(&external, stored.as_ref())?;
            let decision = reconciliation.decision;
            let (outcome, mutation) = reconciliation.into_parts();

            let Some(mutation) = mutation else {
                info!(user_id = %outcome.id, decision = %decision, "reconciled without mutation");
                return Ok(outcome);
            };

            match self.collaborators.apply(&mutation).await? {
                WriteOutcome::Applied => {
                    info!(user_id = %outcome.id, decision = %decision, "reconciled");
                    return Ok(outcome);
                }
                WriteOutcome::Conflict => {
                    conflicts += 1;
                    if conflicts > self.max_conflict_retries {
                        return Err(ReconError::ConcurrentModification {
                            id: external.id,
                            conflicts,
                        });
                    }
                    warn!(user_id = %external.id, conflicts, "storage conflict, deciding again");
                }
            }
        }
    }
}
