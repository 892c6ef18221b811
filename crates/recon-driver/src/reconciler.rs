//! Surface offered to a request-handling layer

use crate::config::{DriverConfig, DriverKind};
use crate::error::ReconError;
use crate::gateway::Collaborators;
use crate::response::ApiResponse;
use crate::sequential::SequentialDriver;
use crate::workflow::WorkflowDriver;
use async_trait::async_trait;
use recon_engine::Clock;
use recon_model::ReconciliationOutcome;
use std::sync::Arc;

/// One reconciliation per call, by lookup key
///
/// An outcome is only returned once its mutation, if any, is durable.
#[async_trait]
pub trait Reconciler: Send + Sync {
    /// Realization name for logs
    fn name(&self) -> &'static str;

    /// Fetch, compare, apply and report
    ///
    /// # Errors
    /// See [`ReconError`]; locked and unchanged records are successful outcomes.
    async fn reconcile_by_lookup_key(&self, lookup_key: &str) -> Result<ReconciliationOutcome, ReconError>;

    /// [`Reconciler::reconcile_by_lookup_key`] wrapped in a response envelope
    async fn handle(&self, lookup_key: &str) -> ApiResponse {
        ApiResponse::from_result(&self.reconcile_by_lookup_key(lookup_key).await)
    }
}

/// Build the realization named by `kind`
///
/// # Errors
/// `ReconError::Workflow` if the standard workflow fails validation.
pub fn build_reconciler(
    kind: DriverKind,
    collaborators: Collaborators,
    clock: Arc<dyn Clock>,
    config: &DriverConfig,
) -> Result<Arc<dyn Reconciler>, ReconError> {
    Ok(match kind {
        DriverKind::Sequential => Arc::new(SequentialDriver::new(collaborators, clock, config)),
        DriverKind::Workflow => Arc::new(WorkflowDriver::standard(collaborators, clock, config)?),
    })
}
