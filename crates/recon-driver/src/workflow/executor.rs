//! Workflow interpreter
//!
//! Walks a [`ValidatedWorkflow`] one state at a time. Every state is stamped
//! with the instant it was entered; write tasks use that instant for the
//! history entry they offer to the store.

use super::builder::ValidatedWorkflow;
use super::definition::{State, TaskKind};
use super::error::WorkflowError;
use crate::config::DriverConfig;
use crate::error::ReconError;
use crate::gateway::{Collaborators, WriteOutcome};
use crate::reconciler::Reconciler;
use async_trait::async_trait;
use recon_engine::Clock;
use recon_model::{ExternalIdentity, HistoryEntry, ReconciliationOutcome, Timestamp, UserRecord};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use ulid::Ulid;

/// Finished execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Execution {
    /// Execution id
    pub id: Ulid,
    /// Reported outcome
    pub outcome: ReconciliationOutcome,
    /// States visited, in order
    pub trace: Vec<String>,
    /// Storage conflicts re-resolved along the way
    pub conflicts: u32,
}

/// Data produced by earlier states
#[derive(Debug)]
struct Context<'a> {
    lookup_key: &'a str,
    external: Option<ExternalIdentity>,
    stored: Option<UserRecord>,
}

impl Context<'_> {
    fn external(&self, state: &str) -> Result<&ExternalIdentity, WorkflowError> {
        self.external.as_ref().ok_or_else(|| WorkflowError::MissingContext {
            state: state.to_string(),
            field: "external",
        })
    }
}

/// Declarative realization of the reconciliation driver
#[derive(Debug, Clone)]
pub struct WorkflowDriver {
    workflow: Arc<ValidatedWorkflow>,
    collaborators: Collaborators,
    clock: Arc<dyn Clock>,
    max_conflict_retries: u32,
    max_transitions: u32,
}

impl WorkflowDriver {
    /// Create driver for `workflow`; `config.retry` replaces the collaborators' policy
    pub fn new(
        workflow: ValidatedWorkflow,
        collaborators: Collaborators,
        clock: Arc<dyn Clock>,
        config: &DriverConfig,
    ) -> Self {
        Self {
            workflow: Arc::new(workflow),
            collaborators: collaborators.with_retry(config.retry.clone()),
            clock,
            max_conflict_retries: config.max_conflict_retries,
            max_transitions: config.max_transitions,
        }
    }

    /// Driver for [`ValidatedWorkflow::standard`]
    ///
    /// # Errors
    /// `ReconError::Workflow` if the standard definition fails validation.
    pub fn standard(
        collaborators: Collaborators,
        clock: Arc<dyn Clock>,
        config: &DriverConfig,
    ) -> Result<Self, ReconError> {
        Ok(Self::new(ValidatedWorkflow::standard()?, collaborators, clock, config))
    }

    /// Definition being run
    #[inline]
    #[must_use]
    pub fn workflow(&self) -> &ValidatedWorkflow {
        &self.workflow
    }

    /// Run one execution for `lookup_key`
    ///
    /// # Errors
    /// Collaborator and input errors as for any [`Reconciler`];
    /// `ReconError::Workflow` on a runaway execution.
    #[tracing::instrument(skip(self), fields(driver = "workflow", execution = tracing::field::Empty))]
    pub async fn execute(&self, lookup_key: &str) -> Result<Execution, ReconError> {
        let id = Ulid::new();
        tracing::Span::current().record("execution", tracing::field::display(id));

        let definition = self.workflow.definition();
        let mut ctx = Context {
            lookup_key,
            external: None,
            stored: None,
        };
        let mut trace = Vec::new();
        let mut conflicts = 0;
        let mut transitions = 0;
        let mut current = definition.start_at.clone();

        loop {
            let entered_at = self.clock.now();
            let state = definition
                .states
                .get(&current)
                .ok_or_else(|| WorkflowError::UnknownTarget {
                    state: trace.last().cloned().unwrap_or_default(),
                    target: current.clone(),
                })?;
            debug!(state = %current, "entered state");
            trace.push(current.clone());

            let next = match state {
                State::Pass { result } => {
                    let outcome = result.render(&current, ctx.external.as_ref(), ctx.stored.as_ref())?;
                    info!(user_id = %outcome.id, state = %current, kind = outcome.kind(), "reconciled");
                    return Ok(Execution {
                        id,
                        outcome,
                        trace,
                        conflicts,
                    });
                }
                State::Choice { rules, default } => {
                    let external = ctx.external(&current)?;
                    rules
                        .iter()
                        .find(|rule| rule.guard.matches(external, ctx.stored.as_ref()))
                        .map(|rule| &rule.next)
                        .or(default.as_ref())
                        .cloned()
                        .ok_or_else(|| WorkflowError::NoMatchingRule {
                            state: current.clone(),
                        })?
                }
                State::Task {
                    task,
                    next,
                    on_conflict,
                } => match self.run_task(*task, &current, &mut ctx, entered_at).await? {
                    WriteOutcome::Applied => next.clone(),
                    WriteOutcome::Conflict => {
                        conflicts += 1;
                        let user_id = ctx.external(&current)?.id.clone();
                        match on_conflict {
                            Some(target) if conflicts <= self.max_conflict_retries => {
                                warn!(user_id = %user_id, state = %current, conflicts, "storage conflict, re-entering {target}");
                                // Re-resolution is bounded by the conflict budget alone.
                                transitions = 0;
                                target.clone()
                            }
                            _ => {
                                return Err(ReconError::ConcurrentModification {
                                    id: user_id,
                                    conflicts,
                                })
                            }
                        }
                    }
                },
            };

            transitions += 1;
            if transitions > self.max_transitions {
                return Err(WorkflowError::TransitionLimit {
                    limit: self.max_transitions,
                }
                .into());
            }
            current = next;
        }
    }

    async fn run_task(
        &self,
        task: TaskKind,
        state: &str,
        ctx: &mut Context<'_>,
        entered_at: Timestamp,
    ) -> Result<WriteOutcome, ReconError> {
        match task {
            TaskKind::FetchExternal => {
                ctx.external = Some(self.collaborators.fetch_external(ctx.lookup_key).await?);
                Ok(WriteOutcome::Applied)
            }
            TaskKind::LoadStored => {
                let external = ctx.external(state)?;
                let stored = self.collaborators.load(&external.id).await?;
                if let Some(record) = &stored {
                    record.ensure_identity(&external.id)?;
                }
                ctx.stored = stored;
                Ok(WriteOutcome::Applied)
            }
            TaskKind::CreateRecord => {
                let external = ctx.external(state)?;
                let record = UserRecord::create(external.id.clone(), external.name.clone(), entered_at);
                self.collaborators.create(&record).await
            }
            TaskKind::MergeName => {
                let external = ctx.external(state)?;
                let entry = HistoryEntry::new(external.name.clone(), entered_at);
                self.collaborators.merge(&external.id, &external.name, &entry).await
            }
        }
    }
}

#[async_trait]
impl Reconciler for WorkflowDriver {
    fn name(&self) -> &'static str {
        "workflow"
    }

    async fn reconcile_by_lookup_key(&self, lookup_key: &str) -> Result<ReconciliationOutcome, ReconError> {
        self.execute(lookup_key).await.map(|execution| execution.outcome)
    }
}
