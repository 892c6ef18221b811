//! Workflow definition
//!
//! Named states of three kinds: `Task` calls a collaborator, `Choice` routes
//! on guards from the engine's decision table, `Pass` ends the execution with
//! an outcome built from a template.

use recon_engine::{Decision, Guard};
use recon_model::{ExternalIdentity, ReconciliationOutcome, UserRecord, UserStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::error::WorkflowError;

/// Collaborator call performed by a task state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Fetch the external identity for the request's lookup key
    FetchExternal,
    /// Point lookup of the stored record by external id
    LoadStored,
    /// Create-if-absent, history seeded with the external name
    CreateRecord,
    /// Merge the external name, history entry only if absent
    MergeName,
}

impl TaskKind {
    /// Whether the task writes to the store
    #[inline]
    #[must_use]
    pub fn writes(&self) -> bool {
        matches!(self, TaskKind::CreateRecord | TaskKind::MergeName)
    }
}

/// Guarded transition of a choice state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceRule {
    /// Predicate over `(external, stored)`
    pub guard: Guard,
    /// Target when the guard matches
    pub next: String,
}

/// Where an outcome's name comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameSource {
    /// External identity
    External,
    /// Stored record
    Stored,
}

/// Where an outcome's status comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusSource {
    /// Stored record
    Stored,
    /// Fixed value
    Literal(UserStatus),
}

/// Outcome produced by a terminal state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeTemplate {
    /// Name source
    pub name: NameSource,
    /// Status source
    pub status: StatusSource,
    /// `userLocked` flag
    pub user_locked: bool,
    /// `nameChanged` flag
    pub name_changed: bool,
    /// `inserted` flag
    pub inserted: bool,
}

impl OutcomeTemplate {
    /// Template reporting `decision`
    #[must_use]
    pub fn for_decision(decision: Decision) -> Self {
        let (name, status) = match decision {
            Decision::Locked => (NameSource::Stored, StatusSource::Literal(UserStatus::Locked)),
            Decision::Insert => (NameSource::External, StatusSource::Literal(UserStatus::Active)),
            Decision::Unchanged => (NameSource::Stored, StatusSource::Stored),
            Decision::Rename => (NameSource::External, StatusSource::Stored),
        };
        Self {
            name,
            status,
            user_locked: decision == Decision::Locked,
            name_changed: decision == Decision::Rename,
            inserted: decision == Decision::Insert,
        }
    }

    /// Fill the template
    pub(crate) fn render(
        &self,
        state: &str,
        external: Option<&ExternalIdentity>,
        stored: Option<&UserRecord>,
    ) -> Result<ReconciliationOutcome, WorkflowError> {
        let missing = |field| WorkflowError::MissingContext {
            state: state.to_string(),
            field,
        };
        let external = external.ok_or_else(|| missing("external"))?;

        let name = match self.name {
            NameSource::External => external.name.clone(),
            NameSource::Stored => stored.ok_or_else(|| missing("stored"))?.name.clone(),
        };
        let status = match self.status {
            StatusSource::Literal(status) => status,
            StatusSource::Stored => stored.ok_or_else(|| missing("stored"))?.status,
        };

        Ok(ReconciliationOutcome {
            id: external.id.clone(),
            name,
            status,
            user_locked: self.user_locked,
            name_changed: self.name_changed,
            inserted: self.inserted,
        })
    }
}

/// One named state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum State {
    /// Collaborator call
    Task {
        /// What to call
        task: TaskKind,
        /// Target on success
        next: String,
        /// Target when a write loses a race
        #[serde(default, skip_serializing_if = "Option::is_none")]
        on_conflict: Option<String>,
    },
    /// Ordered guarded branch; first match wins
    Choice {
        /// Rules in evaluation order
        rules: Vec<ChoiceRule>,
        /// Target when no rule matches
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },
    /// Terminal state
    Pass {
        /// Outcome to report
        result: OutcomeTemplate,
    },
}

impl State {
    /// Every state this one can transition to
    #[must_use]
    pub fn targets(&self) -> Vec<&str> {
        match self {
            State::Task {
                next, on_conflict, ..
            } => std::iter::once(next.as_str())
                .chain(on_conflict.as_deref())
                .collect(),
            State::Choice { rules, default } => rules
                .iter()
                .map(|r| r.next.as_str())
                .chain(default.as_deref())
                .collect(),
            State::Pass { .. } => Vec::new(),
        }
    }

    /// Whether execution ends here
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, State::Pass { .. })
    }
}

/// Unvalidated workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// Entry state
    pub start_at: String,
    /// States by name
    pub states: BTreeMap<String, State>,
}
