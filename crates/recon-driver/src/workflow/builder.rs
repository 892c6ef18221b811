//! Workflow construction and validation
//!
//! Definitions are checked once, when built. The executor only accepts a
//! [`ValidatedWorkflow`] and does no structural checks of its own.

use super::definition::{ChoiceRule, OutcomeTemplate, State, TaskKind, WorkflowDefinition};
use super::error::WorkflowError;
use recon_engine::{Decision, Guard, DECISION_ORDER};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet, VecDeque};

/// Builder for [`ValidatedWorkflow`]
///
/// ```rust
/// use recon_driver::workflow::{OutcomeTemplate, TaskKind, WorkflowBuilder};
/// use recon_engine::Decision;
///
/// let workflow = WorkflowBuilder::new("Fetch")
///     .task("Fetch", TaskKind::FetchExternal, "Load")
///     .task("Load", TaskKind::LoadStored, "Done")
///     .pass("Done", OutcomeTemplate::for_decision(Decision::Unchanged))
///     .build()
///     .unwrap();
/// assert_eq!(workflow.definition().states.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct WorkflowBuilder {
    start_at: String,
    states: BTreeMap<String, State>,
    duplicate: Option<String>,
}

impl WorkflowBuilder {
    /// Start a workflow entered at `start_at`
    pub fn new(start_at: impl Into<String>) -> Self {
        Self {
            start_at: start_at.into(),
            states: BTreeMap::new(),
            duplicate: None,
        }
    }

    /// Add any state
    #[must_use]
    pub fn state(mut self, name: impl Into<String>, state: State) -> Self {
        let name = name.into();
        if self.states.contains_key(&name) {
            self.duplicate.get_or_insert(name);
        } else {
            self.states.insert(name, state);
        }
        self
    }

    /// Add a task without conflict handling
    #[must_use]
    pub fn task(self, name: impl Into<String>, task: TaskKind, next: impl Into<String>) -> Self {
        self.state(
            name,
            State::Task {
                task,
                next: next.into(),
                on_conflict: None,
            },
        )
    }

    /// Add a write task that goes to `on_conflict` when it loses a race
    #[must_use]
    pub fn write_task(
        self,
        name: impl Into<String>,
        task: TaskKind,
        next: impl Into<String>,
        on_conflict: impl Into<String>,
    ) -> Self {
        self.state(
            name,
            State::Task {
                task,
                next: next.into(),
                on_conflict: Some(on_conflict.into()),
            },
        )
    }

    /// Add a choice with explicit rules
    #[must_use]
    pub fn choice(self, name: impl Into<String>, rules: Vec<ChoiceRule>) -> Self {
        self.state(
            name,
            State::Choice {
                rules,
                default: None,
            },
        )
    }

    /// Add a choice with one rule per entry of the engine's decision table,
    /// in table order
    #[must_use]
    pub fn choice_from_table(self, name: impl Into<String>, target: impl Fn(Decision) -> String) -> Self {
        let rules = DECISION_ORDER
            .iter()
            .map(|guard| ChoiceRule {
                guard: *guard,
                next: target(guard.decision()),
            })
            .collect();
        self.choice(name, rules)
    }

    /// Add a terminal state
    #[must_use]
    pub fn pass(self, name: impl Into<String>, result: OutcomeTemplate) -> Self {
        self.state(name, State::Pass { result })
    }

    /// Validate and seal
    ///
    /// # Errors
    /// The first [`WorkflowError`] found.
    pub fn build(self) -> Result<ValidatedWorkflow, WorkflowError> {
        if let Some(name) = self.duplicate {
            return Err(WorkflowError::DuplicateState(name));
        }
        validate(WorkflowDefinition {
            start_at: self.start_at,
            states: self.states,
        })
    }
}

/// Workflow that passed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidatedWorkflow {
    definition: WorkflowDefinition,
}

impl ValidatedWorkflow {
    /// Underlying definition
    #[inline]
    #[must_use]
    pub fn definition(&self) -> &WorkflowDefinition {
        &self.definition
    }

    /// Canonical reconciliation workflow
    ///
    /// ```text
    /// FetchExternalUser -> LoadStoredUser -> CheckStoredUser
    ///   locked          -> UserLocked
    ///   absent          -> InsertUser  -> Inserted     (conflict: LoadStoredUser)
    ///   name_unchanged  -> NoChange
    ///   name_changed    -> UpdateName  -> NameChanged  (conflict: LoadStoredUser)
    /// ```
    ///
    /// # Errors
    /// Never in practice; the definition is static.
    pub fn standard() -> Result<Self, WorkflowError> {
        WorkflowBuilder::new("FetchExternalUser")
            .task("FetchExternalUser", TaskKind::FetchExternal, "LoadStoredUser")
            .task("LoadStoredUser", TaskKind::LoadStored, "CheckStoredUser")
            .choice_from_table("CheckStoredUser", |decision| {
                let target = match decision {
                    Decision::Locked => "UserLocked",
                    Decision::Insert => "InsertUser",
                    Decision::Unchanged => "NoChange",
                    Decision::Rename => "UpdateName",
                };
                target.to_string()
            })
            .write_task("InsertUser", TaskKind::CreateRecord, "Inserted", "LoadStoredUser")
            .write_task("UpdateName", TaskKind::MergeName, "NameChanged", "LoadStoredUser")
            .pass("UserLocked", OutcomeTemplate::for_decision(Decision::Locked))
            .pass("NoChange", OutcomeTemplate::for_decision(Decision::Unchanged))
            .pass("Inserted", OutcomeTemplate::for_decision(Decision::Insert))
            .pass("NameChanged", OutcomeTemplate::for_decision(Decision::Rename))
            .build()
    }
}

impl TryFrom<WorkflowDefinition> for ValidatedWorkflow {
    type Error = WorkflowError;

    fn try_from(definition: WorkflowDefinition) -> Result<Self, Self::Error> {
        validate(definition)
    }
}

fn validate(definition: WorkflowDefinition) -> Result<ValidatedWorkflow, WorkflowError> {
    if !definition.states.contains_key(&definition.start_at) {
        return Err(WorkflowError::MissingStartState(definition.start_at));
    }

    for (name, state) in &definition.states {
        for target in state.targets() {
            if !definition.states.contains_key(target) {
                return Err(WorkflowError::UnknownTarget {
                    state: name.clone(),
                    target: target.to_string(),
                });
            }
        }
        check_state(name, state)?;
    }

    let reachable = reachable_from(&definition);
    if let Some(orphan) = definition.states.keys().find(|n| !reachable.contains(n.as_str())) {
        return Err(WorkflowError::Unreachable(orphan.clone()));
    }

    if !definition.states.values().any(State::is_terminal) {
        return Err(WorkflowError::NoTerminalState);
    }

    Ok(ValidatedWorkflow { definition })
}

fn check_state(name: &str, state: &State) -> Result<(), WorkflowError> {
    match state {
        State::Task {
            task,
            on_conflict: Some(_),
            ..
        } if !task.writes() => Err(WorkflowError::ConflictOnReadTask(name.to_string())),
        State::Choice { rules, default } => {
            if rules.is_empty() && default.is_none() {
                return Err(WorkflowError::EmptyChoice(name.to_string()));
            }
            // Guards overlap: a locked record with a drifted name also
            // matches `name_changed`.
            let lock = rules.iter().position(|r| r.guard == Guard::Locked);
            let first_compare = rules.iter().position(|r| r.guard.compares_names());
            match (first_compare, lock) {
                (Some(compare), Some(lock)) if lock < compare => Ok(()),
                (Some(_), _) => Err(WorkflowError::LockGuardNotFirst {
                    state: name.to_string(),
                }),
                (None, _) => Ok(()),
            }
        }
        _ => Ok(()),
    }
}

fn reachable_from(definition: &WorkflowDefinition) -> HashSet<&str> {
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([definition.start_at.as_str()]);
    while let Some(name) = queue.pop_front() {
        if !seen.insert(name) {
            continue;
        }
        if let Some(state) = definition.states.get(name) {
            queue.extend(state.targets());
        }
    }
    seen
}
