/// Workflow construction and execution errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    /// Two states share a name
    #[error("duplicate state '{0}'")]
    DuplicateState(String),

    /// `start_at` names no state
    #[error("start state '{0}' is not defined")]
    MissingStartState(String),

    /// A transition points at an undefined state
    #[error("state '{state}' transitions to undefined state '{target}'")]
    UnknownTarget {
        /// Source state
        state: String,
        /// Missing target
        target: String,
    },

    /// State cannot be reached from the start state
    #[error("state '{0}' is unreachable")]
    Unreachable(String),

    /// A choice compares names without first checking the lock
    #[error("choice '{state}' must test the lock before comparing names")]
    LockGuardNotFirst {
        /// Offending choice
        state: String,
    },

    /// A choice with neither rules nor default
    #[error("choice '{0}' has no rules")]
    EmptyChoice(String),

    /// `on_conflict` on a task that never writes
    #[error("task '{0}' cannot conflict; only write tasks take on_conflict")]
    ConflictOnReadTask(String),

    /// No terminal state
    #[error("workflow has no terminal state")]
    NoTerminalState,

    /// No rule matched and no default
    #[error("no rule of choice '{state}' matched")]
    NoMatchingRule {
        /// Choice state
        state: String,
    },

    /// A state ran before the data it needs was produced
    #[error("state '{state}' needs '{field}' which no earlier state produced")]
    MissingContext {
        /// State that failed
        state: String,
        /// Missing datum
        field: &'static str,
    },

    /// Execution exceeded the transition limit
    #[error("execution exceeded {limit} transitions")]
    TransitionLimit {
        /// Configured limit
        limit: u32,
    },
}
