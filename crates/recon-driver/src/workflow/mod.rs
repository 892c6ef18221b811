//! Declarative reconciliation workflow
//!
//! The same decision procedure as the sequential driver, expressed as a
//! validated state machine whose choice rules come from the engine's
//! decision table.

mod builder;
mod definition;
mod error;
mod executor;

pub use builder::{ValidatedWorkflow, WorkflowBuilder};
pub use definition::{
    ChoiceRule, NameSource, OutcomeTemplate, State, StatusSource, TaskKind, WorkflowDefinition,
};
pub use error::WorkflowError;
pub use executor::{Execution, WorkflowDriver};
