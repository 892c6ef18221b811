//! Malformed workflow definitions are rejected before anything runs

use pretty_assertions::assert_eq;
use recon_driver::workflow::{
    ChoiceRule, OutcomeTemplate, State, TaskKind, ValidatedWorkflow, WorkflowBuilder, WorkflowDefinition,
    WorkflowError,
};
use recon_engine::{Decision, Guard};

fn rule(guard: Guard, next: &str) -> ChoiceRule {
    ChoiceRule {
        guard,
        next: next.to_string(),
    }
}

/// Fetch, load, then the given choice over four terminal states
fn with_choice(rules: Vec<ChoiceRule>) -> WorkflowBuilder {
    WorkflowBuilder::new("Fetch")
        .task("Fetch", TaskKind::FetchExternal, "Load")
        .task("Load", TaskKind::LoadStored, "Check")
        .choice("Check", rules)
        .pass("Locked", OutcomeTemplate::for_decision(Decision::Locked))
        .pass("Insert", OutcomeTemplate::for_decision(Decision::Insert))
        .pass("Same", OutcomeTemplate::for_decision(Decision::Unchanged))
        .pass("Rename", OutcomeTemplate::for_decision(Decision::Rename))
}

#[test]
fn table_order_builds() {
    let built = with_choice(vec![
        rule(Guard::Locked, "Locked"),
        rule(Guard::Absent, "Insert"),
        rule(Guard::NameUnchanged, "Same"),
        rule(Guard::NameChanged, "Rename"),
    ])
    .build();
    assert!(built.is_ok());
}

#[test]
fn lock_tested_last_is_rejected() {
    // A locked record with a drifted name would be renamed.
    let err = with_choice(vec![
        rule(Guard::Absent, "Insert"),
        rule(Guard::NameUnchanged, "Same"),
        rule(Guard::NameChanged, "Rename"),
        rule(Guard::Locked, "Locked"),
    ])
    .build()
    .unwrap_err();
    assert_eq!(err, WorkflowError::LockGuardNotFirst { state: "Check".into() });
}

#[test]
fn name_compare_without_lock_is_rejected() {
    let err = WorkflowBuilder::new("Fetch")
        .task("Fetch", TaskKind::FetchExternal, "Load")
        .task("Load", TaskKind::LoadStored, "Check")
        .choice(
            "Check",
            vec![rule(Guard::Absent, "Insert"), rule(Guard::NameChanged, "Rename")],
        )
        .pass("Insert", OutcomeTemplate::for_decision(Decision::Insert))
        .pass("Rename", OutcomeTemplate::for_decision(Decision::Rename))
        .build()
        .unwrap_err();
    assert!(matches!(err, WorkflowError::LockGuardNotFirst { .. }));
}

#[test]
fn dangling_target_is_rejected() {
    let err = with_choice(vec![
        rule(Guard::Locked, "Locked"),
        rule(Guard::Absent, "Create"),
    ])
    .build()
    .unwrap_err();
    assert_eq!(
        err,
        WorkflowError::UnknownTarget {
            state: "Check".into(),
            target: "Create".into()
        }
    );
}

#[test]
fn unreachable_state_is_rejected() {
    let err = with_choice(vec![
        rule(Guard::Locked, "Locked"),
        rule(Guard::Absent, "Insert"),
        rule(Guard::NameUnchanged, "Same"),
    ])
    .build()
    .unwrap_err();
    assert_eq!(err, WorkflowError::Unreachable("Rename".into()));
}

#[test]
fn workflow_without_terminal_is_rejected() {
    let err = WorkflowBuilder::new("Fetch")
        .task("Fetch", TaskKind::FetchExternal, "Load")
        .task("Load", TaskKind::LoadStored, "Fetch")
        .build()
        .unwrap_err();
    assert_eq!(err, WorkflowError::NoTerminalState);
}

#[test]
fn missing_start_is_rejected() {
    let err = WorkflowBuilder::new("Begin")
        .pass("Done", OutcomeTemplate::for_decision(Decision::Unchanged))
        .build()
        .unwrap_err();
    assert_eq!(err, WorkflowError::MissingStartState("Begin".into()));
}

#[test]
fn empty_choice_is_rejected() {
    let err = WorkflowBuilder::new("Check")
        .choice("Check", Vec::new())
        .build()
        .unwrap_err();
    assert_eq!(err, WorkflowError::EmptyChoice("Check".into()));
}

#[test]
fn choice_with_default_only_is_accepted() {
    let built = WorkflowBuilder::new("Check")
        .state(
            "Check",
            State::Choice {
                rules: Vec::new(),
                default: Some("Done".into()),
            },
        )
        .pass("Done", OutcomeTemplate::for_decision(Decision::Unchanged))
        .build();
    assert!(built.is_ok());
}

#[test]
fn loaded_definition_with_lock_last_is_rejected() {
    let mut json = serde_json::to_value(ValidatedWorkflow::standard().unwrap()).unwrap();
    let rules = json["states"]["CheckStoredUser"]["rules"].as_array_mut().unwrap();
    rules.rotate_left(1);
    assert_eq!(rules[3]["guard"], "locked");

    let definition: WorkflowDefinition = serde_json::from_value(json).unwrap();
    assert_eq!(
        ValidatedWorkflow::try_from(definition).unwrap_err(),
        WorkflowError::LockGuardNotFirst {
            state: "CheckStoredUser".into()
        }
    );
}
