//! Driver conformance harness
//!
//! Runs one fixture table through both realizations, each against its own
//! freshly seeded store and a clock frozen at the same instant, and compares
//! the serialized responses and final store contents byte for byte.

use crate::config::{DriverConfig, DriverKind};
use crate::error::ReconError;
use crate::gateway::Collaborators;
use crate::reconciler::build_reconciler;
use chrono::Duration;
use recon_store::MemoryUserStore;
use recon_test_utils::{seeded_store, source_for, t, Fixture, ManualClock};
use serde::Serialize;
use std::fmt::Write as _;
use std::sync::Arc;

/// Rounds run over the table; the second one sees the first one's writes
pub const ROUNDS: u32 = 2;

/// Responses of both drivers for one fixture in one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixtureComparison {
    /// Fixture label
    pub label: String,
    /// Round number, from 1
    pub round: u32,
    /// Sequential driver response, serialized
    pub sequential: String,
    /// Workflow driver response, serialized
    pub workflow: String,
}

impl FixtureComparison {
    /// Whether both drivers answered identically
    #[inline]
    #[must_use]
    pub fn matches(&self) -> bool {
        self.sequential == self.workflow
    }
}

/// Result of a conformance run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConformanceReport {
    /// Per-fixture comparisons, in run order
    pub comparisons: Vec<FixtureComparison>,
    /// Final store of the sequential run, serialized
    pub sequential_store: String,
    /// Final store of the workflow run, serialized
    pub workflow_store: String,
}

impl ConformanceReport {
    /// Whether every response and both final stores are identical
    #[must_use]
    pub fn passed(&self) -> bool {
        self.comparisons.iter().all(FixtureComparison::matches)
            && self.sequential_store == self.workflow_store
    }

    /// Comparisons that diverged
    pub fn divergences(&self) -> impl Iterator<Item = &FixtureComparison> {
        self.comparisons.iter().filter(|c| !c.matches())
    }

    /// Human-readable summary
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut text = String::new();
        let _ = writeln!(text, "Conformance Report");
        let _ = writeln!(text, "  Comparisons: {}", self.comparisons.len());
        let _ = writeln!(text, "  Divergent responses: {}", self.divergences().count());
        let _ = writeln!(
            text,
            "  Final stores: {}",
            if self.sequential_store == self.workflow_store {
                "identical"
            } else {
                "DIFFER"
            }
        );
        for c in self.divergences() {
            let _ = writeln!(text, "  [round {}] {}", c.round, c.label);
            let _ = writeln!(text, "    sequential: {}", c.sequential);
            let _ = writeln!(text, "    workflow:   {}", c.workflow);
        }
        let _ = write!(text, "  Status: {}", if self.passed() { "PASSED" } else { "FAILED" });
        text
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!("<unserializable: {e}>"))
}

/// Responses of one driver over every round, plus its final store
async fn run_driver(
    kind: DriverKind,
    fixtures: &[Fixture],
    config: &DriverConfig,
) -> Result<(Vec<String>, String), ReconError> {
    let store = Arc::new(seeded_store(fixtures));
    let clock = Arc::new(ManualClock::new(t(3_600)));
    let reconciler = build_reconciler(
        kind,
        Collaborators::new(Arc::new(source_for(fixtures)), store.clone()),
        clock.clone(),
        config,
    )?;

    let mut responses = Vec::new();
    for _ in 0..ROUNDS {
        for fixture in fixtures {
            responses.push(to_json(&reconciler.handle(&fixture.lookup_key).await));
        }
        clock.advance(Duration::seconds(60));
    }
    Ok((responses, snapshot_json(&store)))
}

fn snapshot_json(store: &MemoryUserStore) -> String {
    to_json(&store.snapshot())
}

/// Run `fixtures` through both drivers and compare
///
/// # Errors
/// Only if a driver cannot be built; reconciliation failures are compared,
/// not propagated.
pub async fn run_conformance(
    fixtures: &[Fixture],
    config: &DriverConfig,
) -> Result<ConformanceReport, ReconError> {
    let (sequential, sequential_store) = run_driver(DriverKind::Sequential, fixtures, config).await?;
    let (workflow, workflow_store) = run_driver(DriverKind::Workflow, fixtures, config).await?;

    let labels = (1..=ROUNDS).flat_map(|round| fixtures.iter().map(move |f| (round, f.label)));
    let comparisons = labels
        .zip(sequential.into_iter().zip(workflow))
        .map(|((round, label), (sequential, workflow))| FixtureComparison {
            label: label.to_string(),
            round,
            sequential,
            workflow,
        })
        .collect();

    Ok(ConformanceReport {
        comparisons,
        sequential_store,
        workflow_store,
    })
}
