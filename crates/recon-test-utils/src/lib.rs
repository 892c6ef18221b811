//! Testing utilities for the recon workspace
//!
//! Shared fixtures, a hand-driven clock, and collaborator wrappers that
//! inject faults.

#![allow(missing_docs)]

mod clock;
mod faults;
mod fixtures;

pub use clock::ManualClock;
pub use faults::{FlakySource, FlakyStore};
pub use fixtures::{fixture_table, seeded_store, source_for, t, t0, Fixture};
