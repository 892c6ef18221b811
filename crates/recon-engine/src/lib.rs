//! Recon Engine
//!
//! Pure decision logic for reconciling an external identity against the
//! stored record. The engine never touches storage: it returns the outcome and
//! a [`StorageMutation`] descriptor for the caller to apply.
//!
//! # Decision order
//!
//! First match wins, in [`DECISION_ORDER`]:
//! 1. stored record is locked: outcome only, no mutation
//! 2. no stored record: create it, history seeded with the current name
//! 3. names equal: no-op
//! 4. names differ: rename, history appended only for a never-seen name
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use recon_engine::{reconcile_at, Decision};
//! use recon_model::ExternalIdentity;
//!
//! let external = ExternalIdentity::new("U1", "Alice");
//! let result = reconcile_at(&external, None, Utc::now()).unwrap();
//! assert_eq!(result.decision, Decision::Insert);
//! assert!(result.outcome.inserted);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod clock;
mod decision;
mod engine;
mod error;
mod mutation;

pub use clock::{Clock, SystemClock};
pub use decision::{decide, Decision, Guard, DECISION_ORDER};
pub use engine::{reconcile_at, Reconciliation, ReconciliationEngine};
pub use error::EngineError;
pub use mutation::StorageMutation;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
