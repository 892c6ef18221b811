//! Recon Driver
//!
//! Orchestration around the pure engine: fetch the external identity, load the
//! stored record, decide, apply the mutation, report the outcome. Two
//! realizations share one decision table and must answer identically:
//! - [`SequentialDriver`]: imperative steps around [`recon_engine::ReconciliationEngine`]
//! - [`WorkflowDriver`]: a validated state machine ([`workflow`]) whose choice
//!   rules are the engine's guards in table order
//!
//! # Example
//!
//! ```rust
//! use recon_driver::{build_reconciler, Collaborators, DriverConfig, DriverKind, Reconciler};
//! use recon_engine::SystemClock;
//! use recon_model::ExternalIdentity;
//! use recon_store::{MemoryUserStore, StaticUserSource};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), recon_driver::ReconError> {
//! let source = StaticUserSource::new().with("42", ExternalIdentity::new("EXTERNAL#42", "Alice"));
//! let store = Arc::new(MemoryUserStore::new());
//! let reconciler = build_reconciler(
//!     DriverKind::Workflow,
//!     Collaborators::new(Arc::new(source), store.clone()),
//!     Arc::new(SystemClock),
//!     &DriverConfig::default(),
//! )?;
//!
//! let outcome = reconciler.reconcile_by_lookup_key("42").await?;
//! assert!(outcome.inserted);
//! assert_eq!(store.len(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod conformance;
mod config;
mod error;
mod gateway;
mod reconciler;
mod response;
mod retry;
mod sequential;
pub mod workflow;

pub use config::{AppConfig, DriverConfig, DriverKind, RetryPolicy, ENV_API_URL, ENV_TABLE_NAME};
pub use error::{Collaborator, ReconError};
pub use gateway::Collaborators;
pub use reconciler::{build_reconciler, Reconciler};
pub use response::ApiResponse;
pub use sequential::SequentialDriver;
pub use workflow::{Execution, ValidatedWorkflow, WorkflowDriver, WorkflowError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
