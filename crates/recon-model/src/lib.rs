//! Recon Model
//!
//! Typed data model for user reconciliation:
//! - [`UserRecord`]: the persisted record, one per external identity
//! - [`NameHistory`]: write-once map of observed names to first-seen timestamps
//! - [`ExternalIdentity`]: the upstream view of a user, fetched per request
//! - [`ReconciliationOutcome`]: the response value of one reconciliation
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use recon_model::{UserRecord, UserStatus};
//!
//! let t0 = Utc::now();
//! let mut record = UserRecord::create("U1", "Alice", t0);
//! assert_eq!(record.status, UserStatus::Active);
//!
//! record.apply_rename("Bob", t0);
//! assert_eq!(record.history.len(), 2);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod history;
mod identity;
mod outcome;
mod record;

pub use error::ModelError;
pub use history::{HistoryEntry, NameHistory, Timestamp};
pub use identity::ExternalIdentity;
pub use outcome::ReconciliationOutcome;
pub use record::{UserRecord, UserStatus};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
