//! Recon Store
//!
//! Collaborator contracts consumed by the reconciliation drivers:
//! - [`ExternalUserSource`]: upstream identity lookup
//! - [`UserStore`]: keyed record store with conditional writes
//!
//! And their adapters:
//! - [`MemoryUserStore`]: concurrent in-memory store, per-key atomic writes
//! - [`StaticUserSource`]: fixed lookup table
//! - [`HttpUserSource`]: REST lookup against `GET {api_url}/{lookup_key}`
//!
//! # Example
//!
//! ```rust,ignore
//! use recon_store::{MemoryUserStore, UserStore, CreateOutcome};
//!
//! let store = MemoryUserStore::new();
//! let created = store.create_if_absent(record.clone()).await?;
//! assert_eq!(created, CreateOutcome::Created);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod contract;
mod error;
mod http;
mod memory;
mod source;

pub use contract::{CreateOutcome, ExternalUserSource, UserStore};
pub use error::{SourceError, StoreError};
pub use http::{HttpUserSource, SourceConfig};
pub use memory::MemoryUserStore;
pub use source::StaticUserSource;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
