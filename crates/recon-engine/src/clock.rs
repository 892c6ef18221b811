//! Injectable time source
//!
//! History timestamps are taken at decision time, not by storage.

use chrono::Utc;
use recon_model::Timestamp;

/// Source of the "now" used to stamp history entries
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current instant
    fn now(&self) -> Timestamp;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}
