use chrono::Duration;
use parking_lot::Mutex;
use recon_engine::Clock;
use recon_model::Timestamp;

use crate::fixtures::t0;

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Clock parked at [`t0`]
    pub fn at_t0() -> Self {
        Self::new(t0())
    }

    pub fn set(&self, at: Timestamp) {
        *self.now.lock() = at;
    }

    pub fn advance(&self, by: Duration) -> Timestamp {
        let mut now = self.now.lock();
        *now += by;
        *now
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::at_t0()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock()
    }
}
