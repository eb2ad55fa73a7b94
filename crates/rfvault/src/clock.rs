//! Monotonic uptime clock.
//!
//! Signal timestamps are milliseconds of device uptime, not wall-clock time.
//! The device has no battery-backed RTC, so ages computed from these values
//! are meaningful only within a single boot; timestamps rehydrated from the
//! store after a reboot read as very old.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Source of monotonic millisecond timestamps.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Milliseconds elapsed since the clock's epoch (process start for the
    /// real clock).
    fn now_ms(&self) -> u64;
}

/// The real clock: milliseconds since construction.
#[derive(Debug)]
pub struct UptimeClock {
    started: Instant,
}

impl UptimeClock {
    /// Create a clock whose epoch is now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for UptimeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for UptimeClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// A settable clock for tests and benches.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicU64,
}

impl ManualClock {
    /// Create a manual clock starting at the given time.
    #[must_use]
    pub fn new(now_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(now_ms),
        }
    }

    /// Move the clock to an absolute time.
    pub fn set(&self, now_ms: u64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    /// Advance the clock by a delta.
    pub fn advance(&self, delta_ms: u64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}
