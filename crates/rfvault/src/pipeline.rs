//! The capture pipeline.
//!
//! A tokio task that polls the transceiver on a fixed interval and feeds
//! decoded codes into the archive. The pipeline has two states driven by the
//! persisted sniffing toggle: while disarmed it skips the poll entirely;
//! while armed it reads at most one decoded triple per tick.
//!
//! Feedback (tones, LED) fires only after the archive lock is released, so
//! a tone playing never stalls a concurrent request handler.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, trace};

use crate::archive::{Archive, InsertOutcome};
use crate::clock::Clock;
use crate::feedback::{Feedback, RECEIVE_FLASH};
use crate::radio::Transceiver;
use crate::toggles::Toggles;

/// Timestamp cell recording when the transceiver last produced a real
/// decode (stored or duplicate, not noise).
///
/// Written by the capture pipeline, read by the status operation. The value
/// is milliseconds of device uptime.
#[derive(Debug)]
pub struct LastSeen {
    ms: AtomicU64,
}

impl LastSeen {
    /// Sentinel meaning no signal has been seen since boot.
    const NONE: u64 = u64::MAX;

    /// Create a cell with no signal recorded.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ms: AtomicU64::new(Self::NONE),
        }
    }

    /// Record a decode at the given uptime.
    pub fn mark(&self, now_ms: u64) {
        self.ms.store(now_ms, Ordering::SeqCst);
    }

    /// The last decode time, if any signal has been seen.
    #[must_use]
    pub fn get(&self) -> Option<u64> {
        match self.ms.load(Ordering::SeqCst) {
            Self::NONE => None,
            ms => Some(ms),
        }
    }
}

impl Default for LastSeen {
    fn default() -> Self {
        Self::new()
    }
}

/// A cloneable handle that signals the capture loop to terminate.
#[derive(Debug, Clone, Default)]
pub struct CaptureHandle {
    stop_signal: Arc<AtomicBool>,
}

impl CaptureHandle {
    /// Create a new handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal the capture loop to stop after its current tick.
    pub fn stop(&self) {
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Check if the stop signal has been sent.
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.stop_signal.load(Ordering::SeqCst)
    }
}

/// The capture loop: transceiver readiness in, archive insertions out.
#[derive(Debug)]
pub struct CapturePipeline {
    archive: Arc<Mutex<Archive>>,
    radio: Arc<Mutex<dyn Transceiver>>,
    toggles: Arc<Toggles>,
    feedback: Arc<dyn Feedback>,
    last_seen: Arc<LastSeen>,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    handle: CaptureHandle,
}

impl CapturePipeline {
    /// Assemble a pipeline around the shared service state.
    #[must_use]
    pub fn new(
        archive: Arc<Mutex<Archive>>,
        radio: Arc<Mutex<dyn Transceiver>>,
        toggles: Arc<Toggles>,
        feedback: Arc<dyn Feedback>,
        last_seen: Arc<LastSeen>,
        clock: Arc<dyn Clock>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            archive,
            radio,
            toggles,
            feedback,
            last_seen,
            clock,
            poll_interval,
            handle: CaptureHandle::new(),
        }
    }

    /// A handle for stopping this pipeline from another task.
    #[must_use]
    pub fn handle(&self) -> CaptureHandle {
        self.handle.clone()
    }

    /// Run the capture loop until the stop handle fires.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        info!("capture pipeline started");

        loop {
            ticker.tick().await;
            if self.handle.should_stop() {
                break;
            }
            self.poll_once().await;
        }

        info!("capture pipeline stopped");
    }

    /// One scheduling tick: poll, filter noise, insert, feed back.
    async fn poll_once(&self) {
        if !self.toggles.sniffing() {
            return;
        }

        let Some(code) = self.radio.lock().try_receive() else {
            return;
        };

        if code.is_noise() {
            trace!("discarded noise reading");
            return;
        }

        let outcome = self.archive.lock().insert(code);

        match outcome {
            InsertOutcome::Stored(size) => {
                self.last_seen.mark(self.clock.now_ms());
                debug!(%code, size, "capture stored");
                if self.toggles.buzzer() {
                    self.feedback.receive_tone().await;
                }
                if self.toggles.led() {
                    let (duration, times) = RECEIVE_FLASH;
                    self.feedback.flash(duration, times).await;
                }
            }
            InsertOutcome::Duplicate => {
                // A real decode happened, just nothing new to store.
                self.last_seen.mark(self.clock.now_ms());
            }
            InsertOutcome::StorageFull => {}
        }
    }
}
