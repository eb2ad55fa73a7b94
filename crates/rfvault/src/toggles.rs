//! Process-wide feature toggles.
//!
//! Capture arming and the two feedback channels are plain booleans that
//! both the capture pipeline and the command surface consult. They live in
//! one explicit struct (atomics, so reads never contend with the archive
//! lock) and are persisted individually through the archive's store handle
//! the moment they change.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::Result;
use crate::store::{keys, KvStore};

/// The three persisted device toggles. All default to enabled.
#[derive(Debug)]
pub struct Toggles {
    sniffing: AtomicBool,
    buzzer: AtomicBool,
    led: AtomicBool,
}

impl Toggles {
    /// Create toggles with explicit initial values.
    #[must_use]
    pub fn new(sniffing: bool, buzzer: bool, led: bool) -> Self {
        Self {
            sniffing: AtomicBool::new(sniffing),
            buzzer: AtomicBool::new(buzzer),
            led: AtomicBool::new(led),
        }
    }

    /// Load the persisted toggles, defaulting each missing flag to enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or a flag value is malformed.
    pub fn load(store: &dyn KvStore) -> Result<Self> {
        Ok(Self::new(
            store.get_bool(keys::SNIFFING_ENABLED)?.unwrap_or(true),
            store.get_bool(keys::BUZZER_ENABLED)?.unwrap_or(true),
            store.get_bool(keys::LED_ENABLED)?.unwrap_or(true),
        ))
    }

    /// Whether capture is armed.
    #[must_use]
    pub fn sniffing(&self) -> bool {
        self.sniffing.load(Ordering::SeqCst)
    }

    /// Whether the buzzer feedback channel is enabled.
    #[must_use]
    pub fn buzzer(&self) -> bool {
        self.buzzer.load(Ordering::SeqCst)
    }

    /// Whether the LED feedback channel is enabled.
    #[must_use]
    pub fn led(&self) -> bool {
        self.led.load(Ordering::SeqCst)
    }

    /// Arm or disarm capture.
    pub fn set_sniffing(&self, enabled: bool) {
        self.sniffing.store(enabled, Ordering::SeqCst);
    }

    /// Enable or disable the buzzer.
    pub fn set_buzzer(&self, enabled: bool) {
        self.buzzer.store(enabled, Ordering::SeqCst);
    }

    /// Enable or disable the LED.
    pub fn set_led(&self, enabled: bool) {
        self.led.store(enabled, Ordering::SeqCst);
    }
}

impl Default for Toggles {
    fn default() -> Self {
        Self::new(true, true, true)
    }
}
