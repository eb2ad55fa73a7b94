//! Core signal types for rfvault.
//!
//! This module defines the decoded RF code triple and the archived signal
//! record built around it.

use serde::{Deserialize, Serialize};

/// A decoded RF remote-control code.
///
/// The transceiver decodes a raw pulse train into this triple, and encodes
/// the same triple back into a pulse train on transmit. Two codes are the
/// same remote button press exactly when all three fields are equal; the
/// archive deduplicates on that equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RfCode {
    /// The code payload. Zero is never a valid decode.
    pub value: u64,
    /// Number of significant bits in `value`.
    pub bit_length: u32,
    /// Transceiver protocol identifier used to decode/encode the code.
    pub protocol: u32,
}

impl RfCode {
    /// Create a new code triple.
    #[must_use]
    pub fn new(value: u64, bit_length: u32, protocol: u32) -> Self {
        Self {
            value,
            bit_length,
            protocol,
        }
    }

    /// Check whether this reading is decode noise.
    ///
    /// Receivers report a zero value when they could not lock onto a
    /// transmission; such readings must never reach the archive.
    #[must_use]
    pub fn is_noise(&self) -> bool {
        self.value == 0
    }
}

impl std::fmt::Display for RfCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({} bit, protocol {})",
            self.value, self.bit_length, self.protocol
        )
    }
}

/// A captured or user-named RF code held in the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    /// Immutable identity, assigned from a monotonic counter at creation.
    /// Never reused across deletes; survives reordering and restarts.
    pub key: u64,

    /// Display label. Mutable, not unique.
    pub name: String,

    /// The decoded code triple.
    pub code: RfCode,

    /// When this signal was captured, in milliseconds of device uptime.
    /// Not wall-clock time: the value resets when the device reboots.
    pub captured_at_ms: u64,

    /// User flag exempting this signal from eviction and age-based purge.
    pub favorite: bool,
}

impl Signal {
    /// Create a new non-favorite signal.
    #[must_use]
    pub fn new(key: u64, name: String, code: RfCode, captured_at_ms: u64) -> Self {
        Self {
            key,
            name,
            code,
            captured_at_ms,
            favorite: false,
        }
    }

    /// The auto-generated display name for a capture with the given key.
    #[must_use]
    pub fn auto_name(key: u64) -> String {
        format!("Signal_{key}")
    }
}
