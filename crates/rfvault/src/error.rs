//! Error types for rfvault.
//!
//! This module defines all error types used throughout the rfvault crate.
//! Note that `Duplicate` and `StorageFull` are *not* errors: they are normal
//! insert outcomes and live in [`crate::archive::InsertOutcome`].

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for rfvault operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Store Errors ===
    /// Failed to open or create the durable store.
    #[error("failed to open store at {path}: {source}")]
    StoreOpen {
        /// Path to the store file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A store operation failed.
    #[error("store operation failed: {0}")]
    Store(#[from] rusqlite::Error),

    /// A stored value could not be parsed as its expected type.
    #[error("malformed store value for '{key}': {value:?}")]
    StoreValue {
        /// The key whose value is malformed.
        key: String,
        /// The raw stored value.
        value: String,
    },

    /// The store was written by an incompatible version.
    #[error("unsupported store schema version: {found}")]
    StoreVersion {
        /// The version found in the store.
        found: i64,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Command Errors ===
    /// No signal exists with the given key.
    #[error("unknown signal key: {key}")]
    InvalidId {
        /// The key that was looked up.
        key: u64,
    },

    /// A required input was absent or empty.
    #[error("missing parameter: {name}")]
    MissingParameter {
        /// Name of the missing parameter.
        name: &'static str,
    },

    // === Radio Errors ===
    /// The transceiver failed to encode or send a code.
    #[error("transmit failed: {0}")]
    Transmit(String),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for rfvault operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new transmit error.
    #[must_use]
    pub fn transmit(message: impl Into<String>) -> Self {
        Self::Transmit(message.into())
    }

    /// Check if this error is an unknown-key lookup failure.
    #[must_use]
    pub fn is_invalid_id(&self) -> bool {
        matches!(self, Self::InvalidId { .. })
    }
}
