//! `rfvault` - capture, archive, and replay RF remote-control codes
//!
//! This library provides the core of a small always-on service: a bounded,
//! deduplicated archive of decoded RF codes, a capture pipeline feeding it
//! from a transceiver, and the flat command surface a network router or the
//! maintenance CLI drives.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod archive;
pub mod cli;
pub mod clock;
pub mod commands;
pub mod config;
pub mod error;
pub mod feedback;
pub mod logging;
pub mod pipeline;
pub mod radio;
pub mod signal;
pub mod store;
pub mod toggles;

pub use archive::{Archive, InsertOutcome, Limits};
pub use commands::{Commands, SignalView, Status};
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use pipeline::{CaptureHandle, CapturePipeline};
pub use signal::{RfCode, Signal};
pub use store::{KvStore, SqliteStore};
pub use toggles::Toggles;
