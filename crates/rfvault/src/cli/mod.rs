//! Command-line interface for rfvault.
//!
//! This module provides the CLI structure and command handlers for the
//! `rfvault` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ClearCommand, ConfigCommand, DeleteCommand, FavoriteCommand, ListCommand, PurgeCommand,
    RenameCommand, StatusCommand,
};

/// rfvault - capture, archive, and replay RF remote-control codes
///
/// Maintenance interface for the signal archive: inspect, rename, favorite,
/// delete, and prune stored codes without the radio attached.
#[derive(Debug, Parser)]
#[command(name = "rfvault")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show archive and toggle status
    Status(StatusCommand),

    /// List archived signals
    List(ListCommand),

    /// Rename a signal
    Rename(RenameCommand),

    /// Mark or unmark a signal as favorite
    Favorite(FavoriteCommand),

    /// Delete a signal
    Delete(DeleteCommand),

    /// Delete every archived signal
    Clear(ClearCommand),

    /// Evict the oldest non-favorite signals now
    Cleanup,

    /// Remove old non-favorite signals
    Purge(PurgeCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
