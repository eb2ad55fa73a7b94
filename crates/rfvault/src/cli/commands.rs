//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,

    /// Only show favorites
    #[arg(short, long)]
    pub favorites: bool,
}

/// Rename command arguments.
#[derive(Debug, Args)]
pub struct RenameCommand {
    /// Stable key of the signal to rename
    pub key: u64,

    /// The new name
    pub name: String,
}

/// Favorite command arguments.
#[derive(Debug, Args)]
pub struct FavoriteCommand {
    /// Stable key of the signal
    pub key: u64,

    /// Clear the favorite flag instead of setting it
    #[arg(long)]
    pub remove: bool,
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Stable key of the signal to delete
    pub key: u64,
}

/// Clear command arguments.
#[derive(Debug, Args)]
pub struct ClearCommand {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Purge command arguments.
#[derive(Debug, Args)]
pub struct PurgeCommand {
    /// Remove non-favorite signals older than this many days
    #[arg(short, long)]
    pub days: Option<u64>,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
