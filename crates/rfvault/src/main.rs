//! `rfvault` - maintenance CLI for the RF signal archive
//!
//! This binary operates on the signal store without the radio attached:
//! inspecting, renaming, favoriting, deleting, and pruning archived codes.
//! Capture and transmit are library features driven by the embedding
//! firmware.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use parking_lot::Mutex;

use rfvault::archive::Archive;
use rfvault::cli::{Cli, Command, ConfigCommand, ListCommand};
use rfvault::clock::UptimeClock;
use rfvault::commands::Commands;
use rfvault::feedback::NullFeedback;
use rfvault::pipeline::LastSeen;
use rfvault::store::SqliteStore;
use rfvault::toggles::Toggles;
use rfvault::{init_logging, Config};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    match cli.command {
        Command::Config(cmd) => handle_config(&config, &cmd)?,
        command => {
            let commands = open_commands(&config)?;
            run_command(&config, &commands, command)?;
        }
    }
    Ok(())
}

/// Open the store and assemble a headless command surface around it.
fn open_commands(config: &Config) -> anyhow::Result<Commands> {
    let store =
        SqliteStore::open(config.database_path()).context("failed to open signal store")?;
    let toggles = Arc::new(Toggles::load(&store).context("failed to load toggles")?);
    let clock = Arc::new(UptimeClock::new());
    let archive = Archive::load(Box::new(store), clock, config.limits())
        .context("failed to load signal archive")?;

    Ok(Commands::new(
        Arc::new(Mutex::new(archive)),
        toggles,
        Arc::new(NullFeedback),
        Arc::new(LastSeen::new()),
    ))
}

fn run_command(config: &Config, commands: &Commands, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Status(cmd) => handle_status(config, commands, cmd.json)?,
        Command::List(cmd) => handle_list(commands, &cmd)?,
        Command::Rename(cmd) => {
            commands.rename(cmd.key, &cmd.name)?;
            println!("Signal {} renamed to \"{}\"", cmd.key, cmd.name);
        }
        Command::Favorite(cmd) => {
            commands.set_favorite(cmd.key, !cmd.remove)?;
            if cmd.remove {
                println!("Signal {} unmarked as favorite", cmd.key);
            } else {
                println!("Signal {} marked as favorite", cmd.key);
            }
        }
        Command::Delete(cmd) => {
            commands.delete(cmd.key)?;
            println!("Signal {} deleted", cmd.key);
        }
        Command::Clear(cmd) => {
            if cmd.yes {
                commands.clear_all();
                println!("All signals cleared");
            } else {
                println!("This will delete every archived signal.");
                println!("Use --yes to confirm.");
            }
        }
        Command::Cleanup => {
            let removed = commands.cleanup_now();
            println!("Cleanup complete: removed {removed} signals");
        }
        Command::Purge(cmd) => {
            let days = cmd.days.unwrap_or(config.archive.purge_max_age_days);
            let removed = commands.purge_older_than(Some(days));
            println!("Removed {removed} signals older than {days} days");
        }
        // Dispatched in main before the store is opened
        Command::Config(_) => {}
    }
    Ok(())
}

fn handle_status(config: &Config, commands: &Commands, json: bool) -> anyhow::Result<()> {
    let status = commands.status();
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("rfvault status");
        println!("--------------");
        println!("Sniffing:    {}", on_off(status.sniffing));
        println!("Buzzer:      {}", on_off(status.buzzer));
        println!("LED:         {}", on_off(status.led));
        println!(
            "Signals:     {} / {} ({:.1}% used)",
            status.signal_count, status.max_signals, status.storage_used
        );
        println!("Favorites:   {}", status.favorite_count);
        match status.last_signal {
            Some(ms) => println!("Last signal: {ms} ms uptime"),
            None => println!("Last signal: none"),
        }
        println!("Database:    {}", config.database_path().display());
    }
    Ok(())
}

fn handle_list(commands: &Commands, cmd: &ListCommand) -> anyhow::Result<()> {
    let mut views = commands.list();
    if cmd.favorites {
        views.retain(|view| view.is_favorite);
    }

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    if views.is_empty() {
        println!("No signals archived.");
        return Ok(());
    }

    println!(
        "{:>4}  {:>5}  {:<24} {:>12}  {:>4}  {:>5}  {}",
        "id", "key", "name", "value", "bits", "proto", "fav"
    );
    for view in &views {
        println!(
            "{:>4}  {:>5}  {:<24} {:>12}  {:>4}  {:>5}  {}",
            view.id,
            view.key,
            view.name,
            view.value,
            view.bit_length,
            view.protocol,
            if view.is_favorite { "*" } else { "" }
        );
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: &ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if *json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:     {}", config.database_path().display());
                println!();
                println!("[Archive]");
                println!("  Max signals:       {}", config.archive.max_signals);
                println!("  Cleanup threshold: {}", config.archive.cleanup_threshold);
                println!("  Purge age (days):  {}", config.archive.purge_max_age_days);
                println!();
                println!("[Capture]");
                println!("  Poll interval:     {} ms", config.capture.poll_interval_ms);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.clone().unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}
