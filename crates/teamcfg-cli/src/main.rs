//! Team configuration CLI
//!
//! Loads configuration layers, replays an edit script against them, and
//! prints what the result would look like if it were committed.

mod cli;
mod commands;
mod context;
mod edits;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cli::{Cli, Commands};
use context::Context;
use error::{CliError, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let Some(command) = cli.command.clone() else {
        println!("{} Team configuration inspector", "teamcfg".green().bold());
        println!();
        println!("Run {} for available commands.", "teamcfg --help".cyan());
        return Ok(());
    };

    let cwd = std::env::current_dir()?;
    let context = Context::load(&cwd, &cli)?;
    execute_command(&context, command, cli.json)
}

/// `--verbose` logs at DEBUG; otherwise `RUST_LOG` applies, defaulting to warn.
fn init_tracing(verbose: bool) -> Result<()> {
    let result = if verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    };
    result.map_err(|e| CliError::user(format!("Failed to set tracing subscriber: {e}")))?;
    if verbose {
        tracing::debug!("Verbose mode enabled");
    }
    Ok(())
}

fn execute_command(context: &Context, command: Commands, json: bool) -> Result<()> {
    match command {
        Commands::Profiles { layer } => commands::run_profiles(context, &layer, json),
        Commands::Show { profile, layer } => commands::run_show(context, &profile, &layer, json),
        Commands::Merged {
            profile,
            layer,
            mode,
            from,
        } => commands::run_merged(context, &profile, &layer, mode, from.as_deref(), json),
        Commands::Overlay { layer } => commands::run_overlay(context, &layer, json),
        Commands::CheckName {
            name,
            layer,
            parent,
        } => commands::run_check_name(context, &name, &layer, parent.as_deref(), json),
    }
}
