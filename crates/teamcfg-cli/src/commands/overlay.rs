//! Overlay command implementation

use colored::Colorize;

use crate::context::Context;
use crate::error::{CliError, Result};

/// Run the overlay command
pub fn run_overlay(context: &Context, layer: &str, json: bool) -> Result<()> {
    let id = context.layer_id(layer)?;
    let snapshot = context
        .engine
        .serialize_overlay(&id)
        .ok_or_else(|| CliError::user(format!("No session for layer '{id}'")))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("{} {}", "Pending edits in".bold(), id.to_string().cyan());
    if !context.report.rejected.is_empty() {
        println!(
            "{}",
            format!("{} edit(s) were rejected", context.report.rejected.len()).yellow()
        );
    }
    println!();
    if snapshot.is_empty() {
        println!("  {}", "Nothing pending".dimmed());
        return Ok(());
    }

    if !snapshot.renames.is_empty() {
        println!("{}:", "Renames".bold());
        for record in &snapshot.renames {
            println!("  {} -> {}", record.original, record.current.to_string().green());
        }
    }
    if !snapshot.deletions.is_empty() {
        println!("{}:", "Deletions".bold());
        for path in &snapshot.deletions {
            println!("  {} {}", "-".red(), path);
        }
    }
    if !snapshot.pending_changes.is_empty() {
        println!("{}:", "Changes".bold());
        for (path, change) in &snapshot.pending_changes {
            let marker = if change.is_secure() {
                " (secure)".yellow().to_string()
            } else {
                String::new()
            };
            println!("  {} {} = {}{}", "+".green(), path, change.value, marker);
        }
    }
    if !snapshot.pending_defaults.is_empty() {
        println!("{}:", "Defaults".bold());
        for (kind, pending) in &snapshot.pending_defaults {
            let value = if pending.value.is_empty() {
                "(cleared)".dimmed().to_string()
            } else {
                pending.value.clone()
            };
            println!("  {kind} = {value}");
        }
    }
    Ok(())
}
