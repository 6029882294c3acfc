//! Profiles command implementation

use colored::Colorize;
use serde::Serialize;
use teamcfg_model::ProfileKey;

use crate::context::Context;
use crate::error::Result;

/// One line of the profile listing
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileRow {
    profile: ProfileKey,
    #[serde(rename = "type")]
    kind: String,
    is_default: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    renamed_from: Option<ProfileKey>,
}

/// Run the profiles command
pub fn run_profiles(context: &Context, layer: &str, json: bool) -> Result<()> {
    let id = context.layer_id(layer)?;
    let engine = &context.engine;
    let renames = engine.renames(&id);

    let rows: Vec<ProfileRow> = engine
        .profile_keys(&id)
        .into_iter()
        .map(|key| {
            let original = renames.map(|graph| graph.resolve_backward(&key));
            ProfileRow {
                kind: engine.materialize_profile(&key, &id).kind,
                is_default: engine.is_profile_default(&key, &id),
                renamed_from: original.filter(|original| original != &key),
                profile: key,
            }
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{} {}", "Profiles in".bold(), id.to_string().cyan());
    println!();
    if rows.is_empty() {
        println!("  {}", "None".dimmed());
        return Ok(());
    }
    for row in &rows {
        let indent = "  ".repeat(row.profile.depth());
        let kind = if row.kind.is_empty() {
            "(group)".dimmed()
        } else {
            row.kind.normal()
        };
        let mut line = format!("{indent}{} {}", row.profile.leaf().green(), kind);
        if row.is_default {
            line.push_str(&format!(" {}", "[default]".cyan()));
        }
        if let Some(original) = &row.renamed_from {
            line.push_str(&format!(" {}", format!("(was {original})").yellow()));
        }
        println!("{line}");
    }
    Ok(())
}
