//! Show and merged command implementations

use colored::Colorize;
use serde_json::Value;
use teamcfg_core::MergeMode;
use teamcfg_model::ProfileKey;

use crate::context::Context;
use crate::error::{CliError, Result};

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Run the show command
pub fn run_show(context: &Context, profile: &str, layer: &str, json: bool) -> Result<()> {
    let id = context.layer_id(layer)?;
    let key = ProfileKey::parse(profile)?;
    let engine = &context.engine;
    if !engine.profile_exists(&key, &id) {
        return Err(CliError::user(format!(
            "Profile '{key}' not found in layer '{id}'"
        )));
    }
    let view = engine.materialize_profile(&key, &id);

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("{}", key.to_string().bold());
    println!();
    let kind = if view.is_untyped() {
        "(none)".dimmed()
    } else {
        view.kind.cyan()
    };
    println!("{}:       {}", "Type".dimmed(), kind);
    if engine.is_profile_default(&key, &id) {
        println!("{}:    {}", "Default".dimmed(), "yes".green());
    }
    println!();

    println!("{}:", "Properties".bold());
    if view.properties.is_empty() && view.secure.is_empty() {
        println!("  {}", "None".dimmed());
    }
    for (name, value) in &view.properties {
        println!("  {} = {}", name.green(), display_value(value));
    }
    for name in &view.secure {
        println!("  {} = {}", name.green(), "(secure)".yellow());
    }
    Ok(())
}

/// Run the merged command
pub fn run_merged(
    context: &Context,
    profile: &str,
    layer: &str,
    mode: Option<MergeMode>,
    from: Option<&str>,
    json: bool,
) -> Result<()> {
    let id = context.layer_id(layer)?;
    let key = ProfileKey::parse(profile)?;
    let engine = &context.engine;
    let mode = mode.unwrap_or(engine.settings().default_merge_mode);

    let merged = match from {
        Some(from) => {
            let source = context.layer_id(from)?;
            engine.resolve_merged_properties_from(&key, &id, mode, &source)
        }
        None => engine.resolve_merged_properties(&key, &id, mode),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&merged)?);
        return Ok(());
    }

    println!(
        "{} {} ({})",
        "Inherited by".bold(),
        key.to_string().cyan(),
        mode
    );
    println!();
    if merged.is_empty() {
        println!("  {}", "None".dimmed());
        return Ok(());
    }
    for (name, property) in &merged {
        let value = if property.secure {
            "(secure)".yellow().to_string()
        } else {
            display_value(&property.value)
        };
        println!(
            "  {} = {}  {} {} @ {}",
            name.green(),
            value,
            "from".dimmed(),
            property.source_profile,
            property.source_layer
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_value_unquotes_strings() {
        assert_eq!(display_value(&json!("host")), "host");
        assert_eq!(display_value(&json!(443)), "443");
        assert_eq!(display_value(&json!({ "a": true })), r#"{"a":true}"#);
    }
}
