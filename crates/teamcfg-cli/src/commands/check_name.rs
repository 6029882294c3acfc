//! Check-name command implementation

use colored::Colorize;
use serde_json::json;
use teamcfg_core::Error as CoreError;
use teamcfg_model::ProfileKey;

use crate::context::Context;
use crate::error::{CliError, Result};

/// Run the check-name command
///
/// An unavailable name is reported and turned into an error so the exit
/// status reflects the answer.
pub fn run_check_name(
    context: &Context,
    name: &str,
    layer: &str,
    parent: Option<&str>,
    json: bool,
) -> Result<()> {
    let id = context.layer_id(layer)?;
    let parent = parent.map(ProfileKey::parse).transpose()?;

    match context
        .engine
        .validate_profile_name(name, parent.as_ref(), &id)
    {
        Ok(key) => {
            if json {
                println!("{}", json!({ "name": key, "available": true }));
            } else {
                println!("{} {} is available", "+".green(), key.to_string().cyan());
            }
            Ok(())
        }
        Err(CoreError::Rejected(rejection)) => {
            if json {
                println!(
                    "{}",
                    json!({ "name": name, "available": false, "reason": rejection.reason() })
                );
            }
            Err(CliError::user(rejection.reason()))
        }
        Err(e) => Err(e.into()),
    }
}
