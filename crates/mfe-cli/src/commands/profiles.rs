use anyhow::Result;
use serde_json::json;

use super::{to_json, CliContext};
use crate::cli::{OutputFormat, ProfilesCommands};
use crate::output;

pub fn execute(ctx: &CliContext, command: &ProfilesCommands) -> Result<String> {
    match command {
        ProfilesCommands::List { profile_type } => list(ctx, profile_type.as_deref()),
        ProfilesCommands::Show { name, profile_type } => show(ctx, name, profile_type.as_deref()),
        ProfilesCommands::Defaults => defaults(ctx),
    }
}

/// Catalog entries, optionally of one type
pub fn list(ctx: &CliContext, profile_type: Option<&str>) -> Result<String> {
    let catalog = ctx.cache.snapshot();
    let profiles = match profile_type {
        Some(t) => catalog.profiles_by_type(t).to_vec(),
        None => catalog.all_profiles().to_vec(),
    };
    let is_default = |p: &mfe_profiles::MergedProfile| {
        catalog
            .default_profile(&p.profile_type)
            .is_some_and(|d| d.name == p.name)
    };

    match ctx.format {
        OutputFormat::Json => to_json(&output::profiles_json(&profiles, is_default)),
        OutputFormat::Table if profiles.is_empty() => Ok("No profiles found".to_string()),
        OutputFormat::Table => Ok(output::profiles_table(&profiles, is_default).to_string()),
    }
}

/// Merged properties of one profile; fails when the catalog lacks it
pub fn show(ctx: &CliContext, name: &str, profile_type: Option<&str>) -> Result<String> {
    let profile = ctx.cache.load_named_profile(name, profile_type)?;
    let schema = ctx.cache.get_schema(&profile.profile_type);

    match ctx.format {
        OutputFormat::Json => to_json(&output::profile_json(&profile, Some(&schema))),
        OutputFormat::Table => Ok(format!(
            "{} ({})\n{}",
            profile.name,
            profile.profile_type,
            output::profile_table(&profile, Some(&schema))
        )),
    }
}

/// Default profile per type
pub fn defaults(ctx: &CliContext) -> Result<String> {
    let catalog = ctx.cache.snapshot();
    let defaults: Vec<_> = catalog
        .default_types()
        .map(|(profile_type, profile)| (profile_type.to_string(), profile.name.clone()))
        .collect();

    match ctx.format {
        OutputFormat::Json => {
            let map: serde_json::Map<_, _> = defaults
                .into_iter()
                .map(|(t, name)| (t, json!(name)))
                .collect();
            to_json(&map)
        }
        OutputFormat::Table if defaults.is_empty() => Ok("No default profiles set".to_string()),
        OutputFormat::Table => {
            let mut table = comfy_table::Table::new();
            table
                .load_preset(comfy_table::presets::UTF8_FULL)
                .set_header(vec!["Type", "Default profile"]);
            for (profile_type, name) in defaults {
                table.add_row(vec![profile_type, name]);
            }
            Ok(table.to_string())
        }
    }
}
