use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Table};
use serde_json::json;

use super::{to_json, CliContext};
use crate::cli::OutputFormat;

/// Types enumerated by the last refresh, with their profile counts.
///
/// An empty list means the refresh failed or nothing is registered.
pub fn execute(ctx: &CliContext) -> Result<String> {
    let catalog = ctx.cache.snapshot();
    let rows: Vec<(String, usize)> = catalog
        .all_types()
        .iter()
        .map(|t| (t.clone(), catalog.profiles_by_type(t).len()))
        .collect();

    match ctx.format {
        OutputFormat::Json => {
            let types: Vec<_> = rows
                .iter()
                .map(|(t, count)| json!({ "type": t, "profiles": count }))
                .collect();
            to_json(&types)
        }
        OutputFormat::Table if rows.is_empty() => Ok("No profile types loaded".to_string()),
        OutputFormat::Table => {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL).set_header(vec!["Type", "Profiles"]);
            for (profile_type, count) in rows {
                table.add_row(vec![profile_type, count.to_string()]);
            }
            Ok(table.to_string())
        }
    }
}
