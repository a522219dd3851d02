//! Rendering of profiles and probe results.
//!
//! Secret values never leave this module unmasked.

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use mfe_profiles::{MergedProfile, ProfileProperty, ProfileSchema, UrlValidation};
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Replacement shown for secret values
pub const MASK: &str = "****";

/// Whether `key` holds a secret, by well-known meaning or by schema
pub fn is_secret(key: &str, schema: Option<&ProfileSchema>) -> bool {
    ProfileProperty::from_key(key).is_some_and(ProfileProperty::is_secret)
        || schema
            .and_then(|s| s.properties.get(key))
            .is_some_and(|p| p.secure)
}

/// Plain rendering of a property value for table cells
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Properties of a profile with secrets masked
pub fn masked_properties(profile: &MergedProfile, schema: Option<&ProfileSchema>) -> Map<String, Value> {
    profile
        .properties
        .iter()
        .map(|(key, value)| {
            let shown = if is_secret(key, schema) {
                Value::String(MASK.to_string())
            } else {
                value.clone()
            };
            (key.to_string(), shown)
        })
        .collect()
}

fn table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Profile listing
pub fn profiles_table(profiles: &[Arc<MergedProfile>], is_default: impl Fn(&MergedProfile) -> bool) -> Table {
    let mut table = table();
    table.set_header(vec!["Name", "Type", "Host", "Port", "Default"]);
    for profile in profiles {
        table.add_row(vec![
            profile.name.clone(),
            profile.profile_type.clone(),
            profile.properties.host().unwrap_or("-").to_string(),
            profile
                .properties
                .port()
                .map_or_else(|| "-".to_string(), |p| p.to_string()),
            if is_default(profile) { "yes" } else { "" }.to_string(),
        ]);
    }
    table
}

/// Profile listing as JSON
pub fn profiles_json(profiles: &[Arc<MergedProfile>], is_default: impl Fn(&MergedProfile) -> bool) -> Value {
    Value::Array(
        profiles
            .iter()
            .map(|p| {
                json!({
                    "name": p.name,
                    "type": p.profile_type,
                    "host": p.properties.host(),
                    "port": p.properties.port(),
                    "default": is_default(p),
                })
            })
            .collect(),
    )
}

/// Merged properties of one profile
pub fn profile_table(profile: &MergedProfile, schema: Option<&ProfileSchema>) -> Table {
    let mut table = table();
    table.set_header(vec!["Property", "Value"]);
    for (key, value) in masked_properties(profile, schema) {
        table.add_row(vec![key, display_value(&value)]);
    }
    table
}

/// Merged properties of one profile as JSON
pub fn profile_json(profile: &MergedProfile, schema: Option<&ProfileSchema>) -> Value {
    json!({
        "name": profile.name,
        "type": profile.profile_type,
        "profile": masked_properties(profile, schema),
    })
}

/// Parsed URL parts
pub fn url_table(validation: &UrlValidation) -> Table {
    let mut table = table();
    table.set_header(vec!["Field", "Value"]);
    let or_dash = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
    table.add_row(vec!["valid".to_string(), validation.valid.to_string()]);
    table.add_row(vec!["protocol".to_string(), or_dash(validation.protocol.clone())]);
    table.add_row(vec!["host".to_string(), or_dash(validation.host.clone())]);
    table.add_row(vec!["port".to_string(), or_dash(validation.port.map(|p| p.to_string()))]);
    table
}
