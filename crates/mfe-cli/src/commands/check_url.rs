use anyhow::Result;
use mfe_profiles::validate_and_parse_url;

use super::to_json;
use crate::cli::OutputFormat;
use crate::output;

/// Validate `url`; needs no configuration
pub fn execute(url: &str, format: OutputFormat) -> Result<String> {
    let validation = validate_and_parse_url(url);
    match format {
        OutputFormat::Json => to_json(&validation),
        OutputFormat::Table => Ok(output::url_table(&validation).to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_output_for_invalid_url() {
        let rendered = execute("not a url", OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "valid": false, "protocol": null, "host": null, "port": null })
        );
    }

    #[test]
    fn table_output_for_valid_url() {
        let rendered = execute("https://example.com:443", OutputFormat::Table).unwrap();
        assert!(rendered.contains("example.com"));
        assert!(rendered.contains("443"));
        assert!(rendered.contains("https"));
    }
}
