use anyhow::Result;
use colored::Colorize;
use serde_json::json;

use super::{to_json, CliContext};
use crate::cli::OutputFormat;

pub async fn execute(ctx: &CliContext) -> Result<String> {
    let secured = ctx.cache.is_credentials_secured().await;
    match ctx.format {
        OutputFormat::Json => to_json(&json!({ "secured": secured })),
        OutputFormat::Table if secured => Ok(format!(
            "{} secure values are kept in a credential vault",
            "secured:".green().bold()
        )),
        OutputFormat::Table => Ok(format!(
            "{} secure values are kept in a plaintext secrets file",
            "insecure:".yellow().bold()
        )),
    }
}
