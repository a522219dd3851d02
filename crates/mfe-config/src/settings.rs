//! Credential-manager settings probe
//!
//! The CLI settings file (`<home>/settings/imperative.json`) names the
//! credential manager plugin in its `overrides` section:
//!
//! ```json
//! { "overrides": { "CredentialManager": "@mfe/secrets-vault" } }
//! ```
//!
//! A non-empty value under either `CredentialManager` or
//! `credential-manager` means secrets are delegated to a vault.

use serde_json::Value;
use std::path::Path;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

const OVERRIDE_KEYS: [&str; 2] = ["CredentialManager", "credential-manager"];

/// Whether the settings file configures a credential manager.
///
/// A missing file means no override (`Ok(false)`); an unreadable or
/// malformed file is an error.
pub async fn credential_manager_configured(settings_path: &Path) -> ConfigResult<bool> {
    let content = match tokio::fs::read_to_string(settings_path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No settings file at {}", settings_path.display());
            return Ok(false);
        }
        Err(e) => {
            return Err(ConfigError::Io {
                path: settings_path.to_path_buf(),
                error: e.to_string(),
            })
        }
    };

    let settings: Value = serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
        path: settings_path.to_path_buf(),
        error: e.to_string(),
    })?;

    let Some(overrides) = settings.get("overrides") else {
        return Ok(false);
    };

    Ok(OVERRIDE_KEYS.iter().any(|key| {
        overrides
            .get(key)
            .and_then(Value::as_str)
            .is_some_and(|manager| !manager.is_empty())
    }))
}
