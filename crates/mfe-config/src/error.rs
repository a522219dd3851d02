//! Error types for configuration loading and profile argument resolution.

use std::path::PathBuf;
use thiserror::Error;

use crate::credentials::CredentialError;

/// Errors raised by a [`ConfigSource`](crate::ConfigSource).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The requested profile does not exist in any layer.
    #[error("Profile not found: {name}")]
    ProfileNotFound {
        /// Full (dot-joined) profile name that was requested
        name: String,
    },

    /// IO error reading a layer or settings file
    #[error("IO error reading {}: {error}", path.display())]
    Io {
        /// Path to the file
        path: PathBuf,
        /// Error message
        error: String,
    },

    /// A layer or settings file is not valid JSON of the expected shape
    #[error("Parse error in {}: {error}", path.display())]
    Parse {
        /// Path to the file
        path: PathBuf,
        /// Error message
        error: String,
    },

    /// The secure credential store failed
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// A profile path segment is empty (e.g. `"lpar1..zosmf"`)
    #[error("Invalid profile path: {0}")]
    InvalidProfilePath(String),

    /// Catch-all for collaborator-specific failures
    #[error("{0}")]
    Other(String),
}

impl ConfigError {
    /// Returns true when the error only means "no such profile".
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConfigError::ProfileNotFound { .. })
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
