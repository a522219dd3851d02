use mfe_config::ConfigError;
use thiserror::Error;

/// Errors surfaced by the profile cache
#[derive(Error, Debug)]
pub enum ProfileError {
    /// No catalog entry matches the requested name (and type)
    #[error("Could not find profile named: {name}.")]
    NotFound {
        /// Requested profile name
        name: String,
        /// Requested type, if one was given
        profile_type: Option<String>,
    },

    /// Re-enumerating the configuration failed
    #[error(transparent)]
    Enumeration(#[from] EnumerationFailure),

    /// The configuration source failed
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Failure while enumerating or merging one profile type during a refresh.
#[derive(Error, Debug)]
#[error("Failed to load {profile_type} profiles: {source}")]
pub struct EnumerationFailure {
    /// Type being enumerated when the failure happened
    pub profile_type: String,
    /// Underlying source error
    #[source]
    pub source: ConfigError,
}

impl EnumerationFailure {
    pub(crate) fn new(profile_type: &str, source: ConfigError) -> Self {
        Self {
            profile_type: profile_type.to_string(),
            source,
        }
    }
}

/// Result type for profile cache operations
pub type ProfileResult<T> = Result<T, ProfileError>;
