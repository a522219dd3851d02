use serde::{Deserialize, Serialize};

use crate::property::PropertyBag;

/// Profile type of the shared connection/authentication profile
pub const BASE_PROFILE_TYPE: &str = mfe_config::BASE_PROFILE_TYPE;

/// Type used when a lookup does not name one
pub const DEFAULT_PROFILE_TYPE: &str = "zosmf";

/// A profile with every property resolved from the most specific layer.
///
/// Instances handed out by the cache are read-only snapshots; a changed
/// profile is published with [`ProfileCache::update_profiles_arrays`](crate::ProfileCache::update_profiles_arrays).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedProfile {
    /// Full profile name
    pub name: String,
    /// Profile type tag
    #[serde(rename = "type")]
    pub profile_type: String,
    /// Merged properties
    #[serde(rename = "profile")]
    pub properties: PropertyBag,
    /// Diagnostic message from loading
    #[serde(default)]
    pub message: String,
    /// Whether a missing profile should have been fatal while loading
    #[serde(default)]
    pub fail_not_found: bool,
}

impl MergedProfile {
    /// Create a profile from its parts
    pub fn new(name: impl Into<String>, profile_type: impl Into<String>, properties: PropertyBag) -> Self {
        Self {
            name: name.into(),
            profile_type: profile_type.into(),
            properties,
            message: String::new(),
            fail_not_found: false,
        }
    }

    /// Whether this is a `base` profile
    pub fn is_base(&self) -> bool {
        self.profile_type == BASE_PROFILE_TYPE
    }

    /// Whether this profile has the given identity
    pub fn matches(&self, name: &str, profile_type: &str) -> bool {
        self.name == name && self.profile_type == profile_type
    }
}
