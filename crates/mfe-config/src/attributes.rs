//! Raw profile records handed out by a configuration source.
//!
//! These are the inputs to profile merging: where a profile lives
//! ([`ProfileAttributes`]) and which argument values apply to it once the
//! layers have been walked ([`MergedArgs`]).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::layers::LayerKind;

/// Where a profile definition was found on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileLocation {
    /// Layer the winning definition belongs to
    pub layer: LayerKind,
    /// Path of the layer file
    pub path: PathBuf,
    /// JSON path inside the layer file, e.g. `profiles.lpar1.profiles.zosmf`
    pub json_path: String,
}

/// Name, type and location of one profile, as enumerated by a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileAttributes {
    /// Full profile name (dot-joined for nested profiles)
    pub name: String,
    /// Profile type tag such as `zosmf` or `base`
    #[serde(rename = "type")]
    pub profile_type: String,
    /// Where the definition lives
    pub location: ProfileLocation,
    /// Whether this profile is the default for its type
    #[serde(default)]
    pub is_default: bool,
}

impl ProfileAttributes {
    /// Short name: the last segment of the full name.
    pub fn short_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

/// Origin of a single merged argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgSource {
    /// Layer that supplied the value
    pub layer: LayerKind,
    /// Path of that layer file
    pub path: PathBuf,
    /// Full name of the profile (or group) that defines the value
    pub profile: String,
}

impl ArgSource {
    /// Key under which a secure value is kept in the credential store.
    pub fn secure_key(&self, arg_name: &str) -> String {
        format!(
            "{}#{}.properties.{}",
            self.path.display(),
            crate::layers::json_path_for(&self.profile),
            arg_name
        )
    }
}

/// One resolved argument of a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileArg {
    /// Property name, e.g. `host`
    pub name: String,
    /// Plaintext value; `Null` for secure values that were not resolved
    pub value: serde_json::Value,
    /// Whether the value lives in secure storage
    pub secure: bool,
    /// Where the value came from
    pub source: ArgSource,
}

/// Result of walking the layers for one profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedArgs {
    /// Arguments defined somewhere in the inheritance chain, first-seen order
    pub known_args: Vec<ProfileArg>,
    /// Schema properties that no layer defines
    pub missing_args: Vec<String>,
}

impl MergedArgs {
    /// Look up a known argument by name.
    pub fn get(&self, name: &str) -> Option<&ProfileArg> {
        self.known_args.iter().find(|arg| arg.name == name)
    }
}

/// Options for [`ConfigSource::merge_args_for_profile`](crate::ConfigSource::merge_args_for_profile).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOptions {
    /// Resolve secure values from the credential store while merging
    pub resolve_secure: bool,
}

impl MergeOptions {
    /// Merge options that resolve secure values inline.
    pub fn secure() -> Self {
        Self {
            resolve_secure: true,
        }
    }
}
