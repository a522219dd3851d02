//! On-disk configuration layers
//!
//! Team configuration is split across up to four JSON files. From most to
//! least specific:
//!
//! 1. Project user (`<project>/mfe.config.user.json`)
//! 2. Project (`<project>/mfe.config.json`)
//! 3. Global user (`<home>/mfe.config.user.json`)
//! 4. Global (`<home>/mfe.config.json`)
//!
//! A value defined in a more specific layer hides the same value in a less
//! specific one. The home directory is `$MFE_CLI_HOME` when set, otherwise
//! `~/.mfe`.
//!
//! # Layer File Format
//!
//! ```json
//! {
//!   "profiles": {
//!     "lpar1": {
//!       "properties": { "host": "lpar1.example.com" },
//!       "profiles": {
//!         "zosmf": { "type": "zosmf", "properties": { "port": 443 }, "secure": ["user", "password"] }
//!       }
//!     },
//!     "global_base": { "type": "base", "properties": { "host": "apiml.example.com" } }
//!   },
//!   "defaults": { "zosmf": "lpar1.zosmf", "base": "global_base" }
//! }
//! ```

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// Environment variable overriding the global home directory
pub const HOME_ENV_VAR: &str = "MFE_CLI_HOME";

/// File name of a team layer
pub const TEAM_CONFIG_FILE: &str = "mfe.config.json";

/// File name of a user layer
pub const USER_CONFIG_FILE: &str = "mfe.config.user.json";

/// The four configuration layers, declared most specific first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    /// User overrides inside the project directory
    ProjectUser,
    /// Team configuration checked into the project
    Project,
    /// User overrides in the home directory
    GlobalUser,
    /// Team configuration in the home directory
    Global,
}

impl LayerKind {
    /// All layers in precedence order (most specific first).
    pub const PRECEDENCE: [LayerKind; 4] = [
        LayerKind::ProjectUser,
        LayerKind::Project,
        LayerKind::GlobalUser,
        LayerKind::Global,
    ];

    /// Whether this layer lives in the project directory.
    pub fn is_project(self) -> bool {
        matches!(self, LayerKind::ProjectUser | LayerKind::Project)
    }

    /// Whether this is a user layer.
    pub fn is_user(self) -> bool {
        matches!(self, LayerKind::ProjectUser | LayerKind::GlobalUser)
    }

    fn file_name(self) -> &'static str {
        if self.is_user() {
            USER_CONFIG_FILE
        } else {
            TEAM_CONFIG_FILE
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerKind::ProjectUser => write!(f, "project-user"),
            LayerKind::Project => write!(f, "project"),
            LayerKind::GlobalUser => write!(f, "global-user"),
            LayerKind::Global => write!(f, "global"),
        }
    }
}

/// Directories the layers are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    /// Project directory; project layers are skipped when `None`
    pub project_dir: Option<PathBuf>,
    /// Global home directory
    pub home_dir: PathBuf,
}

impl ConfigPaths {
    /// Create paths from explicit directories
    pub fn new(project_dir: Option<PathBuf>, home_dir: PathBuf) -> Self {
        Self {
            project_dir,
            home_dir,
        }
    }

    /// Use the default home directory and the given project directory
    pub fn discover(project_dir: Option<PathBuf>) -> Self {
        Self::new(project_dir, Self::default_home())
    }

    /// Default home: `$MFE_CLI_HOME`, else `~/.mfe`
    pub fn default_home() -> PathBuf {
        if let Ok(home) = std::env::var(HOME_ENV_VAR) {
            if !home.is_empty() {
                return expand_home(&home);
            }
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".mfe")
    }

    /// Path of a layer file, if that layer applies.
    pub fn layer_path(&self, kind: LayerKind) -> Option<PathBuf> {
        if kind.is_project() {
            self.project_dir.as_ref().map(|dir| dir.join(kind.file_name()))
        } else {
            Some(self.home_dir.join(kind.file_name()))
        }
    }

    /// Path of the credential-manager settings file.
    pub fn settings_path(&self) -> PathBuf {
        self.home_dir.join("settings").join("imperative.json")
    }
}

/// Expand a leading `~` or `~/` to the home directory
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// JSON path of a profile inside a layer document.
///
/// `lpar1.zosmf` becomes `profiles.lpar1.profiles.zosmf`.
pub fn json_path_for(profile_name: &str) -> String {
    profile_name
        .split('.')
        .map(|segment| format!("profiles.{}", segment))
        .collect::<Vec<_>>()
        .join(".")
}

/// Split a full profile name into segments, rejecting empty ones.
pub fn split_profile_name(profile_name: &str) -> ConfigResult<Vec<&str>> {
    let segments: Vec<&str> = profile_name.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(ConfigError::InvalidProfilePath(profile_name.to_string()));
    }
    Ok(segments)
}

/// Ancestor chain of a profile, nearest first and including the profile itself.
///
/// `a.b.c` yields `["a.b.c", "a.b", "a"]`.
pub fn inheritance_chain(profile_name: &str) -> Vec<String> {
    let segments: Vec<&str> = profile_name.split('.').collect();
    (1..=segments.len())
        .rev()
        .map(|n| segments[..n].join("."))
        .collect()
}

/// Profile nodes keyed by name, in the order they appear in the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileMap(Vec<(String, ProfileNode)>);

impl ProfileMap {
    /// Node named `name`
    pub fn get(&self, name: &str) -> Option<&ProfileNode> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, node)| node)
    }

    /// Insert or replace a node; a new name goes last.
    pub fn insert(&mut self, name: impl Into<String>, node: ProfileNode) {
        let name = name.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = node,
            None => self.0.push((name, node)),
        }
    }

    /// Entries in file order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProfileNode)> {
        self.0.iter().map(|(n, node)| (n.as_str(), node))
    }

    /// Number of nodes at this level
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no nodes at this level
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for ProfileMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de> Deserialize<'de> for ProfileMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ProfileMapVisitor;

        impl<'de> Visitor<'de> for ProfileMapVisitor {
            type Value = ProfileMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of profile names to profiles")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = ProfileMap(Vec::with_capacity(access.size_hint().unwrap_or(0)));
                while let Some((name, node)) = access.next_entry::<String, ProfileNode>()? {
                    map.insert(name, node);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(ProfileMapVisitor)
    }
}

/// One profile or group node in a layer document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileNode {
    /// Profile type; groups have none
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub profile_type: Option<String>,

    /// Plaintext properties
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,

    /// Names of properties whose values live in secure storage
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secure: Vec<String>,

    /// Nested profiles
    #[serde(default, skip_serializing_if = "ProfileMap::is_empty")]
    pub profiles: ProfileMap,
}

impl ProfileNode {
    /// Whether the property is declared secure on this node
    pub fn is_secure(&self, name: &str) -> bool {
        self.secure.iter().any(|s| s == name)
    }
}

/// Parsed contents of one layer file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerDocument {
    /// Top-level profiles
    #[serde(default)]
    pub profiles: ProfileMap,

    /// Default profile name per type
    #[serde(default)]
    pub defaults: BTreeMap<String, String>,

    /// Whether prompted values should be persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_store: Option<bool>,
}

impl LayerDocument {
    /// Find a node by full profile name.
    pub fn find(&self, profile_name: &str) -> Option<&ProfileNode> {
        let mut segments = profile_name.split('.');
        let mut node = self.profiles.get(segments.next()?)?;
        for segment in segments {
            node = node.profiles.get(segment)?;
        }
        Some(node)
    }

    /// All typed profiles, depth first, as `(full name, node)`.
    pub fn typed_profiles(&self) -> Vec<(String, &ProfileNode)> {
        let mut out = Vec::new();
        for (name, node) in self.profiles.iter() {
            collect_typed(name.to_string(), node, &mut out);
        }
        out
    }
}

fn collect_typed<'a>(name: String, node: &'a ProfileNode, out: &mut Vec<(String, &'a ProfileNode)>) {
    if node.profile_type.is_some() {
        out.push((name.clone(), node));
    }
    for (child_name, child) in node.profiles.iter() {
        collect_typed(format!("{}.{}", name, child_name), child, out);
    }
}

/// A loaded layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigLayer {
    /// Which layer this is
    pub kind: LayerKind,
    /// File it was read from
    pub path: PathBuf,
    /// Parsed document
    pub document: LayerDocument,
}

impl ConfigLayer {
    /// Read a layer file. Returns `Ok(None)` if the file does not exist.
    pub async fn read(kind: LayerKind, path: &Path) -> ConfigResult<Option<Self>> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No {} layer at {}", kind, path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    error: e.to_string(),
                })
            }
        };

        let document = if content.trim().is_empty() {
            LayerDocument::default()
        } else {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                error: e.to_string(),
            })?
        };

        debug!("Loaded {} layer from {}", kind, path.display());
        Ok(Some(Self {
            kind,
            path: path.to_path_buf(),
            document,
        }))
    }
}
