//! In-memory [`ConfigSource`] for tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use crate::attributes::{
    ArgSource, MergeOptions, MergedArgs, ProfileArg, ProfileAttributes, ProfileLocation,
};
use crate::error::{ConfigError, ConfigResult};
use crate::layers::{json_path_for, LayerKind};
use crate::source::ConfigSource;

#[derive(Debug, Clone)]
struct MockProfile {
    attrs: ProfileAttributes,
    args: Vec<ProfileArg>,
}

#[derive(Debug, Default)]
struct MockState {
    profiles: Vec<MockProfile>,
    defaults: HashMap<String, String>,
    secure_values: HashMap<(String, String), Value>,
    secured: Option<Result<bool, String>>,
    failing_types: HashSet<String>,
    failing_merges: HashSet<String>,
    enumerations: usize,
}

/// Scriptable configuration source.
///
/// Profiles are returned in insertion order. Properties are taken as given;
/// no group or base inheritance is applied.
#[derive(Debug, Default)]
pub struct MockConfigSource {
    state: Mutex<MockState>,
}

fn mock_path() -> PathBuf {
    PathBuf::from("/mock/mfe.config.json")
}

fn arg_source(profile: &str) -> ArgSource {
    ArgSource {
        layer: LayerKind::Project,
        path: mock_path(),
        profile: profile.to_string(),
    }
}

impl MockConfigSource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a profile with plaintext properties (a JSON object).
    pub fn with_profile(self, name: &str, profile_type: &str, properties: Value) -> Self {
        self.add_profile(name, profile_type, properties);
        self
    }

    /// Add a secure property with its stored value.
    pub fn with_secure(self, name: &str, key: &str, value: Value) -> Self {
        {
            let mut state = self.state.lock();
            if let Some(profile) = state.profiles.iter_mut().find(|p| p.attrs.name == name) {
                profile.args.retain(|arg| arg.name != key);
                profile.args.push(ProfileArg {
                    name: key.to_string(),
                    value: Value::Null,
                    secure: true,
                    source: arg_source(name),
                });
            }
            state
                .secure_values
                .insert((name.to_string(), key.to_string()), value);
        }
        self
    }

    /// Mark a profile as the default for its type
    pub fn with_default(self, profile_type: &str, name: &str) -> Self {
        self.set_default(profile_type, name);
        self
    }

    /// Make the credential probe report `secured`
    pub fn with_secured(self, secured: bool) -> Self {
        self.state.lock().secured = Some(Ok(secured));
        self
    }

    /// Make the credential probe fail
    pub fn with_probe_failure(self, message: &str) -> Self {
        self.state.lock().secured = Some(Err(message.to_string()));
        self
    }

    /// Add a profile after construction.
    pub fn add_profile(&self, name: &str, profile_type: &str, properties: Value) {
        let args = properties
            .as_object()
            .map(|props| {
                props
                    .iter()
                    .map(|(key, value)| ProfileArg {
                        name: key.clone(),
                        value: value.clone(),
                        secure: false,
                        source: arg_source(name),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let attrs = ProfileAttributes {
            name: name.to_string(),
            profile_type: profile_type.to_string(),
            location: ProfileLocation {
                layer: LayerKind::Project,
                path: mock_path(),
                json_path: json_path_for(name),
            },
            is_default: false,
        };

        let mut state = self.state.lock();
        state.profiles.retain(|p| !(p.attrs.name == name && p.attrs.profile_type == profile_type));
        state.profiles.push(MockProfile { attrs, args });
    }

    /// Replace or add one plaintext property of an existing profile.
    pub fn set_property(&self, name: &str, key: &str, value: Value) {
        let mut state = self.state.lock();
        if let Some(profile) = state.profiles.iter_mut().find(|p| p.attrs.name == name) {
            profile.args.retain(|arg| arg.name != key);
            profile.args.push(ProfileArg {
                name: key.to_string(),
                value,
                secure: false,
                source: arg_source(name),
            });
        }
    }

    /// Remove a profile
    pub fn remove_profile(&self, name: &str) {
        self.state.lock().profiles.retain(|p| p.attrs.name != name);
    }

    /// Set the default profile of a type
    pub fn set_default(&self, profile_type: &str, name: &str) {
        self.state
            .lock()
            .defaults
            .insert(profile_type.to_string(), name.to_string());
    }

    /// Make enumeration of a type fail (all-type enumeration fails too)
    pub fn fail_enumeration_for(&self, profile_type: &str) {
        self.state.lock().failing_types.insert(profile_type.to_string());
    }

    /// Make merging one profile fail with a non-"not found" error
    pub fn fail_merge_for(&self, name: &str) {
        self.state.lock().failing_merges.insert(name.to_string());
    }

    /// Stop failing enumerations and merges
    pub fn clear_failures(&self) {
        let mut state = self.state.lock();
        state.failing_types.clear();
        state.failing_merges.clear();
    }

    /// Number of `get_all_profiles` calls seen
    pub fn enumeration_count(&self) -> usize {
        self.state.lock().enumerations
    }

    fn mark_default(state: &MockState, mut attrs: ProfileAttributes) -> ProfileAttributes {
        attrs.is_default = state.defaults.get(&attrs.profile_type) == Some(&attrs.name);
        attrs
    }
}

#[async_trait]
impl ConfigSource for MockConfigSource {
    async fn get_all_profiles(&self, profile_type: Option<&str>) -> ConfigResult<Vec<ProfileAttributes>> {
        let mut state = self.state.lock();
        state.enumerations += 1;

        let failing = match profile_type {
            Some(t) => state.failing_types.contains(t),
            None => !state.failing_types.is_empty(),
        };
        if failing {
            return Err(ConfigError::Other(format!(
                "Failed to enumerate {} profiles",
                profile_type.unwrap_or("all")
            )));
        }

        Ok(state
            .profiles
            .iter()
            .filter(|p| profile_type.map_or(true, |t| p.attrs.profile_type == t))
            .map(|p| Self::mark_default(&state, p.attrs.clone()))
            .collect())
    }

    async fn get_default_profile(&self, profile_type: &str) -> ConfigResult<Option<ProfileAttributes>> {
        let state = self.state.lock();
        let Some(name) = state.defaults.get(profile_type) else {
            return Ok(None);
        };
        Ok(state
            .profiles
            .iter()
            .find(|p| &p.attrs.name == name && p.attrs.profile_type == profile_type)
            .map(|p| Self::mark_default(&state, p.attrs.clone())))
    }

    async fn merge_args_for_profile(
        &self,
        attrs: &ProfileAttributes,
        options: MergeOptions,
    ) -> ConfigResult<MergedArgs> {
        let state = self.state.lock();
        if state.failing_merges.contains(&attrs.name) {
            return Err(ConfigError::Other(format!("Failed to merge {}", attrs.name)));
        }

        let profile = state
            .profiles
            .iter()
            .find(|p| p.attrs.name == attrs.name && p.attrs.profile_type == attrs.profile_type)
            .ok_or_else(|| ConfigError::ProfileNotFound {
                name: attrs.name.clone(),
            })?;

        let mut known_args = profile.args.clone();
        if options.resolve_secure {
            for arg in known_args.iter_mut().filter(|arg| arg.secure) {
                if let Some(value) = state
                    .secure_values
                    .get(&(attrs.name.clone(), arg.name.clone()))
                {
                    arg.value = value.clone();
                }
            }
        }

        Ok(MergedArgs {
            known_args,
            missing_args: Vec::new(),
        })
    }

    async fn load_secure_arg(&self, arg: &ProfileArg) -> ConfigResult<Option<Value>> {
        if !arg.secure {
            return Ok(Some(arg.value.clone()));
        }
        Ok(self
            .state
            .lock()
            .secure_values
            .get(&(arg.source.profile.clone(), arg.name.clone()))
            .cloned())
    }

    async fn is_secured(&self) -> ConfigResult<bool> {
        match self.state.lock().secured.clone() {
            Some(Ok(secured)) => Ok(secured),
            Some(Err(message)) => Err(ConfigError::Other(message)),
            None => Ok(false),
        }
    }
}
