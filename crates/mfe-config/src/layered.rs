//! Layered team configuration as a [`ConfigSource`].
//!
//! Resolution rules:
//!
//! - **Enumeration**: every typed profile of every layer, de-duplicated by
//!   full name. The most specific layer's definition wins; order is layer
//!   precedence, then document order.
//! - **Defaults**: the most specific layer whose `defaults` table names the
//!   type wins.
//! - **Arguments**: for each property the nearest definition wins, searching
//!   the profile itself, then its ancestor groups (nearest first), then the
//!   default `base` profile. At every step layers are searched most specific
//!   first. Within one node a `secure` declaration hides a plaintext value.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::attributes::{
    ArgSource, MergeOptions, MergedArgs, ProfileArg, ProfileAttributes, ProfileLocation,
};
use crate::credentials::{decode_secret, encode_secret, CredentialStore};
use crate::error::{ConfigError, ConfigResult};
use crate::layers::{
    inheritance_chain, json_path_for, split_profile_name, ConfigLayer, ConfigPaths, LayerKind,
};
use crate::schema::ProfileSchema;
use crate::settings::credential_manager_configured;
use crate::source::ConfigSource;

/// Profile type holding shared connection and authentication properties
pub const BASE_PROFILE_TYPE: &str = "base";

/// On-disk layered configuration.
pub struct LayeredConfig {
    paths: ConfigPaths,
    layers: RwLock<Arc<Vec<ConfigLayer>>>,
    store: Arc<dyn CredentialStore>,
}

impl LayeredConfig {
    /// Read all existing layers under `paths`.
    pub async fn load(paths: ConfigPaths, store: Arc<dyn CredentialStore>) -> ConfigResult<Self> {
        let layers = read_layers(&paths).await?;
        Ok(Self::from_layers(paths, layers, store))
    }

    /// Build from already-parsed layers. Layers are re-sorted into precedence order.
    pub fn from_layers(
        paths: ConfigPaths,
        mut layers: Vec<ConfigLayer>,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        layers.sort_by_key(|layer| layer.kind);
        Self {
            paths,
            layers: RwLock::new(Arc::new(layers)),
            store,
        }
    }

    /// Re-read every layer from disk. On error the previous layers stay active.
    pub async fn reload(&self) -> ConfigResult<()> {
        let layers = read_layers(&self.paths).await?;
        *self.layers.write() = Arc::new(layers);
        Ok(())
    }

    /// Directories this configuration was loaded from
    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    /// Kinds of the layers currently loaded, most specific first
    pub fn loaded_layers(&self) -> Vec<LayerKind> {
        self.snapshot().iter().map(|layer| layer.kind).collect()
    }

    /// Whether any loaded layer enables auto-store of prompted values
    pub fn auto_store(&self) -> bool {
        self.snapshot()
            .iter()
            .find_map(|layer| layer.document.auto_store)
            .unwrap_or(true)
    }

    /// Save a secure property value for a profile.
    ///
    /// The property must be declared `secure` on the profile in some layer;
    /// the most specific such layer receives the value.
    pub fn store_secure_value(&self, profile: &str, property: &str, value: &Value) -> ConfigResult<()> {
        split_profile_name(profile)?;
        let layers = self.snapshot();
        let layer = layers
            .iter()
            .find(|layer| {
                layer
                    .document
                    .find(profile)
                    .is_some_and(|node| node.is_secure(property))
            })
            .ok_or_else(|| {
                ConfigError::Other(format!(
                    "Property {} is not declared secure on profile {}",
                    property, profile
                ))
            })?;

        let source = ArgSource {
            layer: layer.kind,
            path: layer.path.clone(),
            profile: profile.to_string(),
        };
        self.store.set(&source.secure_key(property), &encode_secret(value))?;
        debug!("Stored secure {} for {} in {} layer", property, profile, layer.kind);
        Ok(())
    }

    fn snapshot(&self) -> Arc<Vec<ConfigLayer>> {
        Arc::clone(&self.layers.read())
    }

    fn resolve_secure(&self, arg: &ProfileArg) -> ConfigResult<Option<Value>> {
        let key = arg.source.secure_key(&arg.name);
        Ok(self.store.get(&key)?.map(|raw| decode_secret(&raw)))
    }
}

async fn read_layers(paths: &ConfigPaths) -> ConfigResult<Vec<ConfigLayer>> {
    let mut layers = Vec::new();
    for kind in LayerKind::PRECEDENCE {
        let Some(path) = paths.layer_path(kind) else {
            continue;
        };
        if let Some(layer) = ConfigLayer::read(kind, &path).await? {
            layers.push(layer);
        }
    }
    debug!("Loaded {} configuration layers", layers.len());
    Ok(layers)
}

fn default_name(layers: &[ConfigLayer], profile_type: &str) -> Option<String> {
    layers
        .iter()
        .find_map(|layer| layer.document.defaults.get(profile_type).cloned())
}

fn enumerate(layers: &[ConfigLayer], profile_type: Option<&str>) -> Vec<ProfileAttributes> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for layer in layers {
        for (name, node) in layer.document.typed_profiles() {
            if !seen.insert(name.clone()) {
                continue;
            }
            let Some(node_type) = node.profile_type.as_deref() else {
                continue;
            };
            if profile_type.is_some_and(|wanted| wanted != node_type) {
                continue;
            }
            out.push(attributes_for(layer, &name, node_type));
        }
    }

    for attrs in &mut out {
        attrs.is_default = default_name(layers, &attrs.profile_type).as_deref() == Some(&attrs.name);
    }
    out
}

fn attributes_for(layer: &ConfigLayer, name: &str, profile_type: &str) -> ProfileAttributes {
    ProfileAttributes {
        name: name.to_string(),
        profile_type: profile_type.to_string(),
        location: ProfileLocation {
            layer: layer.kind,
            path: layer.path.clone(),
            json_path: json_path_for(name),
        },
        is_default: false,
    }
}

/// Collects arguments in first-seen order; later offers never override.
#[derive(Default)]
struct ArgCollector {
    seen: HashSet<String>,
    args: Vec<ProfileArg>,
}

impl ArgCollector {
    fn offer(&mut self, name: &str, value: Value, secure: bool, source: &ArgSource) {
        if self.seen.insert(name.to_string()) {
            self.args.push(ProfileArg {
                name: name.to_string(),
                value,
                secure,
                source: source.clone(),
            });
        }
    }

    fn collect_node(&mut self, layers: &[ConfigLayer], profile: &str, filter: Option<&ProfileSchema>) {
        let allowed = |key: &str| filter.map_or(true, |schema| schema.knows(key));

        for layer in layers {
            let Some(node) = layer.document.find(profile) else {
                continue;
            };
            let source = ArgSource {
                layer: layer.kind,
                path: layer.path.clone(),
                profile: profile.to_string(),
            };
            for key in node.secure.iter().filter(|key| allowed(key.as_str())) {
                self.offer(key, Value::Null, true, &source);
            }
            for (key, value) in node.properties.iter().filter(|(key, _)| allowed(key.as_str())) {
                if !node.is_secure(key) {
                    self.offer(key, value.clone(), false, &source);
                }
            }
        }
    }
}

#[async_trait]
impl ConfigSource for LayeredConfig {
    async fn get_all_profiles(&self, profile_type: Option<&str>) -> ConfigResult<Vec<ProfileAttributes>> {
        Ok(enumerate(&self.snapshot(), profile_type))
    }

    async fn get_default_profile(&self, profile_type: &str) -> ConfigResult<Option<ProfileAttributes>> {
        let layers = self.snapshot();
        let Some(name) = default_name(&layers, profile_type) else {
            return Ok(None);
        };

        let found = enumerate(&layers, Some(profile_type))
            .into_iter()
            .find(|attrs| attrs.name == name);
        if found.is_none() {
            warn!(
                "Default {} profile {} does not exist in any layer",
                profile_type, name
            );
        }
        Ok(found)
    }

    async fn merge_args_for_profile(
        &self,
        attrs: &ProfileAttributes,
        options: MergeOptions,
    ) -> ConfigResult<MergedArgs> {
        split_profile_name(&attrs.name)?;
        let layers = self.snapshot();
        if !layers.iter().any(|layer| layer.document.find(&attrs.name).is_some()) {
            return Err(ConfigError::ProfileNotFound {
                name: attrs.name.clone(),
            });
        }

        let mut collector = ArgCollector::default();
        for profile in inheritance_chain(&attrs.name) {
            collector.collect_node(&layers, &profile, None);
        }

        let schema = self.profile_schema(&attrs.profile_type);
        if attrs.profile_type != BASE_PROFILE_TYPE {
            if let Some(base) = default_name(&layers, BASE_PROFILE_TYPE) {
                if base != attrs.name {
                    for profile in inheritance_chain(&base) {
                        collector.collect_node(&layers, &profile, schema.as_ref());
                    }
                }
            }
        }

        let mut known_args = collector.args;
        let mut missing_args = Vec::new();

        if options.resolve_secure {
            let mut resolved = Vec::with_capacity(known_args.len());
            for mut arg in known_args {
                if arg.secure {
                    match self.resolve_secure(&arg)? {
                        Some(value) => arg.value = value,
                        None => {
                            missing_args.push(arg.name);
                            continue;
                        }
                    }
                }
                resolved.push(arg);
            }
            known_args = resolved;
        }

        if let Some(schema) = &schema {
            for key in schema.known_keys() {
                let known = known_args.iter().any(|arg| arg.name == key);
                if !known && !missing_args.iter().any(|m| m == key) {
                    missing_args.push(key.to_string());
                }
            }
        }

        Ok(MergedArgs {
            known_args,
            missing_args,
        })
    }

    async fn load_secure_arg(&self, arg: &ProfileArg) -> ConfigResult<Option<Value>> {
        if !arg.secure {
            return Ok(Some(arg.value.clone()));
        }
        self.resolve_secure(arg)
    }

    async fn is_secured(&self) -> ConfigResult<bool> {
        if self.store.is_vault() {
            return Ok(true);
        }
        credential_manager_configured(&self.paths.settings_path()).await
    }
}
