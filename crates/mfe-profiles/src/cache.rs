//! The profile cache.
//!
//! [`ProfileCache`] owns the catalog every consumer reads from. Reads are
//! synchronous and see one complete snapshot; `refresh` rebuilds the catalog
//! from the configuration source and swaps it in as a unit.

use std::collections::BTreeMap;
use std::sync::Arc;

use mfe_config::{ConfigSource, ProfileAttributes, ProfileSchema};
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::catalog::{ProfileCatalog, TypeBucket};
use crate::error::{EnumerationFailure, ProfileError, ProfileResult};
use crate::merger::ProfileMerger;
use crate::profile::{MergedProfile, BASE_PROFILE_TYPE, DEFAULT_PROFILE_TYPE};
use crate::token_policy::TokenInheritancePolicy;
use crate::url_validation::{validate_and_parse_url, UrlValidation};

/// Extension types registered on every new cache
pub const PREREGISTERED_TYPES: [&str; 1] = ["ssh"];

/// Shared, explicitly constructed cache of merged profiles.
///
/// Construct one per application and hand it to consumers as
/// `Arc<ProfileCache>`.
pub struct ProfileCache {
    source: Arc<dyn ConfigSource>,
    catalog: RwLock<Arc<ProfileCatalog>>,
    external_types: RwLock<Vec<String>>,
    policy: TokenInheritancePolicy,
    /// Serializes refreshes; reads never take it
    refresh_gate: Mutex<()>,
}

impl ProfileCache {
    /// Create an empty cache over `source`
    pub fn new(source: Arc<dyn ConfigSource>) -> Self {
        Self {
            source,
            catalog: RwLock::new(Arc::new(ProfileCatalog::empty())),
            external_types: RwLock::new(PREREGISTERED_TYPES.iter().map(|t| t.to_string()).collect()),
            policy: TokenInheritancePolicy::default(),
            refresh_gate: Mutex::new(()),
        }
    }

    /// Use a different token inheritance policy
    pub fn with_policy(mut self, policy: TokenInheritancePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The configuration source backing this cache
    pub fn source(&self) -> &Arc<dyn ConfigSource> {
        &self.source
    }

    /// The current catalog snapshot
    pub fn snapshot(&self) -> Arc<ProfileCatalog> {
        Arc::clone(&self.catalog.read())
    }

    fn install(&self, catalog: ProfileCatalog) {
        *self.catalog.write() = Arc::new(catalog);
    }

    // ---- registration ----

    /// Add an extension profile type to the next refresh. Registering a type
    /// twice has no further effect.
    pub fn register_custom_profiles_type(&self, profile_type: impl Into<String>) {
        let profile_type = profile_type.into();
        let mut types = self.external_types.write();
        if !types.contains(&profile_type) {
            debug!("Registered profile type {}", profile_type);
            types.push(profile_type);
        }
    }

    /// Types a refresh with `known` enumerates: `known`, then the
    /// registered extension types, then `base`, without repeats.
    pub fn registered_types(&self, known: &[&str]) -> Vec<String> {
        let external = self.external_types.read();
        let mut types: Vec<String> = Vec::with_capacity(known.len() + external.len() + 1);
        let candidates = known
            .iter()
            .copied()
            .chain(external.iter().map(String::as_str))
            .chain(std::iter::once(BASE_PROFILE_TYPE));
        for profile_type in candidates {
            if !types.iter().any(|t| t == profile_type) {
                types.push(profile_type.to_string());
            }
        }
        types
    }

    // ---- refresh ----

    /// Rebuild the catalog for `known` types plus the registered extension
    /// types and `base`.
    ///
    /// Never fails. When enumeration or merging fails, the catalog is left
    /// empty and the error is logged once; [`get_all_types`](Self::get_all_types)
    /// is then empty.
    pub async fn refresh(&self, known: &[&str]) {
        let _gate = self.refresh_gate.lock().await;
        let types = self.registered_types(known);

        match self.build_catalog(&types).await {
            Ok(catalog) => {
                info!(
                    "Loaded {} profiles across {} types",
                    catalog.len(),
                    catalog.all_types().len()
                );
                self.install(catalog);
            }
            Err(failure) => {
                self.install(ProfileCatalog::empty());
                error!(profile_type = %failure.profile_type, "{}", failure);
            }
        }
    }

    /// Enumerate and merge every type in order, then assemble the catalog.
    pub async fn build_catalog(&self, types: &[String]) -> Result<ProfileCatalog, EnumerationFailure> {
        let merger = ProfileMerger::new(self.source.as_ref());
        let mut buckets = Vec::with_capacity(types.len());

        for profile_type in types {
            let attrs = self
                .source
                .get_all_profiles(Some(profile_type.as_str()))
                .await
                .map_err(|e| EnumerationFailure::new(profile_type, e))?;

            let mut bucket = TypeBucket::new(profile_type.clone());
            for attr in attrs.iter().filter(|a| &a.profile_type == profile_type) {
                let profile = merger
                    .merge_profile(attr)
                    .await
                    .map_err(|e| EnumerationFailure::new(profile_type, e))?;
                bucket.profiles.push(profile);
            }

            if !bucket.profiles.is_empty() {
                bucket.default_name = self
                    .source
                    .get_default_profile(profile_type)
                    .await
                    .map_err(|e| EnumerationFailure::new(profile_type, e))?
                    .map(|attrs| attrs.name);
            }

            debug!("Enumerated {} {} profiles", bucket.profiles.len(), profile_type);
            buckets.push(bucket);
        }

        Ok(ProfileCatalog::assemble(buckets, &self.policy))
    }

    // ---- catalog reads ----

    /// The catalog entry named `name` (of `profile_type`, when given).
    ///
    /// Fails with [`ProfileError::NotFound`] when the catalog has no match.
    pub fn load_named_profile(&self, name: &str, profile_type: Option<&str>) -> ProfileResult<Arc<MergedProfile>> {
        self.snapshot()
            .find(name, profile_type)
            .cloned()
            .ok_or_else(|| ProfileError::NotFound {
                name: name.to_string(),
                profile_type: profile_type.map(str::to_string),
            })
    }

    /// Default profile of `profile_type` (`zosmf` when `None`)
    pub fn get_default_profile(&self, profile_type: Option<&str>) -> Option<Arc<MergedProfile>> {
        self.snapshot()
            .default_profile(profile_type.unwrap_or(DEFAULT_PROFILE_TYPE))
            .cloned()
    }

    /// Profiles of `profile_type` (`zosmf` when `None`) in catalog order
    pub fn get_profiles(&self, profile_type: Option<&str>) -> Vec<Arc<MergedProfile>> {
        self.snapshot()
            .profiles_by_type(profile_type.unwrap_or(DEFAULT_PROFILE_TYPE))
            .to_vec()
    }

    /// Every profile in catalog order
    pub fn all_profiles(&self) -> Vec<Arc<MergedProfile>> {
        self.snapshot().all_profiles().to_vec()
    }

    /// Types enumerated by the last refresh
    pub fn get_all_types(&self) -> Vec<String> {
        self.snapshot().all_types().to_vec()
    }

    /// The cached base profile
    pub fn get_base_profile(&self) -> Option<Arc<MergedProfile>> {
        self.snapshot().base_profile().cloned()
    }

    /// Replace the catalog entry with `updated`'s name and type, and the
    /// type's default when it is that entry.
    ///
    /// Returns `false` when the catalog has no such entry. Applying the same
    /// update twice leaves the catalog as applying it once.
    pub fn update_profiles_arrays(&self, updated: MergedProfile) -> bool {
        let mut catalog = self.catalog.write();
        let name = updated.name.clone();
        match catalog.with_replaced(updated) {
            Some(next) => {
                *catalog = Arc::new(next);
                debug!("Updated cached profile {}", name);
                true
            }
            None => {
                debug!("Profile {} is not cached; nothing to update", name);
                false
            }
        }
    }

    // ---- fresh reads ----

    /// Freshly enumerate and merge the profiles of one type without touching
    /// the catalog. The token policy runs against the current default base.
    ///
    /// A profile that fails to merge is logged and skipped.
    pub async fn fetch_all_profiles_by_type(&self, profile_type: &str) -> ProfileResult<Vec<MergedProfile>> {
        let base = self.policy_base().await;
        self.fetch_type_with_base(profile_type, base.as_ref()).await
    }

    /// [`fetch_all_profiles_by_type`](Self::fetch_all_profiles_by_type) for
    /// every type of the last refresh.
    pub async fn fetch_all_profiles(&self) -> ProfileResult<Vec<MergedProfile>> {
        let base = self.policy_base().await;
        let mut profiles = Vec::new();
        for profile_type in self.get_all_types() {
            profiles.extend(self.fetch_type_with_base(&profile_type, base.as_ref()).await?);
        }
        Ok(profiles)
    }

    async fn fetch_type_with_base(
        &self,
        profile_type: &str,
        base: Option<&MergedProfile>,
    ) -> ProfileResult<Vec<MergedProfile>> {
        let merger = ProfileMerger::new(self.source.as_ref());
        let attrs = self.source.get_all_profiles(Some(profile_type)).await?;

        let mut profiles = Vec::with_capacity(attrs.len());
        for attr in attrs.iter().filter(|a| a.profile_type == profile_type) {
            match merger.merge_profile(attr).await {
                Ok(mut profile) => {
                    self.policy.enforce(&mut profile, base);
                    profiles.push(profile);
                }
                Err(e) => warn!("Skipping {} profile {}: {}", profile_type, attr.name, e),
            }
        }
        Ok(profiles)
    }

    /// Fetch one profile by exact type and name; `None` when it does not
    /// exist or cannot be loaded.
    pub async fn direct_load(&self, profile_type: &str, name: &str) -> Option<MergedProfile> {
        match self.fetch_all_profiles_by_type(profile_type).await {
            Ok(profiles) => profiles.into_iter().find(|p| p.name == name),
            Err(e) => {
                warn!("Could not load {} profile {}: {}", profile_type, name, e);
                None
            }
        }
    }

    /// Freshly merged default base profile, else the first base profile.
    pub async fn fetch_base_profile(&self) -> ProfileResult<Option<MergedProfile>> {
        let attrs = match self.source.get_default_profile(BASE_PROFILE_TYPE).await? {
            Some(attrs) => Some(attrs),
            None => self
                .source
                .get_all_profiles(Some(BASE_PROFILE_TYPE))
                .await?
                .into_iter()
                .next(),
        };

        match attrs {
            Some(attrs) => Ok(Some(ProfileMerger::new(self.source.as_ref()).merge_profile(&attrs).await?)),
            None => Ok(None),
        }
    }

    // A base that cannot be loaded leaves tokens untouched.
    async fn policy_base(&self) -> Option<MergedProfile> {
        match self.fetch_base_profile().await {
            Ok(base) => base,
            Err(e) => {
                warn!("Could not load the base profile: {}", e);
                None
            }
        }
    }

    /// Names of the profiles of one type, freshly enumerated
    pub async fn get_names_for_type(&self, profile_type: &str) -> ProfileResult<Vec<String>> {
        Ok(self
            .source
            .get_all_profiles(Some(profile_type))
            .await?
            .into_iter()
            .filter(|a| a.profile_type == profile_type)
            .map(|a| a.name)
            .collect())
    }

    // ---- raw configuration ----

    /// Property schema of a type; empty when the type is unknown
    pub fn get_schema(&self, profile_type: &str) -> ProfileSchema {
        self.source
            .profile_schema(profile_type)
            .unwrap_or_else(|| ProfileSchema {
                profile_type: profile_type.to_string(),
                properties: BTreeMap::new(),
            })
    }

    /// Raw attributes of the default profile of a type
    pub async fn get_default_config_profile(&self, profile_type: &str) -> Option<ProfileAttributes> {
        match self.source.get_default_profile(profile_type).await {
            Ok(attrs) => attrs,
            Err(e) => {
                warn!("Could not read the default {} profile: {}", profile_type, e);
                None
            }
        }
    }

    /// Raw attributes of a profile; `None` on a miss
    pub async fn get_profile_from_config(&self, name: &str, profile_type: Option<&str>) -> Option<ProfileAttributes> {
        match self.source.get_all_profiles(profile_type).await {
            Ok(attrs) => attrs
                .into_iter()
                .find(|a| a.name == name && profile_type.map_or(true, |t| a.profile_type == t)),
            Err(e) => {
                warn!("Could not enumerate profiles looking for {}: {}", name, e);
                None
            }
        }
    }

    /// Freshly merged profile with the token policy applied; `None` on a miss
    pub async fn get_loaded_prof_config(&self, name: &str, profile_type: Option<&str>) -> Option<MergedProfile> {
        let attrs = self.get_profile_from_config(name, profile_type).await?;
        let merger = ProfileMerger::new(self.source.as_ref());

        let mut profile = match merger.merge_profile(&attrs).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!("Could not merge profile {}: {}", name, e);
                return None;
            }
        };

        let base = self.policy_base().await;
        self.policy.enforce(&mut profile, base.as_ref());
        Some(profile)
    }

    // ---- probes ----

    /// Whether credentials live in a vault.
    ///
    /// A failing probe is logged and reported as secured.
    pub async fn is_credentials_secured(&self) -> bool {
        match self.source.is_secured().await {
            Ok(secured) => secured,
            Err(e) => {
                error!("Could not determine credential storage security: {}", e);
                true
            }
        }
    }

    /// See [`validate_and_parse_url`]
    pub fn validate_and_parse_url(&self, input: &str) -> UrlValidation {
        validate_and_parse_url(input)
    }
}

impl std::fmt::Debug for ProfileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileCache")
            .field("catalog", &self.snapshot())
            .field("external_types", &*self.external_types.read())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
