//! Immutable catalog snapshots.
//!
//! A [`ProfileCatalog`] is never mutated after it is published. Changes build
//! a new snapshot that the cache swaps in as a unit.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::warn;

use crate::profile::{MergedProfile, BASE_PROFILE_TYPE};
use crate::token_policy::TokenInheritancePolicy;

/// Profiles enumerated for one type, in source order.
#[derive(Debug, Clone, Default)]
pub struct TypeBucket {
    /// Type that was enumerated
    pub profile_type: String,
    /// Merged profiles of that type
    pub profiles: Vec<MergedProfile>,
    /// Name of the profile the source marks as default
    pub default_name: Option<String>,
}

impl TypeBucket {
    /// Create an empty bucket
    pub fn new(profile_type: impl Into<String>) -> Self {
        Self {
            profile_type: profile_type.into(),
            ..Default::default()
        }
    }

    /// The default profile of this bucket, if it was enumerated
    pub fn default_profile(&self) -> Option<&MergedProfile> {
        let name = self.default_name.as_deref()?;
        self.profiles.iter().find(|p| p.name == name)
    }
}

/// Every known profile, grouped by type, with one default per type.
///
/// Entries are unique by `(name, type)`. Per-type lists keep the order of
/// the flat list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileCatalog {
    all_profiles: Vec<Arc<MergedProfile>>,
    profiles_by_type: HashMap<String, Vec<Arc<MergedProfile>>>,
    default_profile_by_type: HashMap<String, Arc<MergedProfile>>,
    all_types: Vec<String>,
}

impl ProfileCatalog {
    /// An empty catalog
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a catalog from enumerated buckets.
    ///
    /// The token policy runs against the base bucket's default profile (or
    /// its first profile when no default is set) before defaults are
    /// resolved, so a default pointer always refers to the adjusted entry.
    pub fn assemble(buckets: Vec<TypeBucket>, policy: &TokenInheritancePolicy) -> Self {
        let base = buckets
            .iter()
            .find(|b| b.profile_type == BASE_PROFILE_TYPE)
            .and_then(|b| b.default_profile().or_else(|| b.profiles.first()))
            .cloned();

        let mut catalog = Self::empty();
        let mut seen: HashSet<(String, String)> = HashSet::new();

        for bucket in buckets {
            let mut typed = Vec::with_capacity(bucket.profiles.len());
            for mut profile in bucket.profiles {
                if !seen.insert((profile.name.clone(), profile.profile_type.clone())) {
                    warn!(
                        "Skipping duplicate {} profile {}",
                        profile.profile_type, profile.name
                    );
                    continue;
                }
                policy.enforce(&mut profile, base.as_ref());

                let profile = Arc::new(profile);
                catalog.all_profiles.push(Arc::clone(&profile));
                typed.push(profile);
            }

            if !typed.is_empty() {
                if let Some(default) = bucket
                    .default_name
                    .as_deref()
                    .and_then(|name| typed.iter().find(|p| p.name == name))
                {
                    catalog
                        .default_profile_by_type
                        .insert(bucket.profile_type.clone(), Arc::clone(default));
                }
                catalog
                    .profiles_by_type
                    .insert(bucket.profile_type.clone(), typed);
            }

            if !catalog.all_types.contains(&bucket.profile_type) {
                catalog.all_types.push(bucket.profile_type);
            }
        }

        catalog
    }

    /// All profiles in catalog order
    pub fn all_profiles(&self) -> &[Arc<MergedProfile>] {
        &self.all_profiles
    }

    /// Profiles of one type in catalog order; empty for unknown types
    pub fn profiles_by_type(&self, profile_type: &str) -> &[Arc<MergedProfile>] {
        self.profiles_by_type
            .get(profile_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Default profile of a type
    pub fn default_profile(&self, profile_type: &str) -> Option<&Arc<MergedProfile>> {
        self.default_profile_by_type.get(profile_type)
    }

    /// Types the catalog was built from, in enumeration order
    pub fn all_types(&self) -> &[String] {
        &self.all_types
    }

    /// Types that have a default profile
    pub fn default_types(&self) -> impl Iterator<Item = (&str, &Arc<MergedProfile>)> {
        self.all_types.iter().filter_map(|t| {
            self.default_profile_by_type
                .get(t)
                .map(|profile| (t.as_str(), profile))
        })
    }

    /// First entry named `name`, restricted to `profile_type` when given
    pub fn find(&self, name: &str, profile_type: Option<&str>) -> Option<&Arc<MergedProfile>> {
        self.all_profiles
            .iter()
            .find(|p| p.name == name && profile_type.map_or(true, |t| p.profile_type == t))
    }

    /// The default base profile, else the first base profile
    pub fn base_profile(&self) -> Option<&Arc<MergedProfile>> {
        self.default_profile(BASE_PROFILE_TYPE)
            .or_else(|| self.profiles_by_type(BASE_PROFILE_TYPE).first())
    }

    /// Number of profiles
    pub fn len(&self) -> usize {
        self.all_profiles.len()
    }

    /// Whether the catalog holds no profile
    pub fn is_empty(&self) -> bool {
        self.all_profiles.is_empty()
    }

    /// A copy of this catalog with the entry matching `updated`'s
    /// `(name, type)` replaced, along with the type's default pointer when it
    /// referred to that entry.
    ///
    /// Returns `None` when no entry matches.
    pub fn with_replaced(&self, updated: MergedProfile) -> Option<Self> {
        let index = self
            .all_profiles
            .iter()
            .position(|p| p.matches(&updated.name, &updated.profile_type))?;

        let updated = Arc::new(updated);
        let mut next = self.clone();
        next.all_profiles[index] = Arc::clone(&updated);

        if let Some(typed) = next.profiles_by_type.get_mut(&updated.profile_type) {
            for entry in typed.iter_mut() {
                if entry.matches(&updated.name, &updated.profile_type) {
                    *entry = Arc::clone(&updated);
                }
            }
        }

        if let Some(default) = next.default_profile_by_type.get_mut(&updated.profile_type) {
            if default.name == updated.name {
                *default = Arc::clone(&updated);
            }
        }

        Some(next)
    }
}
