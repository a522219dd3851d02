//! Profile merging
//!
//! Turns a profile reference into a flat [`PropertyBag`]. The configuration
//! source walks the layers; the merger resolves secure values and drops
//! anything no layer defines.

use mfe_config::{ConfigResult, ConfigSource, MergeOptions, ProfileAttributes};
use tracing::{debug, warn};

use crate::profile::MergedProfile;
use crate::property::PropertyBag;

/// Merges raw profile attributes into property bags.
///
/// Merging has no side effects: with unchanged configuration, repeated
/// calls return identical bags.
pub struct ProfileMerger<'a> {
    source: &'a dyn ConfigSource,
}

impl<'a> ProfileMerger<'a> {
    /// Create a merger reading from `source`
    pub fn new(source: &'a dyn ConfigSource) -> Self {
        Self { source }
    }

    /// Compute the merged property set of one profile.
    ///
    /// A profile the source cannot resolve yields an empty bag. Other source
    /// failures are returned.
    pub async fn merge_attributes(&self, attrs: &ProfileAttributes) -> ConfigResult<PropertyBag> {
        let merged = match self
            .source
            .merge_args_for_profile(attrs, MergeOptions::default())
            .await
        {
            Ok(merged) => merged,
            Err(e) if e.is_not_found() => {
                warn!("Profile {} ({}) could not be resolved: {}", attrs.name, attrs.profile_type, e);
                return Ok(PropertyBag::new());
            }
            Err(e) => return Err(e),
        };

        let schema = self.source.profile_schema(&attrs.profile_type);
        let mut bag = PropertyBag::new();
        for arg in &merged.known_args {
            let value = if arg.secure {
                self.source.load_secure_arg(arg).await?
            } else {
                Some(arg.value.clone())
            };

            let Some(value) = value else {
                debug!("No secure value stored for {}.{}", attrs.name, arg.name);
                continue;
            };

            if let Some(schema) = &schema {
                match schema.properties.get(&arg.name) {
                    None => debug!(
                        "{} profile {} carries extension property {}",
                        attrs.profile_type, attrs.name, arg.name
                    ),
                    Some(prop) if !prop.kind.matches(&value) => debug!(
                        "Property {} of {} does not match its {:?} schema type",
                        arg.name, attrs.name, prop.kind
                    ),
                    Some(_) => {}
                }
            }
            bag.insert(arg.name.clone(), value);
        }

        Ok(bag)
    }

    /// Merge attributes into a complete [`MergedProfile`].
    pub async fn merge_profile(&self, attrs: &ProfileAttributes) -> ConfigResult<MergedProfile> {
        let properties = self.merge_attributes(attrs).await?;
        Ok(MergedProfile::new(&attrs.name, &attrs.profile_type, properties))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mfe_config::{ConfigError, MockConfigSource};
    use serde_json::json;

    async fn attrs_for(source: &MockConfigSource, name: &str) -> ProfileAttributes {
        source
            .get_all_profiles(None)
            .await
            .unwrap()
            .into_iter()
            .find(|a| a.name == name)
            .expect("profile exists")
    }

    #[tokio::test]
    async fn secure_values_are_resolved_from_storage() {
        let source = MockConfigSource::new()
            .with_profile("lpar1", "zosmf", json!({ "host": "lpar1", "port": 443 }))
            .with_secure("lpar1", "password", json!("hunter2"));
        let attrs = attrs_for(&source, "lpar1").await;

        let bag = ProfileMerger::new(&source).merge_attributes(&attrs).await.unwrap();
        assert_eq!(bag.password(), Some("hunter2"));
        assert_eq!(bag.host(), Some("lpar1"));
        assert_eq!(bag.port(), Some(443));
    }

    #[tokio::test]
    async fn secure_values_stay_with_their_profile() {
        let source = MockConfigSource::new()
            .with_profile("lpar1", "zosmf", json!({ "host": "lpar1" }))
            .with_secure("lpar1", "user", json!("ibmuser"));
        source.add_profile("lpar2", "zosmf", json!({ "host": "lpar2" }));
        let lpar2 = attrs_for(&source, "lpar2").await;

        let bag = ProfileMerger::new(&source).merge_attributes(&lpar2).await.unwrap();
        assert!(!bag.is_known("user"));
        assert_eq!(bag.len(), 1);
    }

    #[tokio::test]
    async fn unknown_profile_merges_to_empty_bag() {
        let source = MockConfigSource::new().with_profile("lpar1", "zosmf", json!({ "host": "h" }));
        let mut attrs = attrs_for(&source, "lpar1").await;
        attrs.name = "ghost".into();

        let bag = ProfileMerger::new(&source).merge_attributes(&attrs).await.unwrap();
        assert!(bag.is_empty());
    }

    #[tokio::test]
    async fn other_source_failures_propagate() {
        let source = MockConfigSource::new().with_profile("lpar1", "zosmf", json!({ "host": "h" }));
        source.fail_merge_for("lpar1");
        let attrs = attrs_for(&source, "lpar1").await;

        let err = ProfileMerger::new(&source).merge_attributes(&attrs).await.unwrap_err();
        assert!(matches!(err, ConfigError::Other(_)));
    }

    #[tokio::test]
    async fn merging_is_repeatable() {
        let source = MockConfigSource::new()
            .with_profile("lpar1", "zosmf", json!({ "host": "h", "port": 1, "encoding": "IBM-1047" }))
            .with_secure("lpar1", "tokenValue", json!("t"));
        let attrs = attrs_for(&source, "lpar1").await;
        let merger = ProfileMerger::new(&source);

        let first = merger.merge_profile(&attrs).await.unwrap();
        let second = merger.merge_profile(&attrs).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        assert_eq!(first.properties.get_str("encoding"), Some("IBM-1047"));
    }
}
