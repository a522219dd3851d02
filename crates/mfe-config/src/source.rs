//! The configuration source seam.

use async_trait::async_trait;

use crate::attributes::{MergeOptions, MergedArgs, ProfileArg, ProfileAttributes};
use crate::error::ConfigResult;
use crate::schema::ProfileSchema;

/// Layered, hierarchical store of connection profiles.
///
/// Implement this trait to back the profile cache with a different store
/// (remote config service, test fixture). [`LayeredConfig`](crate::LayeredConfig)
/// is the on-disk implementation.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Enumerate profiles, optionally restricted to one type.
    async fn get_all_profiles(&self, profile_type: Option<&str>) -> ConfigResult<Vec<ProfileAttributes>>;

    /// The profile marked as default for `profile_type`, if any.
    async fn get_default_profile(&self, profile_type: &str) -> ConfigResult<Option<ProfileAttributes>>;

    /// Walk the layers and collect every argument that applies to a profile.
    ///
    /// Fails with [`ConfigError::ProfileNotFound`](crate::ConfigError::ProfileNotFound)
    /// when the profile does not exist.
    async fn merge_args_for_profile(
        &self,
        attrs: &ProfileAttributes,
        options: MergeOptions,
    ) -> ConfigResult<MergedArgs>;

    /// Resolve the value of a secure argument. Plain arguments resolve to
    /// their own value.
    async fn load_secure_arg(&self, arg: &ProfileArg) -> ConfigResult<Option<serde_json::Value>>;

    /// Whether the active credential storage is vault-backed.
    async fn is_secured(&self) -> ConfigResult<bool>;

    /// Property schema for a profile type.
    fn profile_schema(&self, profile_type: &str) -> Option<ProfileSchema> {
        ProfileSchema::builtin(profile_type)
    }
}
