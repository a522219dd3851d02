//! # Mainframe Explorer Profiles
//!
//! Merge, token inheritance and caching of connection profiles.
//!
//! A [`ProfileCache`] enumerates profiles from a
//! [`ConfigSource`](mfe_config::ConfigSource), merges each one with
//! [`ProfileMerger`], clears tokens that must not follow a profile to another
//! endpoint ([`TokenInheritancePolicy`]) and publishes the result as one
//! immutable [`ProfileCatalog`] snapshot.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mfe_config::{AutoStore, ConfigPaths, LayeredConfig};
//! use mfe_profiles::ProfileCache;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let paths = ConfigPaths::discover(Some(std::env::current_dir()?));
//!     let store = Arc::new(AutoStore::in_home(&paths.home_dir));
//!     let config = LayeredConfig::load(paths, store).await?;
//!
//!     let cache = Arc::new(ProfileCache::new(Arc::new(config)));
//!     cache.refresh(&["zosmf", "zftp"]).await;
//!
//!     if let Some(profile) = cache.get_default_profile(None) {
//!         println!("default zosmf profile: {}", profile.name);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod cache;
mod catalog;
mod error;
mod merger;
mod profile;
mod property;
mod token_policy;
mod url_validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use cache::{ProfileCache, PREREGISTERED_TYPES};
pub use catalog::{ProfileCatalog, TypeBucket};
pub use error::{EnumerationFailure, ProfileError, ProfileResult};
pub use merger::ProfileMerger;
pub use profile::{MergedProfile, BASE_PROFILE_TYPE, DEFAULT_PROFILE_TYPE};
pub use property::{ProfileProperty, PropertyBag};
pub use token_policy::{TokenInheritancePolicy, TOKEN_TYPE_APIML};
pub use url_validation::{validate_and_parse_url, UrlValidation, DEFAULT_HTTPS_PORT};

pub use mfe_config::{ProfileSchema, PropertyKind, PropertySchema};
