//! # Mainframe Explorer Configuration
//!
//! Layered team configuration for mainframe connection profiles.
//!
//! ## Features
//!
//! - Four precedence layers (project user, project, global user, global)
//! - Nested profile groups with property inheritance
//! - A shared `base` profile whose connection and token properties flow into
//!   service profiles
//! - Secure property values kept out of the layer files, in a secrets file or
//!   the OS keyring (feature `keyring`)
//! - A [`ConfigSource`] trait so the profile cache can run against any store
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mfe_config::{AutoStore, ConfigPaths, ConfigSource, LayeredConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let paths = ConfigPaths::discover(Some(std::env::current_dir()?));
//!     let store = Arc::new(AutoStore::in_home(&paths.home_dir));
//!     let config = LayeredConfig::load(paths, store).await?;
//!     for profile in config.get_all_profiles(Some("zosmf")).await? {
//!         println!("{} ({})", profile.name, profile.location.layer);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod attributes;
pub mod credentials;
mod error;
mod layered;
pub mod layers;
pub mod schema;
pub mod settings;
mod source;

#[cfg(feature = "test-utils")]
mod test_utils;

pub use attributes::{
    ArgSource, MergeOptions, MergedArgs, ProfileArg, ProfileAttributes, ProfileLocation,
};
#[cfg(feature = "keyring")]
pub use credentials::KeyringStore;
pub use credentials::{
    AutoStore, CredentialError, CredentialResult, CredentialStore, MemoryStore, SecretsFile,
};
pub use error::{ConfigError, ConfigResult};
pub use layered::{LayeredConfig, BASE_PROFILE_TYPE};
pub use layers::{ConfigLayer, ConfigPaths, LayerDocument, LayerKind, ProfileMap, ProfileNode};
pub use schema::{ProfileSchema, PropertyKind, PropertySchema};
pub use source::ConfigSource;

#[cfg(feature = "test-utils")]
pub use test_utils::MockConfigSource;
