pub mod check_url;
pub mod profiles;
pub mod secure_status;
pub mod types;

use anyhow::{Context, Result};
use mfe_config::{AutoStore, ConfigPaths, LayeredConfig};
use mfe_profiles::ProfileCache;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::cli::{Cli, Commands, OutputFormat};

/// Profile types the explorer's own APIs consume
pub const API_TYPES: [&str; 2] = ["zosmf", "zftp"];

/// Everything a command needs: a refreshed cache and the output format.
pub struct CliContext {
    pub cache: Arc<ProfileCache>,
    pub format: OutputFormat,
}

impl CliContext {
    /// Load configuration for `cli` and refresh the cache.
    pub async fn load(cli: &Cli) -> Result<Self> {
        let project_dir = match &cli.config_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("Failed to read the current directory")?,
        };
        let home_dir = cli.home.clone().unwrap_or_else(ConfigPaths::default_home);
        Self::from_paths(project_dir, home_dir, &cli.extra_types, cli.format).await
    }

    /// Load configuration from explicit directories and refresh the cache.
    pub async fn from_paths(
        project_dir: PathBuf,
        home_dir: PathBuf,
        extra_types: &[String],
        format: OutputFormat,
    ) -> Result<Self> {
        let paths = ConfigPaths::new(Some(project_dir), home_dir);
        debug!("Loading configuration with {:?}", paths);
        let store = Arc::new(AutoStore::in_home(&paths.home_dir));
        let config = LayeredConfig::load(paths, store)
            .await
            .context("Failed to load configuration layers")?;

        let cache = Arc::new(ProfileCache::new(Arc::new(config)));
        for profile_type in extra_types {
            cache.register_custom_profiles_type(profile_type.as_str());
        }
        cache.refresh(&API_TYPES).await;

        Ok(Self { cache, format })
    }
}

/// Run a command that needs configuration; returns the rendered output.
pub async fn execute(ctx: &CliContext, command: &Commands) -> Result<String> {
    match command {
        Commands::Profiles(cmd) => profiles::execute(ctx, cmd),
        Commands::Types => types::execute(ctx),
        Commands::CheckUrl { url } => check_url::execute(url, ctx.format),
        Commands::SecureStatus => secure_status::execute(ctx).await,
    }
}

pub(crate) fn to_json(value: &impl serde::Serialize) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to render JSON")
}
