use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use mfe_cli::{
    cli::{Cli, Commands},
    commands::{self, CliContext},
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG directives refine the level chosen on the command line
    let env_filter = EnvFilter::builder()
        .with_default_directive(cli.level_filter().into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let rendered = match &cli.command {
        Commands::CheckUrl { url } => commands::check_url::execute(url, cli.format)?,
        _ => {
            let ctx = CliContext::load(&cli).await?;
            debug!("Catalog holds {} profiles", ctx.cache.all_profiles().len());
            commands::execute(&ctx, &cli.command).await?
        }
    };

    println!("{}", rendered);
    Ok(())
}
