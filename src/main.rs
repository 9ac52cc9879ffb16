//! sdplay - Build playlists from an audio player's SD card

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::commands::CardOptions;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "sdplay=debug" } else { "sdplay=info" };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match &cli.command {
        Commands::Build { path, mode } => {
            let options = CardOptions::from_cli(&cli)?;
            cli::commands::build(options, path.clone(), *mode).await?;
        }
        Commands::Pick { path } => {
            let options = CardOptions::from_cli(&cli)?;
            cli::commands::pick(options, path.clone()).await?;
        }
        Commands::Check { paths } => {
            cli::commands::check(paths);
        }
        Commands::Config { save } => {
            let options = CardOptions::from_cli(&cli)?;
            cli::commands::config(&options, cli.config.as_deref(), *save)?;
        }
        Commands::Completion { shell } => {
            cli::commands::completion(*shell);
        }
    }

    Ok(())
}
