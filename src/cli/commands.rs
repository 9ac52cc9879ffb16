//! CLI command handlers

use anyhow::{Context, Result};
use clap_complete::generate;
use colored::Colorize;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use sdplay::playlist::filename;
use sdplay::{CardFilesystem, PlayMode, PlaylistBuilder, Settings};

use super::Cli;

/// Card location and effective settings shared by all card commands
pub struct CardOptions {
    pub root: PathBuf,
    pub settings: Settings,
}

impl CardOptions {
    /// Load settings and apply command line overrides
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut settings = match &cli.config {
            Some(path) => Settings::load_from(path)?,
            None => Settings::load().unwrap_or_default(),
        };
        if cli.extended_memory {
            settings.extended_memory = true;
        }
        if cli.no_cache {
            settings.playlist_cache = false;
        }
        debug!("Effective settings: {:?}", settings);

        Ok(Self {
            root: cli.root.clone(),
            settings,
        })
    }

    fn builder(&self) -> PlaylistBuilder<CardFilesystem> {
        PlaylistBuilder::new(CardFilesystem::new(self.root.clone()), &self.settings)
    }
}

/// Handle the `build` command
pub async fn build(options: CardOptions, path: String, mode: PlayMode) -> Result<()> {
    println!(
        "{} {} ({})",
        "Building playlist for".cyan(),
        path,
        mode.to_string().cyan()
    );

    let builder = options.builder();
    let target = path.clone();
    let result = tokio::task::spawn_blocking(move || builder.build(&target, mode))
        .await
        .context("Playlist task failed")?;

    let playlist = result.with_context(|| format!("No playable content at {}", path))?;

    println!();
    if playlist.is_empty() {
        println!("{}", "No playable files found.".yellow());
        return Ok(());
    }

    println!("{} {}", "Tracks:".green().bold(), playlist.count());
    for (index, entry) in playlist.iter().enumerate() {
        println!("  {:>4}  {}", index + 1, entry);
    }

    Ok(())
}

/// Handle the `pick` command
pub async fn pick(options: CardOptions, path: String) -> Result<()> {
    let builder = options.builder();
    let target = path.clone();
    let picked = tokio::task::spawn_blocking(move || builder.picker().pick(&target))
        .await
        .context("Pick task failed")?;

    match picked {
        Some(dir) => println!("{}", dir.green()),
        None => println!("{} {}", "No subdirectory to pick in".yellow(), path),
    }

    Ok(())
}

/// Handle the `check` command
pub fn check(paths: &[String]) {
    for path in paths {
        if filename::is_valid(path) {
            println!("{}  {}", "ok  ".green(), path);
        } else {
            println!("{}  {}", "skip".yellow(), path);
        }
    }
}

/// Handle the `config` command
pub fn config(options: &CardOptions, target: Option<&Path>, save: bool) -> Result<()> {
    let settings = &options.settings;
    println!("{}", "Settings:".cyan().bold());
    println!("  extended_memory: {}", settings.extended_memory);
    println!("  playlist_cache:  {}", settings.playlist_cache);
    println!("  cache_file_name: {}", settings.cache_file_name);

    if save {
        let path = match target {
            Some(path) => path.to_path_buf(),
            None => Settings::config_path()?,
        };
        settings.save_to(&path)?;
        println!("{} {}", "Saved to".green(), path.display());
    }

    Ok(())
}

/// Handle the `completion` command
pub fn completion(shell: clap_complete::Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "sdplay", &mut io::stdout());
}

// Extension trait for Cli to get clap Command
impl Cli {
    fn command() -> clap::Command {
        <Self as clap::CommandFactory>::command()
    }
}
