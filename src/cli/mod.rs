//! CLI module for sdplay

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use sdplay::PlayMode;

pub mod commands;

#[derive(Parser, Debug)]
#[command(name = "sdplay", about = "Build playlists from an audio player's SD card")]
#[command(version, author)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Mount point of the card
    #[arg(short, long, global = true, env = "SDPLAY_ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true, env = "SDPLAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Use large buffer chunks as on players with extended memory
    #[arg(long, global = true)]
    pub extended_memory: bool,

    /// Never read or write playlist cache files
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the playlist for a file, directory or m3u playlist
    Build {
        /// Card path, e.g. /Music/Album
        path: String,

        /// Play mode name or numeric code
        #[arg(short, long, default_value = "all-tracks-sorted")]
        mode: PlayMode,
    },

    /// Pick a random subdirectory of a directory
    Pick {
        /// Card path of the parent directory
        path: String,
    },

    /// Check whether paths are eligible for playlists
    Check {
        /// Paths to check
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Show effective settings, optionally saving them
    Config {
        /// Write the effective settings to the settings file
        #[arg(long)]
        save: bool,
    },

    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}
