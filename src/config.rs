//! Player settings persistence
//!
//! Stores playlist settings in ~/.config/sdplay/settings.json. A missing file
//! means defaults; command line flags override whatever was loaded.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::memory::MemoryProfile;

/// Reserved name of the per-directory playlist cache
pub const DEFAULT_CACHE_FILE: &str = "playlistcache.csv";

/// Persistent playlist settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Extended memory (PSRAM) is available, use large buffer chunks
    pub extended_memory: bool,
    /// Read and write per-directory playlist caches
    pub playlist_cache: bool,
    /// File name of the cache stored inside each scanned directory
    pub cache_file_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            extended_memory: false,
            playlist_cache: true,
            cache_file_name: DEFAULT_CACHE_FILE.to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load settings from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {:?}", path))?;

        let settings: Self =
            serde_json::from_str(&contents).with_context(|| "Failed to parse settings")?;

        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save settings to an explicit file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let contents =
            serde_json::to_string_pretty(self).context("Failed to serialize settings")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write settings to {:?}", path))?;

        debug!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Get the settings file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("sdplay").join("settings.json"))
    }

    /// Buffer chunk sizes implied by these settings
    pub fn memory_profile(&self) -> MemoryProfile {
        MemoryProfile::detect(self.extended_memory)
    }
}
