//! sdplay - Build ordered, filtered playlists from an audio player's SD card

pub mod config;
pub mod error;
pub mod fault;
pub mod memory;
pub mod playlist;
pub mod storage;

pub use config::Settings;
pub use error::{PlaylistError, Result};
pub use fault::FaultSignal;
pub use memory::{MemoryBudget, MemoryProfile};
pub use playlist::{PlayMode, Playlist, PlaylistBuilder};
pub use storage::{CardFilesystem, Filesystem, MemoryFilesystem};
