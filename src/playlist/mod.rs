//! Playlist construction from the card

pub mod builder;
pub mod cache;
pub mod delimited;
pub mod enumerate;
pub mod filename;
pub mod m3u;
pub mod random;

pub use builder::{PlayMode, Playlist, PlaylistBuilder};
pub use cache::PlaylistCache;
pub use delimited::{DelimitedList, DELIMITER};
pub use random::RandomSubdirectoryPicker;
