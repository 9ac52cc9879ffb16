//! Storage abstraction for the player's card
//!
//! Everything above this module sees the card as `/`-separated absolute
//! paths. Calls are synchronous and block until the card answers.

use std::io::{self, Read, Write};

pub mod card;
pub mod memory;

pub use card::CardFilesystem;
pub use memory::MemoryFilesystem;

/// What the playlist core needs to know about a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metadata {
    pub is_dir: bool,
    /// Size in bytes (0 for directories)
    pub len: u64,
}

/// Immediate child of a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildEntry {
    /// Full card path of the child
    pub path: String,
    pub is_dir: bool,
}

impl ChildEntry {
    /// Final path segment
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Lazy sequence of a directory's immediate children
pub type Children<'a> = Box<dyn Iterator<Item = io::Result<ChildEntry>> + 'a>;

/// Filesystem capability consumed by the playlist core
pub trait Filesystem {
    /// Sequential reader for an open file
    type Reader: Read;
    /// Sequential writer for a created file
    type Writer: Write;

    fn metadata(&self, path: &str) -> io::Result<Metadata>;

    fn exists(&self, path: &str) -> bool {
        self.metadata(path).is_ok()
    }

    /// Immediate children in the filesystem's native order
    fn read_dir(&self, path: &str) -> io::Result<Children<'_>>;

    fn open_read(&self, path: &str) -> io::Result<Self::Reader>;

    /// Create (or truncate) a file for writing
    fn create(&self, path: &str) -> io::Result<Self::Writer>;
}

/// Join a directory and a child name into a card path
pub fn join(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{}{}", dir, name)
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Directory part of a card path (`/` for top-level entries)
pub fn parent(path: &str) -> &str {
    match path.trim_end_matches('/').rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &path[..idx],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join() {
        assert_eq!(join("/Music", "a.mp3"), "/Music/a.mp3");
        assert_eq!(join("/", "Music"), "/Music");
        assert_eq!(join("/Music/", "a.mp3"), "/Music/a.mp3");
    }

    #[test]
    fn test_parent() {
        assert_eq!(parent("/Music/Album/list.m3u"), "/Music/Album");
        assert_eq!(parent("/list.m3u"), "/");
        assert_eq!(parent("list.m3u"), "/");
    }

    #[test]
    fn test_child_name() {
        let entry = ChildEntry {
            path: "/Music/Album/01 - Intro.flac".to_string(),
            is_dir: false,
        };
        assert_eq!(entry.name(), "01 - Intro.flac");
    }
}
