//! Immediate children of a card directory

use tracing::warn;

use super::filename;
use crate::error::{PlaylistError, Result};
use crate::storage::{ChildEntry, Children, Filesystem};

/// Open `path` for enumeration
///
/// Only immediate children are visited, in the filesystem's own order.
/// Errors are returned, not logged; callers report them once.
pub fn children<'a, F: Filesystem>(fs: &'a F, path: &str) -> Result<Entries<'a>> {
    let meta = fs
        .metadata(path)
        .map_err(|e| PlaylistError::from_io(path, e))?;
    if !meta.is_dir {
        return Err(PlaylistError::NotADirectory(path.to_string()));
    }

    let inner = fs
        .read_dir(path)
        .map_err(|e| PlaylistError::from_io(path, e))?;
    Ok(Entries {
        inner,
        path: path.to_string(),
        done: false,
    })
}

/// Children of one directory; a read error ends the sequence
pub struct Entries<'a> {
    inner: Children<'a>,
    path: String,
    done: bool,
}

impl<'a> Entries<'a> {
    /// Only subdirectories
    pub fn directories(self) -> impl Iterator<Item = ChildEntry> + 'a {
        self.filter(|entry| entry.is_dir)
    }

    /// Only files that pass [`filename::is_valid`]
    pub fn playable_files(self) -> impl Iterator<Item = ChildEntry> + 'a {
        self.filter(|entry| !entry.is_dir && filename::is_valid(&entry.path))
    }
}

impl Iterator for Entries<'_> {
    type Item = ChildEntry;

    fn next(&mut self) -> Option<ChildEntry> {
        if self.done {
            return None;
        }
        match self.inner.next() {
            Some(Ok(entry)) => Some(entry),
            Some(Err(e)) => {
                warn!("Stopped reading {}: {}", self.path, e);
                self.done = true;
                None
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryFilesystem;
    use std::io;

    fn card() -> MemoryFilesystem {
        let fs = MemoryFilesystem::new();
        fs.add_file("/Test/b.mp3", "b")
            .add_dir("/Test/Album")
            .add_file("/Test/a.mp3", "a")
            .add_file("/Test/.skip.mp3", "s")
            .add_file("/Test/notes.txt", "n")
            .add_file("/Test/Album/deep.mp3", "d");
        fs
    }

    #[test]
    fn test_lists_immediate_children_in_order() {
        let fs = card();
        let names: Vec<String> = children(&fs, "/Test")
            .unwrap()
            .map(|entry| entry.name().to_string())
            .collect();
        assert_eq!(names, vec!["b.mp3", "Album", "a.mp3", ".skip.mp3", "notes.txt"]);
    }

    #[test]
    fn test_playable_files_filters() {
        let fs = card();
        let paths: Vec<String> = children(&fs, "/Test")
            .unwrap()
            .playable_files()
            .map(|entry| entry.path)
            .collect();
        assert_eq!(paths, vec!["/Test/b.mp3", "/Test/a.mp3"]);
    }

    #[test]
    fn test_directories_only() {
        let fs = card();
        let dirs: Vec<String> = children(&fs, "/Test")
            .unwrap()
            .directories()
            .map(|entry| entry.path)
            .collect();
        assert_eq!(dirs, vec!["/Test/Album"]);
    }

    struct LockedCard;

    impl Filesystem for LockedCard {
        type Reader = std::io::Empty;
        type Writer = std::io::Sink;

        fn metadata(&self, _path: &str) -> io::Result<crate::storage::Metadata> {
            Err(io::Error::from(io::ErrorKind::PermissionDenied))
        }

        fn read_dir(&self, _path: &str) -> io::Result<Children<'_>> {
            Err(io::Error::from(io::ErrorKind::PermissionDenied))
        }

        fn open_read(&self, _path: &str) -> io::Result<std::io::Empty> {
            Ok(std::io::empty())
        }

        fn create(&self, _path: &str) -> io::Result<std::io::Sink> {
            Ok(std::io::sink())
        }
    }

    #[test]
    fn test_permission_error_is_not_reported_missing() {
        let err = children(&LockedCard, "/Private").err().unwrap();
        assert!(
            matches!(&err, PlaylistError::Io { path, source }
                if path == "/Private" && source.kind() == io::ErrorKind::PermissionDenied),
            "{}",
            err
        );
    }

    #[test]
    fn test_missing_and_non_directory() {
        let fs = card();
        assert!(matches!(children(&fs, "/Nope"), Err(PlaylistError::NotFound(_))));
        assert!(matches!(
            children(&fs, "/Test/a.mp3"),
            Err(PlaylistError::NotADirectory(_))
        ));
    }
}
