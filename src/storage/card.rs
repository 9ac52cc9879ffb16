//! Mounted card backed by `std::fs`

use std::fs::{self, File};
use std::io;
use std::path::PathBuf;

use super::{join, ChildEntry, Children, Filesystem, Metadata};

/// Card mounted at a host directory
///
/// Card paths such as `/Music/a.mp3` resolve relative to the mount point.
#[derive(Debug, Clone)]
pub struct CardFilesystem {
    root: PathBuf,
}

impl CardFilesystem {
    /// Create a filesystem rooted at the card's mount point
    pub fn new(mount_point: impl Into<PathBuf>) -> Self {
        Self {
            root: mount_point.into(),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl Filesystem for CardFilesystem {
    type Reader = File;
    type Writer = File;

    fn metadata(&self, path: &str) -> io::Result<Metadata> {
        let meta = fs::metadata(self.resolve(path))?;
        Ok(Metadata {
            is_dir: meta.is_dir(),
            len: if meta.is_dir() { 0 } else { meta.len() },
        })
    }

    fn read_dir(&self, path: &str) -> io::Result<Children<'_>> {
        let dir = path.to_string();
        let entries = fs::read_dir(self.resolve(path))?;
        Ok(Box::new(entries.map(move |entry| {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            Ok(ChildEntry {
                path: join(&dir, &name),
                is_dir: entry.file_type()?.is_dir(),
            })
        })))
    }

    fn open_read(&self, path: &str) -> io::Result<File> {
        File::open(self.resolve(path))
    }

    fn create(&self, path: &str) -> io::Result<File> {
        File::create(self.resolve(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    #[test]
    fn test_resolves_card_paths_under_mount_point() {
        let mount = tempfile::tempdir().unwrap();
        fs::create_dir(mount.path().join("Music")).unwrap();
        fs::write(mount.path().join("Music").join("a.mp3"), b"abc").unwrap();

        let card = CardFilesystem::new(mount.path());
        assert!(card.metadata("/Music").unwrap().is_dir);
        assert_eq!(card.metadata("/Music/a.mp3").unwrap().len, 3);
        assert!(!card.exists("/Music/b.mp3"));

        let children: Vec<ChildEntry> = card
            .read_dir("/Music")
            .unwrap()
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(
            children,
            vec![ChildEntry {
                path: "/Music/a.mp3".to_string(),
                is_dir: false
            }]
        );
    }

    #[test]
    fn test_create_and_read_back() {
        let mount = tempfile::tempdir().unwrap();
        let card = CardFilesystem::new(mount.path());

        let mut writer = card.create("/notes.txt").unwrap();
        writer.write_all(b"hello").unwrap();
        drop(writer);

        let mut contents = String::new();
        card.open_read("/notes.txt")
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "hello");
    }
}
