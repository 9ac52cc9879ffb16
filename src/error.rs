//! Error types for playlist construction

use std::io;
use thiserror::Error;

/// Everything that can go wrong while reading the card or building a playlist
#[derive(Error, Debug)]
pub enum PlaylistError {
    #[error("file or directory does not exist: {0}")]
    NotFound(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("not a file: {0}")]
    NotAFile(String),

    #[error("file is empty: {0}")]
    EmptyFile(String),

    /// Cache file exists but holds zero bytes. Callers rescan instead.
    #[error("playlist cache found but it is empty: {0}")]
    EmptyCacheFile(String),

    #[error("unable to allocate {requested} bytes for playlist (limit {limit:?})")]
    OutOfMemory {
        requested: usize,
        limit: Option<usize>,
    },

    #[error("entry contains the reserved delimiter: {0}")]
    ReservedDelimiter(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Result type alias for playlist operations
pub type Result<T> = std::result::Result<T, PlaylistError>;

impl PlaylistError {
    /// Wrap an I/O error with the card path it happened on
    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        PlaylistError::Io {
            path: path.into(),
            source,
        }
    }

    /// Map an I/O error, turning `NotFound` into the dedicated variant
    pub fn from_io(path: &str, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            PlaylistError::NotFound(path.to_string())
        } else {
            PlaylistError::io(path, source)
        }
    }

    /// Resource exhaustion, the only condition reported on the fault channel
    pub fn is_fatal_resource(&self) -> bool {
        matches!(self, PlaylistError::OutOfMemory { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_out_of_memory_is_fatal() {
        let oom = PlaylistError::OutOfMemory {
            requested: 1024,
            limit: Some(512),
        };
        assert!(oom.is_fatal_resource());
        assert!(!PlaylistError::NotFound("/x".into()).is_fatal_resource());
        assert!(!PlaylistError::EmptyCacheFile("/x/playlistcache.csv".into()).is_fatal_resource());
    }

    #[test]
    fn test_from_io_maps_not_found() {
        let err = PlaylistError::from_io("/gone", io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, PlaylistError::NotFound(p) if p == "/gone"));

        let err = PlaylistError::from_io("/locked", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, PlaylistError::Io { .. }));
    }
}
