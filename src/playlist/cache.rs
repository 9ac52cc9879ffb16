//! Per-directory playlist cache
//!
//! A scanned directory may carry a cache file holding the serialized result of
//! an earlier scan. There is no header, timestamp or checksum: a present,
//! non-empty file is used as-is, even if the directory changed since.

use std::io::{Read, Write};
use tracing::{debug, info, warn};

use super::delimited::{DelimitedList, DELIMITER};
use crate::error::{PlaylistError, Result};
use crate::memory::MemoryBudget;
use crate::storage::{join, Filesystem};

/// Reads and writes cache files on one card
pub struct PlaylistCache<'a, F: Filesystem> {
    fs: &'a F,
    file_name: String,
}

impl<'a, F: Filesystem> PlaylistCache<'a, F> {
    pub fn new(fs: &'a F, file_name: impl Into<String>) -> Self {
        Self {
            fs,
            file_name: file_name.into(),
        }
    }

    /// Cache location for a directory
    pub fn path_for(&self, directory: &str) -> String {
        join(directory, &self.file_name)
    }

    pub fn exists(&self, cache_path: &str) -> bool {
        self.fs.exists(cache_path)
    }

    /// Load a cache file into a fresh list
    ///
    /// A zero-length file yields [`PlaylistError::EmptyCacheFile`].
    pub fn read(&self, cache_path: &str, budget: &MemoryBudget, chunk: usize) -> Result<DelimitedList> {
        let meta = self
            .fs
            .metadata(cache_path)
            .map_err(|e| PlaylistError::from_io(cache_path, e))?;
        if meta.len == 0 {
            warn!("Playlist cache found but it's 0 bytes: {}", cache_path);
            return Err(PlaylistError::EmptyCacheFile(cache_path.to_string()));
        }

        let size = usize::try_from(meta.len).map_err(|_| PlaylistError::OutOfMemory {
            requested: usize::MAX,
            limit: budget.limit(),
        })?;
        let _scratch = budget.reserve(size)?;
        let mut raw = Vec::new();
        raw.try_reserve_exact(size)
            .map_err(|_| PlaylistError::OutOfMemory {
                requested: size,
                limit: budget.limit(),
            })?;

        self.fs
            .open_read(cache_path)
            .and_then(|mut file| file.read_to_end(&mut raw))
            .map_err(|e| PlaylistError::io(cache_path, e))?;

        let list = DelimitedList::from_serialized(budget, chunk, &String::from_utf8_lossy(&raw))?;
        debug!("Read {} entries from cache {}", list.count(), cache_path);
        Ok(list)
    }

    /// Open a cache file for streaming writes, replacing any previous one
    pub fn writer(&self, cache_path: &str) -> Result<CacheWriter<F::Writer>> {
        let inner = self
            .fs
            .create(cache_path)
            .map_err(|e| PlaylistError::io(cache_path, e))?;
        Ok(CacheWriter {
            inner,
            path: cache_path.to_string(),
            entries: 0,
        })
    }

    /// Write all entries to a cache file, returning how many were written
    pub fn write<'e>(&self, cache_path: &str, entries: impl IntoIterator<Item = &'e str>) -> Result<usize> {
        let mut writer = self.writer(cache_path)?;
        for entry in entries {
            writer.write_entry(entry)?;
        }
        writer.finish()
    }

    /// Replace a cache file with an empty one so the next build rescans
    pub fn clear(&self, cache_path: &str) -> Result<()> {
        self.writer(cache_path)?.finish().map(|_| ())
    }
}

/// Streams entries into a cache file as they are discovered
pub struct CacheWriter<W: Write> {
    inner: W,
    path: String,
    entries: usize,
}

impl<W: Write> CacheWriter<W> {
    /// Write one entry and its delimiter
    pub fn write_entry(&mut self, entry: &str) -> Result<()> {
        let mut record = String::with_capacity(entry.len() + DELIMITER.len_utf8());
        record.push_str(entry);
        record.push(DELIMITER);
        self.inner
            .write_all(record.as_bytes())
            .map_err(|e| PlaylistError::io(self.path.as_str(), e))?;
        self.entries += 1;
        Ok(())
    }

    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Flush and close the file
    pub fn finish(mut self) -> Result<usize> {
        self.inner
            .flush()
            .map_err(|e| PlaylistError::io(self.path.as_str(), e))?;
        info!("Wrote {} entries to playlist cache {}", self.entries, self.path);
        Ok(self.entries)
    }
}
