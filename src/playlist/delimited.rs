//! Growable delimiter-joined list of strings
//!
//! The same flat layout is used for directory scans, the on-card cache file
//! and normalized m3u content: every entry is followed by [`DELIMITER`], and
//! empty entries never make it into the buffer.

use tracing::{debug, error};

use crate::error::{PlaylistError, Result};
use crate::memory::{MemoryBudget, Reservation};

/// Reserved separator, never allowed inside an entry
pub const DELIMITER: char = '#';

/// Flat list of entries, grown in fixed-size chunks
#[derive(Debug)]
pub struct DelimitedList {
    buf: String,
    chunk: usize,
    chunks: usize,
    entries: usize,
    reservation: Reservation,
}

impl DelimitedList {
    /// Allocate a list holding one chunk of `chunk` bytes
    pub fn new(budget: &MemoryBudget, chunk: usize) -> Result<Self> {
        let chunk = chunk.max(1);
        let reservation = budget.reserve(chunk).inspect_err(|_| {
            error!("Unable to allocate memory for linear playlist");
        })?;

        let mut buf = String::new();
        buf.try_reserve_exact(chunk).map_err(|_| {
            error!("Unable to allocate memory for linear playlist");
            PlaylistError::OutOfMemory {
                requested: chunk,
                limit: budget.limit(),
            }
        })?;

        Ok(Self {
            buf,
            chunk,
            chunks: 1,
            entries: 0,
            reservation,
        })
    }

    /// Build a list from already serialized text, dropping empty segments
    pub fn from_serialized(budget: &MemoryBudget, chunk: usize, text: &str) -> Result<Self> {
        let mut list = Self::new(budget, chunk)?;
        for segment in text.split(DELIMITER) {
            list.append(segment)?;
        }
        Ok(list)
    }

    /// Append one entry followed by the delimiter
    ///
    /// Empty entries are ignored. Entries containing the delimiter are refused
    /// since they would split into two on the way out.
    pub fn append(&mut self, entry: &str) -> Result<()> {
        if entry.is_empty() {
            return Ok(());
        }
        if entry.contains(DELIMITER) {
            return Err(PlaylistError::ReservedDelimiter(entry.to_string()));
        }

        let needed = self.buf.len() + entry.len() + DELIMITER.len_utf8();
        while needed > self.capacity() {
            self.grow()?;
        }

        self.buf.push_str(entry);
        self.buf.push(DELIMITER);
        self.entries += 1;
        Ok(())
    }

    fn grow(&mut self) -> Result<()> {
        let target = (self.chunks + 1) * self.chunk;
        debug!("Growing playlist buffer to {} bytes", target);

        self.reservation.grow(self.chunk).inspect_err(|_| {
            error!("Unable to allocate memory for linear playlist");
        })?;
        if self.buf.try_reserve_exact(target - self.buf.len()).is_err() {
            error!("Unable to allocate memory for linear playlist");
            self.reservation.shrink(self.chunk);
            return Err(PlaylistError::OutOfMemory {
                requested: target,
                limit: self.reservation.limit(),
            });
        }

        self.chunks += 1;
        Ok(())
    }

    /// Entries in insertion order; may be iterated any number of times
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.buf.split(DELIMITER).filter(|entry| !entry.is_empty())
    }

    /// Count entries by scanning the buffer for delimiters
    pub fn len_entries(&self) -> usize {
        self.buf.matches(DELIMITER).count()
    }

    /// Entry count tracked while appending
    pub fn count(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Serialized form, as written to a cache file
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Bytes available before the next growth step
    pub fn capacity(&self) -> usize {
        self.chunks * self.chunk
    }

    pub fn chunks(&self) -> usize {
        self.chunks
    }
}
