//! Memory profile and allocation accounting
//!
//! Players with extended memory (PSRAM) can afford large buffer chunks, the
//! rest grow in small steps. Every playlist buffer reserves its bytes from a
//! shared [`MemoryBudget`] so exhaustion can be simulated and leaks detected.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

use crate::error::{PlaylistError, Result};

/// Chunk size used with extended memory
pub const EXTENDED_CHUNK: usize = 65535;
/// Chunk size for directory playlists without extended memory
pub const PLAYLIST_CHUNK: usize = 4096;
/// Chunk size for subdirectory lists and m3u buffers without extended memory
pub const LIST_CHUNK: usize = 1024;

/// Buffer growth steps, chosen once at boot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryProfile {
    /// Chunk for the directory-scan playlist buffer
    pub playlist_chunk: usize,
    /// Chunk for subdirectory lists and m3u parsing
    pub list_chunk: usize,
}

impl MemoryProfile {
    /// Pick chunk sizes depending on whether extended memory is present
    pub fn detect(extended_memory: bool) -> Self {
        if extended_memory {
            Self {
                playlist_chunk: EXTENDED_CHUNK,
                list_chunk: EXTENDED_CHUNK,
            }
        } else {
            Self {
                playlist_chunk: PLAYLIST_CHUNK,
                list_chunk: LIST_CHUNK,
            }
        }
    }
}

impl Default for MemoryProfile {
    fn default() -> Self {
        Self::detect(false)
    }
}

#[derive(Debug)]
struct BudgetInner {
    in_use: AtomicUsize,
    limit: Option<usize>,
}

/// Shared allocation counter with an optional ceiling
#[derive(Debug, Clone)]
pub struct MemoryBudget {
    inner: Arc<BudgetInner>,
}

impl MemoryBudget {
    /// Budget without a ceiling
    pub fn unlimited() -> Self {
        Self::build(None)
    }

    /// Budget that refuses reservations beyond `limit` bytes
    pub fn with_limit(limit: usize) -> Self {
        Self::build(Some(limit))
    }

    fn build(limit: Option<usize>) -> Self {
        Self {
            inner: Arc::new(BudgetInner {
                in_use: AtomicUsize::new(0),
                limit,
            }),
        }
    }

    /// Bytes currently held by live reservations
    pub fn in_use(&self) -> usize {
        self.inner.in_use.load(Ordering::SeqCst)
    }

    pub fn limit(&self) -> Option<usize> {
        self.inner.limit
    }

    /// Reserve `bytes`, returning a guard that gives them back on drop
    pub fn reserve(&self, bytes: usize) -> Result<Reservation> {
        self.acquire(bytes)?;
        Ok(Reservation {
            budget: self.clone(),
            bytes,
        })
    }

    fn acquire(&self, bytes: usize) -> Result<()> {
        let limit = self.inner.limit;
        self.inner
            .in_use
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                let next = current.checked_add(bytes)?;
                match limit {
                    Some(max) if next > max => None,
                    _ => Some(next),
                }
            })
            .map(|_| ())
            .map_err(|current| {
                debug!("Reservation of {} bytes refused ({} in use)", bytes, current);
                PlaylistError::OutOfMemory {
                    requested: bytes,
                    limit,
                }
            })
    }

    fn release(&self, bytes: usize) {
        self.inner.in_use.fetch_sub(bytes, Ordering::SeqCst);
    }
}

impl Default for MemoryBudget {
    fn default() -> Self {
        Self::unlimited()
    }
}

/// Bytes held against a [`MemoryBudget`]
#[derive(Debug)]
pub struct Reservation {
    budget: MemoryBudget,
    bytes: usize,
}

impl Reservation {
    pub fn bytes(&self) -> usize {
        self.bytes
    }

    /// Enlarge the reservation; on failure the current size is kept
    pub fn grow(&mut self, extra: usize) -> Result<()> {
        self.budget.acquire(extra)?;
        self.bytes += extra;
        Ok(())
    }

    /// Give back part of the reservation
    pub fn shrink(&mut self, bytes: usize) {
        let bytes = bytes.min(self.bytes);
        self.budget.release(bytes);
        self.bytes -= bytes;
    }

    /// Ceiling of the budget this reservation is held against
    pub fn limit(&self) -> Option<usize> {
        self.budget.limit()
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        self.budget.release(self.bytes);
    }
}
