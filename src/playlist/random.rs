//! Random subdirectory selection
//!
//! All immediate subdirectories are collected into a [`DelimitedList`] first,
//! then one is cut out of the buffer by its ordinal. Directory counts on a card
//! are small enough that full materialization is fine.

use rand::Rng;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::delimited::{DelimitedList, DELIMITER};
use super::enumerate;
use crate::error::{PlaylistError, Result};
use crate::fault::FaultSignal;
use crate::memory::MemoryBudget;
use crate::storage::Filesystem;

/// Longest path returned by a pick, in characters
pub const MAX_PICKED_LEN: usize = 254;

/// Picks a uniformly random immediate subdirectory
pub struct RandomSubdirectoryPicker<'a, F: Filesystem> {
    fs: &'a F,
    budget: MemoryBudget,
    chunk: usize,
    fault: Arc<dyn FaultSignal>,
}

impl<'a, F: Filesystem> RandomSubdirectoryPicker<'a, F> {
    pub fn new(fs: &'a F, budget: MemoryBudget, chunk: usize, fault: Arc<dyn FaultSignal>) -> Self {
        Self {
            fs,
            budget,
            chunk,
            fault,
        }
    }

    /// Pick a subdirectory of `path` using the thread-local RNG
    pub fn pick(&self, path: &str) -> Option<String> {
        self.pick_with(path, &mut rand::thread_rng())
    }

    /// Pick a subdirectory of `path` using the given RNG
    ///
    /// Returns `None` when `path` is missing, has no subdirectories, or the
    /// list could not be allocated. Allocation failures also raise the fault
    /// signal.
    pub fn pick_with<R: Rng + ?Sized>(&self, path: &str, rng: &mut R) -> Option<String> {
        let started = Instant::now();
        let picked = match self.try_pick(path, rng) {
            Ok(Some(dir)) => {
                info!("Picked random directory: {}", dir);
                Some(dir)
            }
            Ok(None) => {
                info!("No subdirectory found in {}", path);
                None
            }
            Err(e) => {
                if e.is_fatal_resource() {
                    self.fault.indicate_error();
                }
                error!("Unable to pick random directory from {}: {}", path, e);
                None
            }
        };
        debug!(
            "Pick random directory finished: {} ms",
            started.elapsed().as_millis()
        );
        picked
    }

    fn try_pick<R: Rng + ?Sized>(&self, path: &str, rng: &mut R) -> Result<Option<String>> {
        let entries = enumerate::children(self.fs, path)?;
        info!("Trying to pick random directory from {}", path);

        let mut list = DelimitedList::new(&self.budget, self.chunk)?;
        for dir in entries.directories() {
            match list.append(&dir.path) {
                Ok(()) => {}
                Err(PlaylistError::ReservedDelimiter(name)) => {
                    warn!("Skipping directory with reserved character: {}", name);
                }
                Err(e) => return Err(e),
            }
        }

        let count = list.count();
        if count == 0 {
            return Ok(None);
        }

        let ordinal = rng.gen_range(1..=count);
        debug!("Drew {} of {} subdirectories", ordinal, count);
        Ok(extract_nth(list.as_str(), ordinal))
    }
}

/// Cut the `ordinal`-th (1-based) entry out of a serialized list
///
/// Walks the buffer counting delimiters and stops at the end of the wanted
/// segment or after [`MAX_PICKED_LEN`] characters.
pub fn extract_nth(serialized: &str, ordinal: usize) -> Option<String> {
    if ordinal == 0 {
        return None;
    }

    let mut delimiters = 0;
    let mut picked = String::new();
    let mut taken = 0;
    for ch in serialized.chars() {
        if ch == DELIMITER {
            delimiters += 1;
            if delimiters >= ordinal {
                break;
            }
            continue;
        }
        if delimiters + 1 == ordinal {
            picked.push(ch);
            taken += 1;
            if taken == MAX_PICKED_LEN {
                break;
            }
        }
    }

    (!picked.is_empty()).then_some(picked)
}
