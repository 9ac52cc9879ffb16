//! Playlist construction
//!
//! Chooses between single-file, m3u, cache and directory-scan sources, then
//! splits the resulting delimited list into an owned [`Playlist`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::cache::{CacheWriter, PlaylistCache};
use super::delimited::DelimitedList;
use super::random::RandomSubdirectoryPicker;
use super::{enumerate, filename, m3u};
use crate::config::Settings;
use crate::error::{PlaylistError, Result};
use crate::fault::{FaultSignal, LogFault};
use crate::memory::{MemoryBudget, MemoryProfile, Reservation};
use crate::storage::{join, parent, Filesystem, Metadata};

/// Playback strategy requested by the player
///
/// Ordering modes (sorted, random) are applied by the player after the
/// playlist is built; here they only decide which source is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayMode {
    SingleTrack,
    SingleTrackLoop,
    Audiobook,
    AudiobookLoop,
    AllTracksSorted,
    AllTracksRandom,
    AllTracksSortedLoop,
    AllTracksRandomLoop,
    LocalM3u,
    SingleTrackOfDirRandom,
    RandomSubdirectory,
    RandomSubdirectoryRandom,
}

impl PlayMode {
    pub const ALL: [PlayMode; 12] = [
        PlayMode::SingleTrack,
        PlayMode::SingleTrackLoop,
        PlayMode::Audiobook,
        PlayMode::AudiobookLoop,
        PlayMode::AllTracksSorted,
        PlayMode::AllTracksRandom,
        PlayMode::AllTracksSortedLoop,
        PlayMode::AllTracksRandomLoop,
        PlayMode::LocalM3u,
        PlayMode::SingleTrackOfDirRandom,
        PlayMode::RandomSubdirectory,
        PlayMode::RandomSubdirectoryRandom,
    ];

    /// Numeric code stored on player cards
    pub fn code(self) -> u32 {
        match self {
            PlayMode::SingleTrack => 1,
            PlayMode::SingleTrackLoop => 2,
            PlayMode::Audiobook => 3,
            PlayMode::AudiobookLoop => 4,
            PlayMode::AllTracksSorted => 5,
            PlayMode::AllTracksRandom => 6,
            PlayMode::AllTracksSortedLoop => 7,
            PlayMode::AllTracksRandomLoop => 9,
            PlayMode::LocalM3u => 11,
            PlayMode::SingleTrackOfDirRandom => 12,
            PlayMode::RandomSubdirectory => 13,
            PlayMode::RandomSubdirectoryRandom => 14,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            PlayMode::SingleTrack => "single-track",
            PlayMode::SingleTrackLoop => "single-track-loop",
            PlayMode::Audiobook => "audiobook",
            PlayMode::AudiobookLoop => "audiobook-loop",
            PlayMode::AllTracksSorted => "all-tracks-sorted",
            PlayMode::AllTracksRandom => "all-tracks-random",
            PlayMode::AllTracksSortedLoop => "all-tracks-sorted-loop",
            PlayMode::AllTracksRandomLoop => "all-tracks-random-loop",
            PlayMode::LocalM3u => "local-m3u",
            PlayMode::SingleTrackOfDirRandom => "single-track-of-dir-random",
            PlayMode::RandomSubdirectory => "random-subdirectory",
            PlayMode::RandomSubdirectoryRandom => "random-subdirectory-random",
        }
    }

    /// Single-track modes never touch the cache
    pub fn uses_cache(self) -> bool {
        !matches!(self, PlayMode::SingleTrack | PlayMode::SingleTrackLoop)
    }
}

impl fmt::Display for PlayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PlayMode {
    type Err = String;

    /// Accepts a mode name or its numeric code
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim();
        if let Ok(code) = wanted.parse::<u32>() {
            return Self::from_code(code).ok_or_else(|| format!("unknown play mode code {}", code));
        }
        Self::ALL
            .into_iter()
            .find(|mode| mode.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown play mode '{}'", wanted))
    }
}

/// Ordered playable paths with their count
#[derive(Debug)]
pub struct Playlist {
    entries: Vec<String>,
    count: usize,
    _memory: Reservation,
}

impl Playlist {
    /// Number of entries, available without walking the list
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(String::as_str)
    }

    pub fn into_entries(self) -> Vec<String> {
        self.entries
    }
}

/// Builds playlists from one card
pub struct PlaylistBuilder<F: Filesystem> {
    fs: F,
    profile: MemoryProfile,
    budget: MemoryBudget,
    cache_enabled: bool,
    cache_file_name: String,
    fault: Arc<dyn FaultSignal>,
}

impl<F: Filesystem> PlaylistBuilder<F> {
    /// Create a builder with an unlimited budget and a log-only fault signal
    pub fn new(fs: F, settings: &Settings) -> Self {
        Self {
            fs,
            profile: settings.memory_profile(),
            budget: MemoryBudget::unlimited(),
            cache_enabled: settings.playlist_cache,
            cache_file_name: settings.cache_file_name.clone(),
            fault: Arc::new(LogFault),
        }
    }

    pub fn with_budget(mut self, budget: MemoryBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_fault(mut self, fault: Arc<dyn FaultSignal>) -> Self {
        self.fault = fault;
        self
    }

    pub fn with_profile(mut self, profile: MemoryProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn filesystem(&self) -> &F {
        &self.fs
    }

    pub fn budget(&self) -> &MemoryBudget {
        &self.budget
    }

    /// Random subdirectory picker sharing this builder's card and budget
    pub fn picker(&self) -> RandomSubdirectoryPicker<'_, F> {
        RandomSubdirectoryPicker::new(
            &self.fs,
            self.budget.clone(),
            self.profile.list_chunk,
            self.fault.clone(),
        )
    }

    /// Build the playlist for `path` under `mode`
    ///
    /// Allocation failures raise the fault signal in addition to returning
    /// [`PlaylistError::OutOfMemory`]. Every partial buffer is released before
    /// returning.
    pub fn build(&self, path: &str, mode: PlayMode) -> Result<Playlist> {
        let started = Instant::now();
        let result = self.try_build(path, mode);
        match &result {
            Ok(playlist) => info!("Number of valid files: {}", playlist.count()),
            Err(e) => {
                if e.is_fatal_resource() {
                    self.fault.indicate_error();
                }
                error!("Unable to build playlist for {}: {}", path, e);
            }
        }
        debug!(
            "Build playlist from card finished: {} ms",
            started.elapsed().as_millis()
        );
        result
    }

    fn try_build(&self, path: &str, mode: PlayMode) -> Result<Playlist> {
        let meta = self
            .fs
            .metadata(path)
            .map_err(|e| PlaylistError::from_io(path, e))?;

        if mode == PlayMode::LocalM3u {
            return self.from_m3u(path, meta);
        }
        if !meta.is_dir {
            return self.single_file(path);
        }

        let list = self.directory_list(path, mode)?;
        self.materialize(list, str::to_string)
    }

    fn single_file(&self, path: &str) -> Result<Playlist> {
        info!("File mode detected: {}", path);
        let valid = filename::is_valid(path);
        if !valid {
            warn!("Unsupported file in file mode: {}", path);
        }

        let memory = self.budget.reserve(path.len())?;
        let mut entries = Vec::new();
        if valid {
            entries.try_reserve_exact(1).map_err(|_| self.out_of_memory(path.len()))?;
            entries.push(path.to_string());
        }
        Ok(Playlist {
            count: entries.len(),
            entries,
            _memory: memory,
        })
    }

    fn from_m3u(&self, path: &str, meta: Metadata) -> Result<Playlist> {
        if meta.is_dir {
            return Err(PlaylistError::NotAFile(path.to_string()));
        }
        if meta.len == 0 {
            return Err(PlaylistError::EmptyFile(path.to_string()));
        }

        info!("Playlist generation mode: m3u");
        let reader = self
            .fs
            .open_read(path)
            .map_err(|e| PlaylistError::from_io(path, e))?;
        let list = m3u::parse(reader, path, &self.budget, self.profile.list_chunk)?;

        let base = parent(path);
        self.materialize(list, |entry| {
            if m3u::is_absolute(entry) {
                entry.to_string()
            } else {
                join(base, entry)
            }
        })
    }

    fn directory_list(&self, path: &str, mode: PlayMode) -> Result<DelimitedList> {
        let caching = self.cache_enabled && mode.uses_cache();
        let cache = PlaylistCache::new(&self.fs, self.cache_file_name.as_str());
        let cache_path = cache.path_for(path);

        if caching && cache.exists(&cache_path) {
            match cache.read(&cache_path, &self.budget, self.profile.playlist_chunk) {
                Ok(list) => {
                    info!("Playlist generation mode: cached");
                    return Ok(list);
                }
                Err(e) if e.is_fatal_resource() => return Err(e),
                Err(PlaylistError::EmptyCacheFile(_)) => {}
                Err(e) => warn!("Unable to read playlist cache, rescanning: {}", e),
            }
        }

        info!("Playlist generation mode: uncached");
        let entries = enumerate::children(&self.fs, path)?;
        let mut list = DelimitedList::new(&self.budget, self.profile.playlist_chunk)?;
        let mut writer = if caching {
            cache
                .writer(&cache_path)
                .inspect_err(|e| warn!("Unable to create playlist cache: {}", e))
                .ok()
        } else {
            None
        };

        for file in entries.playable_files() {
            match list.append(&file.path) {
                Ok(()) => {}
                Err(PlaylistError::ReservedDelimiter(name)) => {
                    warn!("Skipping file with reserved character: {}", name);
                    continue;
                }
                Err(e) => {
                    if writer.take().is_some() {
                        discard_cache(&cache, &cache_path);
                    }
                    return Err(e);
                }
            }

            if let Some(w) = writer.as_mut()
                && let Err(e) = w.write_entry(&file.path)
            {
                warn!("Unable to write playlist cache: {}", e);
                writer = None;
                discard_cache(&cache, &cache_path);
            }
        }

        if let Some(w) = writer {
            finish_cache(w, &cache, &cache_path);
        }
        Ok(list)
    }

    /// Split a delimited list into an exactly sized playlist
    fn materialize(&self, list: DelimitedList, map: impl Fn(&str) -> String) -> Result<Playlist> {
        let count = list.len_entries();
        let bytes = count * std::mem::size_of::<String>() + list.as_str().len();
        let memory = self.budget.reserve(bytes).inspect_err(|_| {
            error!("Unable to allocate memory for playlist");
        })?;

        let mut entries = Vec::new();
        entries.try_reserve_exact(count).map_err(|_| {
            error!("Unable to allocate memory for playlist");
            self.out_of_memory(bytes)
        })?;
        entries.extend(list.iter().map(map));
        drop(list);

        Ok(Playlist {
            count: entries.len(),
            entries,
            _memory: memory,
        })
    }

    fn out_of_memory(&self, requested: usize) -> PlaylistError {
        PlaylistError::OutOfMemory {
            requested,
            limit: self.budget.limit(),
        }
    }
}

fn finish_cache<W: std::io::Write, F: Filesystem>(writer: CacheWriter<W>, cache: &PlaylistCache<'_, F>, path: &str) {
    if let Err(e) = writer.finish() {
        warn!("Unable to write playlist cache: {}", e);
        discard_cache(cache, path);
    }
}

/// Leave an empty cache behind so the next build rescans
fn discard_cache<F: Filesystem>(cache: &PlaylistCache<'_, F>, path: &str) {
    if let Err(e) = cache.clear(path) {
        warn!("Unable to reset playlist cache {}: {}", path, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::FaultCounter;
    use crate::storage::MemoryFilesystem;

    fn builder(fs: MemoryFilesystem) -> PlaylistBuilder<MemoryFilesystem> {
        PlaylistBuilder::new(fs, &Settings::default())
    }

    fn test_card() -> MemoryFilesystem {
        let fs = MemoryFilesystem::new();
        fs.add_file("/Test/b.mp3", "b")
            .add_file("/Test/a.mp3", "a")
            .add_file("/Test/.skip.mp3", "s")
            .add_file("/Test/notes.txt", "n");
        fs
    }

    #[test]
    fn test_play_mode_codes_and_names() {
        for mode in PlayMode::ALL {
            assert_eq!(PlayMode::from_code(mode.code()), Some(mode));
            assert_eq!(mode.name().parse::<PlayMode>(), Ok(mode));
        }
        assert_eq!("11".parse::<PlayMode>(), Ok(PlayMode::LocalM3u));
        assert_eq!("Local-M3U".parse::<PlayMode>(), Ok(PlayMode::LocalM3u));
        assert!("8".parse::<PlayMode>().is_err());
        assert!("shuffle".parse::<PlayMode>().is_err());
    }

    #[test]
    fn test_only_single_track_modes_skip_cache() {
        assert!(!PlayMode::SingleTrack.uses_cache());
        assert!(!PlayMode::SingleTrackLoop.uses_cache());
        assert!(PlayMode::AllTracksSorted.uses_cache());
        assert!(PlayMode::RandomSubdirectoryRandom.uses_cache());
    }

    #[test]
    fn test_directory_scan_keeps_enumeration_order() {
        let builder = builder(test_card());
        let playlist = builder.build("/Test", PlayMode::SingleTrack).unwrap();

        assert_eq!(playlist.count(), 2);
        assert_eq!(playlist.entries(), ["/Test/b.mp3", "/Test/a.mp3"]);
        assert!(!builder.filesystem().exists("/Test/playlistcache.csv"));
    }

    #[test]
    fn test_scan_writes_cache_and_stale_cache_wins() {
        let builder = builder(test_card());

        let first = builder.build("/Test", PlayMode::AllTracksSorted).unwrap();
        assert_eq!(first.count(), 2);
        assert_eq!(
            builder.filesystem().read_file("/Test/playlistcache.csv").unwrap(),
            b"/Test/b.mp3#/Test/a.mp3#"
        );
        drop(first);

        builder.filesystem().add_file("/Test/new.mp3", "n");
        let second = builder.build("/Test", PlayMode::AllTracksSorted).unwrap();
        assert_eq!(second.entries(), ["/Test/b.mp3", "/Test/a.mp3"]);

        let fresh = builder.build("/Test", PlayMode::SingleTrackLoop).unwrap();
        assert_eq!(fresh.count(), 3);
    }

    #[test]
    fn test_empty_cache_falls_back_to_scan() {
        let fs = test_card();
        fs.add_file("/Test/playlistcache.csv", "");
        let builder = builder(fs);

        let playlist = builder.build("/Test", PlayMode::AllTracksRandom).unwrap();
        assert_eq!(playlist.count(), 2);
        assert_eq!(
            builder.filesystem().read_file("/Test/playlistcache.csv").unwrap(),
            b"/Test/b.mp3#/Test/a.mp3#"
        );
    }

    #[test]
    fn test_caching_disabled_in_settings() {
        let settings = Settings {
            playlist_cache: false,
            ..Settings::default()
        };
        let fs = test_card();
        fs.add_file("/Test/playlistcache.csv", "/Test/ghost.mp3#");
        let builder = PlaylistBuilder::new(fs, &settings);

        let playlist = builder.build("/Test", PlayMode::AllTracksSorted).unwrap();
        assert_eq!(playlist.entries(), ["/Test/b.mp3", "/Test/a.mp3"]);
        assert_eq!(
            builder.filesystem().read_file("/Test/playlistcache.csv").unwrap(),
            b"/Test/ghost.mp3#"
        );
    }

    #[test]
    fn test_single_file_mode() {
        let fs = MemoryFilesystem::new();
        fs.add_file("/Music/song.flac", "x").add_file("/Music/cover.jpg", "x");
        let builder = builder(fs);

        let playlist = builder.build("/Music/song.flac", PlayMode::SingleTrack).unwrap();
        assert_eq!(playlist.count(), 1);
        assert_eq!(playlist.get(0), Some("/Music/song.flac"));

        let invalid = builder.build("/Music/cover.jpg", PlayMode::AllTracksSorted).unwrap();
        assert_eq!(invalid.count(), 0);
        assert!(invalid.is_empty());
        assert!(!builder.filesystem().exists("/Music/playlistcache.csv"));
    }

    #[test]
    fn test_missing_path() {
        let builder = builder(MemoryFilesystem::new());
        let err = builder.build("/Nope", PlayMode::AllTracksSorted).unwrap_err();
        assert!(matches!(err, PlaylistError::NotFound(_)));
    }

    #[test]
    fn test_m3u_mode_resolves_relative_entries() {
        let fs = MemoryFilesystem::new();
        fs.add_file(
            "/Playlists/Mix/playlist.m3u",
            "#EXTM3U\n01 - One.flac\n\n/Music/two.mp3\nhttp://radio.example/live\n",
        );
        let builder = builder(fs);

        let playlist = builder.build("/Playlists/Mix/playlist.m3u", PlayMode::LocalM3u).unwrap();
        assert_eq!(
            playlist.entries(),
            [
                "/Playlists/Mix/01 - One.flac",
                "/Music/two.mp3",
                "http://radio.example/live"
            ]
        );
        assert!(!builder.filesystem().exists("/Playlists/Mix/playlistcache.csv"));
    }

    #[test]
    fn test_m3u_mode_requires_non_empty_file() {
        let fs = MemoryFilesystem::new();
        fs.add_file("/Lists/empty.m3u", "").add_dir("/Lists/Dir");
        let builder = builder(fs);

        assert!(matches!(
            builder.build("/Lists/empty.m3u", PlayMode::LocalM3u),
            Err(PlaylistError::EmptyFile(_))
        ));
        assert!(matches!(
            builder.build("/Lists/Dir", PlayMode::LocalM3u),
            Err(PlaylistError::NotAFile(_))
        ));
    }

    #[test]
    fn test_allocation_failure_releases_everything() {
        let fs = MemoryFilesystem::new();
        for i in 0..40 {
            fs.add_file(&format!("/Big/Track number {:03}.mp3", i), "x");
        }
        let budget = MemoryBudget::with_limit(1500);
        let fault = FaultCounter::new();
        let builder = builder(fs)
            .with_profile(MemoryProfile {
                playlist_chunk: 512,
                list_chunk: 512,
            })
            .with_budget(budget.clone())
            .with_fault(Arc::new(fault.clone()));

        let err = builder.build("/Big", PlayMode::AllTracksSorted).unwrap_err();
        assert!(err.is_fatal_resource());
        assert_eq!(fault.count(), 1);
        assert_eq!(budget.in_use(), 0);
        assert_eq!(
            builder.filesystem().read_file("/Big/playlistcache.csv").unwrap(),
            b""
        );
    }

    #[test]
    fn test_collection_allocation_failure_releases_list() {
        let fs = MemoryFilesystem::new();
        fs.add_file("/T/a.mp3", "a").add_file("/T/b.mp3", "b");
        let budget = MemoryBudget::with_limit(100);
        let fault = FaultCounter::new();
        let builder = builder(fs)
            .with_profile(MemoryProfile {
                playlist_chunk: 64,
                list_chunk: 64,
            })
            .with_budget(budget.clone())
            .with_fault(Arc::new(fault.clone()));

        let err = builder.build("/T", PlayMode::SingleTrack).unwrap_err();
        assert!(matches!(err, PlaylistError::OutOfMemory { limit: Some(100), .. }));
        assert_eq!(fault.count(), 1);
        assert_eq!(budget.in_use(), 0);
    }

    #[test]
    fn test_oversized_cache_is_fatal_not_rescanned() {
        let contents: String = (0..400).map(|i| format!("/C/track{:04}.mp3#", i)).collect();
        assert!(contents.len() > 4096);
        let fs = MemoryFilesystem::new();
        fs.add_file("/C/track0000.mp3", "x")
            .add_file("/C/playlistcache.csv", &contents);
        let budget = MemoryBudget::with_limit(4096);
        let fault = FaultCounter::new();
        let builder = builder(fs)
            .with_budget(budget.clone())
            .with_fault(Arc::new(fault.clone()));

        let err = builder.build("/C", PlayMode::AllTracksSorted).unwrap_err();
        assert!(matches!(
            err,
            PlaylistError::OutOfMemory {
                limit: Some(4096),
                ..
            }
        ));
        assert_eq!(fault.count(), 1);
        assert_eq!(budget.in_use(), 0);
        assert_eq!(
            builder.filesystem().read_file("/C/playlistcache.csv").unwrap(),
            contents.as_bytes()
        );
    }

    #[test]
    fn test_playlist_holds_memory_until_dropped() {
        let budget = MemoryBudget::unlimited();
        let builder = builder(test_card()).with_budget(budget.clone());

        let playlist = builder.build("/Test", PlayMode::SingleTrack).unwrap();
        assert!(budget.in_use() > 0);
        drop(playlist);
        assert_eq!(budget.in_use(), 0);
    }

    #[test]
    fn test_picker_shares_card() {
        let fs = MemoryFilesystem::new();
        fs.add_dir("/Kids/Stories");
        let builder = builder(fs);
        assert_eq!(builder.picker().pick("/Kids").as_deref(), Some("/Kids/Stories"));
    }
}
