//! Filename eligibility for playlists

/// Audio formats the decoder can play
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "aac", "m4a", "wav", "flac", "ogg", "opus"];

/// Playlist formats that can be queued like a track
pub const PLAYLIST_EXTENSIONS: &[&str] = &["m3u", "m3u8", "pls", "asx"];

/// Check whether a path may appear in a playlist
///
/// Hidden files (final segment starting with `.`) are rejected. Otherwise the
/// path must end in a known audio or playlist extension, compared
/// case-insensitively.
pub fn is_valid(path: &str) -> bool {
    let name = path.rsplit('/').next().unwrap_or(path);
    if name.starts_with('.') {
        return false;
    }

    let lower = path.to_lowercase();
    AUDIO_EXTENSIONS
        .iter()
        .chain(PLAYLIST_EXTENSIONS)
        .any(|ext| {
            lower
                .strip_suffix(ext)
                .is_some_and(|stem| stem.ends_with('.'))
        })
}
