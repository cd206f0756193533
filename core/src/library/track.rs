use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::{Deserialize, Serialize};

/// The descriptive format string attached to every track. No probing of the file is done.
pub const TRACK_FORMAT: &str = "FLAC Lossless";

/// The symbol used for artists without a dedicated one.
pub const DEFAULT_EMOJI: &str = "🎵";

/// How many seconds of audio one MiB of FLAC is assumed to hold.
const SECONDS_PER_MIB: f64 = 6.5;

/// Cosmetic symbols, matched as case-insensitive substrings of the artist name.
const ARTIST_EMOJI: [(&str, &str); 8] = [
    ("bts", "💜"),
    ("blackpink", "🖤"),
    ("aespa", "🚀"),
    ("ive", "🎯"),
    ("twice", "🍭"),
    ("newjeans", "🐰"),
    ("stray kids", "🔥"),
    ("seventeen", "💎"),
];

/// Characters escaped when a relative path segment is put in a URL.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// A track found by a library scan.
///
/// Tracks are rebuilt from scratch on every scan, so `id` is only meaningful within one catalog.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Sequential id, starting at 1, in the order the scan encountered the file.
    pub id: u32,
    pub title: String,
    pub artist: String,
    /// The file's base name, extension included.
    pub filename: String,
    /// Path relative to the music directory, always `/`-separated.
    pub relative_path: String,
    pub format: String,
    pub emoji: String,
    /// Size in bytes at scan time.
    pub file_size: u64,
    /// A rough estimate derived from the file size, see [`estimate_duration`].
    #[serde(rename = "duration")]
    pub estimated_duration_seconds: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub available: bool,
    pub stream_url: String,
}

/// Estimate the duration of a FLAC file from its size: `round(MiB * 6.5)` seconds.
///
/// This is only an approximation, never use it where accuracy matters.
#[must_use]
#[inline]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn estimate_duration(file_size: u64) -> u64 {
    (file_size as f64 / 1_048_576.0 * SECONDS_PER_MIB).round() as u64
}

/// Pick a decorative symbol for an artist.
#[must_use]
#[inline]
pub fn emoji_for_artist(artist: &str) -> &'static str {
    let artist = artist.to_lowercase();
    ARTIST_EMOJI
        .iter()
        .find(|(needle, _)| artist.contains(needle))
        .map_or(DEFAULT_EMOJI, |&(_, emoji)| emoji)
}

/// The URL the file can be streamed from, with each path segment percent-encoded.
#[must_use]
#[inline]
pub fn stream_url(relative_path: &str) -> String {
    let encoded = relative_path
        .split('/')
        .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/");
    format!("/api/stream/{encoded}")
}
