//! Builds the catalog by walking the music directory.
//!
//! The catalog is recomputed on every call; nothing is cached or persisted.

use std::path::Path;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use tracing::instrument;
use walkdir::{DirEntry, WalkDir};

pub mod filename;
pub mod resolve;
pub mod track;

pub use filename::{ArtistAndTitle, UNKNOWN_ARTIST, extract_artist_and_title};
pub use resolve::resolve;
pub use track::Track;

/// Extensions (lowercase, without the dot) that are considered audio files.
pub const AUDIO_EXTENSIONS: [&str; 1] = ["flac"];

/// The MIME type used for every streamed file.
pub const AUDIO_CONTENT_TYPE: &str = "audio/flac";

/// Whether `path` has one of the [`AUDIO_EXTENSIONS`], ignoring case.
#[must_use]
#[inline]
pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| {
            AUDIO_EXTENSIONS
                .iter()
                .any(|valid| ext.eq_ignore_ascii_case(valid))
        })
}

/// `path` relative to `root`, joined with `/` regardless of platform.
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    Some(
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
    )
}

/// Lazily walk `root`, yielding every audio file as a [`Track`].
///
/// Ids are assigned from 1 in the order the file system enumerates the files.
/// Entries that cannot be read or stat'ed are logged and skipped.
/// If `root` does not exist, nothing is yielded.
#[inline]
pub fn tracks(root: &Path) -> impl Iterator<Item = Track> + '_ {
    let walker = root
        .is_dir()
        .then(|| WalkDir::new(root).into_iter())
        .into_iter()
        .flatten();

    walker
        .filter_map(|entry| {
            entry
                .inspect_err(|e| warn!("Error reading path in music directory: {e}"))
                .ok()
        })
        .filter(|entry| entry.file_type().is_file() && is_audio_file(entry.path()))
        .filter_map(move |entry| load_entry(root, &entry))
        .zip(1..)
        .map(|(track, id)| Track { id, ..track })
}

/// Scan the music directory and collect the catalog.
///
/// Never fails: an empty or missing directory gives an empty catalog.
#[instrument]
#[inline]
pub fn scan(root: &Path) -> Vec<Track> {
    if !root.is_dir() {
        debug!("Music directory {} does not exist", root.display());
        return Vec::new();
    }

    let tracks: Vec<Track> = tracks(root).collect();
    debug!("Scanned {} tracks in {}", tracks.len(), root.display());
    tracks
}

/// Build a track (with a placeholder id) from a directory entry.
fn load_entry(root: &Path, entry: &DirEntry) -> Option<Track> {
    let path = entry.path();
    let metadata = entry
        .metadata()
        .inspect_err(|e| warn!("Error reading metadata for {}: {e}", path.display()))
        .ok()?;
    let relative_path = relative_path(root, path)?;
    let filename = entry.file_name().to_string_lossy().into_owned();
    let ArtistAndTitle { artist, title } = extract_artist_and_title(&filename);
    let file_size = metadata.len();

    Some(Track {
        id: 0,
        emoji: track::emoji_for_artist(&artist).to_string(),
        title,
        artist,
        stream_url: track::stream_url(&relative_path),
        filename,
        relative_path,
        format: track::TRACK_FORMAT.to_string(),
        file_size,
        estimated_duration_seconds: track::estimate_duration(file_size),
        last_modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        available: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MusicDir, file_bytes};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("/tmp/a.flac", true)]
    #[case("/tmp/a.FLAC", true)]
    #[case("/tmp/a.Flac", true)]
    #[case("/tmp/a.mp3", false)]
    #[case("/tmp/flac", false)]
    #[case("/tmp/a.flac.txt", false)]
    fn test_is_audio_file(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(is_audio_file(Path::new(path)), expected);
    }

    #[test]
    fn test_scan_uses_forward_slash_relative_paths() {
        let dir = MusicDir::new(&[("a.flac", 10), ("sub/b.flac", 20)]);

        let tracks = scan(dir.path());

        assert_eq!(tracks.len(), 2);
        let mut paths: Vec<&str> = tracks.iter().map(|t| t.relative_path.as_str()).collect();
        paths.sort_unstable();
        assert_eq!(paths, vec!["a.flac", "sub/b.flac"]);
    }

    #[test]
    fn test_scan_assigns_sequential_ids() {
        let dir = MusicDir::new(&[
            ("one.flac", 1),
            ("two.flac", 1),
            ("nested/deeper/three.flac", 1),
        ]);

        let tracks = scan(dir.path());

        let ids: Vec<u32> = tracks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_scan_filters_non_audio_case_insensitive() {
        let dir = MusicDir::new(&[
            ("BTS - Dynamite.FLAC", 10),
            ("cover.jpg", 10),
            ("notes.txt", 10),
            ("song.mp3", 10),
        ]);

        let tracks = scan(dir.path());

        assert_eq!(tracks.len(), 1);
        let track = &tracks[0];
        assert_eq!(track.artist, "BTS");
        assert_eq!(track.title, "Dynamite");
        assert_eq!(track.filename, "BTS - Dynamite.FLAC");
        assert_eq!(track.emoji, "💜");
        assert_eq!(track.format, track::TRACK_FORMAT);
        assert_eq!(track.stream_url, "/api/stream/BTS%20-%20Dynamite.FLAC");
        assert!(track.available);
        assert!(track.last_modified.is_some());
    }

    #[test]
    fn test_scan_reads_size_and_estimates_duration() {
        let dir = MusicDir::new(&[("plainname.flac", 2 * 1_048_576)]);

        let tracks = scan(dir.path());

        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].file_size, 2 * 1_048_576);
        assert_eq!(tracks[0].estimated_duration_seconds, 13);
        assert_eq!(tracks[0].artist, UNKNOWN_ARTIST);
        assert_eq!(tracks[0].title, "plainname");
    }

    #[test]
    fn test_scan_empty_dir() {
        let dir = MusicDir::new(&[]);
        assert!(scan(dir.path()).is_empty());
    }

    #[test]
    fn test_scan_missing_dir() {
        let dir = MusicDir::new(&[]);
        assert!(scan(&dir.path().join("does/not/exist")).is_empty());
    }

    #[test]
    fn test_scan_root_is_a_file() {
        let dir = MusicDir::new(&[("a.flac", 10)]);
        assert!(scan(&dir.path().join("a.flac")).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_skips_symlinked_files() {
        let outside = MusicDir::new(&[("secret.flac", 10)]);
        let dir = MusicDir::new(&[("real.flac", 10)]);
        std::os::unix::fs::symlink(
            outside.path().join("secret.flac"),
            dir.path().join("link.flac"),
        )
        .unwrap();

        let tracks = scan(dir.path());

        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].relative_path, "real.flac");
    }

    /// Apply `mode` to `path`; `false` if the lock is not enforced (e.g. running as root).
    #[cfg(unix)]
    fn lock(path: &Path, mode: u32) -> bool {
        use std::os::unix::fs::PermissionsExt as _;

        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).unwrap();
        std::fs::read_dir(path).is_err()
    }

    #[cfg(unix)]
    fn unlock(path: &Path) {
        use std::os::unix::fs::PermissionsExt as _;

        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_skips_unreadable_subdirectory() {
        crate::test_utils::init();
        let dir = MusicDir::new(&[
            ("a.flac", 10),
            ("locked/hidden.flac", 10),
            ("open/b.flac", 10),
        ]);
        let locked = dir.path().join("locked");
        if !lock(&locked, 0o000) {
            unlock(&locked);
            return;
        }

        let tracks = scan(dir.path());
        unlock(&locked);

        let mut paths: Vec<&str> = tracks.iter().map(|t| t.relative_path.as_str()).collect();
        paths.sort_unstable();
        assert_eq!(paths, vec!["a.flac", "open/b.flac"]);
        let mut ids: Vec<u32> = tracks.iter().map(|t| t.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2]);
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_unreadable_root_is_empty() {
        crate::test_utils::init();
        let dir = MusicDir::new(&[("a.flac", 10), ("sub/b.flac", 10)]);
        let root = dir.path().to_path_buf();
        if !lock(&root, 0o000) {
            unlock(&root);
            return;
        }

        let tracks = scan(&root);
        unlock(&root);

        assert!(tracks.is_empty());
    }

    #[test]
    fn test_tracks_is_lazy_and_matches_scan() {
        let dir = MusicDir::new(&[("a.flac", 3), ("b.flac", 3)]);

        let first = tracks(dir.path()).next().unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(scan(dir.path()).len(), 2);
        assert_eq!(
            std::fs::read(dir.path().join(&first.relative_path)).unwrap(),
            file_bytes(3)
        );
    }
}
