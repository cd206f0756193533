//! utilities used for testing
//!
//! Available to other crates with the `test_utils` feature.

use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};

use crate::{
    library::{Track, track},
    logger::{init_logger, init_tracing},
};

static INIT: OnceLock<()> = OnceLock::new();

/// Initialize logging and tracing once per test binary.
///
/// # Panics
///
/// Panics if another global tracing subscriber was already installed.
#[inline]
pub fn init() {
    INIT.get_or_init(|| {
        init_logger(log::LevelFilter::Debug);
        if let Err(e) = tracing::subscriber::set_global_default(init_tracing()) {
            panic!("Error setting global default tracing subscriber: {e:?}")
        }
    });
}

/// Deterministic, non-repeating-looking file contents of `len` bytes.
#[must_use]
#[inline]
#[allow(clippy::cast_possible_truncation)]
pub fn file_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

/// A throwaway music directory, deleted when dropped.
pub struct MusicDir {
    dir: tempfile::TempDir,
}

impl MusicDir {
    /// Create a temporary directory containing `files`, given as `(relative path, size in bytes)`.
    ///
    /// Parent folders are created as needed, and contents come from [`file_bytes`].
    ///
    /// # Panics
    ///
    /// Panics if the directory or any file cannot be created.
    #[must_use]
    #[inline]
    pub fn new(files: &[(&str, usize)]) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temporary music directory");
        for (relative, len) in files {
            let path = dir.path().join(relative);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).expect("failed to create parent directory");
            }
            std::fs::write(&path, file_bytes(*len)).expect("failed to write test file");
        }
        Self { dir }
    }

    #[must_use]
    #[inline]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// The canonical form of [`MusicDir::path`] (e.g. `/private/var/...` on macOS).
    ///
    /// # Panics
    ///
    /// Panics if the directory was removed.
    #[must_use]
    #[inline]
    pub fn canonical(&self) -> PathBuf {
        self.dir
            .path()
            .canonicalize()
            .expect("temporary music directory disappeared")
    }
}

/// Build a track by hand, without touching the file system.
#[must_use]
#[inline]
pub fn track(id: u32, artist: &str, title: &str, relative_path: &str) -> Track {
    let filename = relative_path
        .rsplit('/')
        .next()
        .unwrap_or(relative_path)
        .to_string();

    Track {
        id,
        title: title.into(),
        artist: artist.into(),
        filename,
        relative_path: relative_path.into(),
        format: track::TRACK_FORMAT.into(),
        emoji: track::emoji_for_artist(artist).into(),
        file_size: 0,
        estimated_duration_seconds: 0,
        last_modified: None,
        available: true,
        stream_url: track::stream_url(relative_path),
    }
}
