//! Async wrappers around the blocking file system work in `kpop_core::library`.
//!
//! Every call walks the disk again; there is no shared cache, so concurrent requests never
//! contend on anything.

use std::path::{Path, PathBuf};

use kpop_core::library::{self, Track};
use log::debug;
use tracing::instrument;

use crate::errors::ApiError;

/// Scan the music directory on the blocking pool.
///
/// # Errors
///
/// Only fails if the blocking task panics or is cancelled; a missing or unreadable directory
/// gives an empty catalog.
#[instrument]
#[inline]
pub async fn catalog(music_dir: &Path) -> Result<Vec<Track>, ApiError> {
    let music_dir = music_dir.to_path_buf();
    let tracks = tokio::task::spawn_blocking(move || library::scan(&music_dir)).await?;
    debug!("Catalog has {} tracks", tracks.len());
    Ok(tracks)
}

/// Resolve a requested path inside the music directory on the blocking pool.
///
/// # Errors
///
/// See [`kpop_core::library::resolve`]; not found and forbidden requests are reported as such.
#[instrument]
#[inline]
pub async fn resolve(music_dir: &Path, requested: &str) -> Result<PathBuf, ApiError> {
    let music_dir = music_dir.to_path_buf();
    let requested = requested.to_string();
    let resolved = tokio::task::spawn_blocking(move || library::resolve(&music_dir, &requested));
    let path = resolved.await??;
    Ok(path)
}
