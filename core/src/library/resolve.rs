//! Turns a requested path into a file inside the music directory.
//!
//! Whatever route produced the candidate, the canonical result must be a descendant of the
//! canonical music directory. This is the only thing standing between a request and the rest of
//! the file system.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use tracing::instrument;
use walkdir::WalkDir;

use crate::errors::ResolveError;

/// Resolve `requested` against `root`.
///
/// 1. `root/requested`, if that is an existing file.
/// 2. Otherwise the final segment of `requested` is treated as a bare file name and the whole tree
///    under `root` is searched for it. The first match in enumeration order wins, so when the same
///    name exists in several folders the result is file system dependent; pass the full relative
///    path for a deterministic answer.
/// 3. The candidate is canonicalized and must live under the canonical `root`.
///
/// # Errors
///
/// - [`ResolveError::NotFound`] if nothing matches, or `root` itself does not exist.
/// - [`ResolveError::Forbidden`] if the candidate resolves outside of `root` (`..`, absolute
///   paths, symlinks).
/// - [`ResolveError::IO`] if the candidate exists but cannot be canonicalized.
#[instrument]
#[inline]
pub fn resolve(root: &Path, requested: &str) -> Result<PathBuf, ResolveError> {
    if requested.is_empty() {
        return Err(ResolveError::NotFound(String::new()));
    }

    let Ok(canonical_root) = root.canonicalize() else {
        warn!("Music directory {} is not accessible", root.display());
        return Err(ResolveError::NotFound(requested.to_string()));
    };

    let direct = root.join(requested);
    let candidate = if direct.is_file() {
        direct
    } else {
        find_by_name(root, requested)
            .ok_or_else(|| ResolveError::NotFound(requested.to_string()))?
    };

    let canonical = candidate.canonicalize()?;
    if !canonical.starts_with(&canonical_root) {
        warn!(
            "Blocked request for {requested:?}, it resolves to {} outside of {}",
            canonical.display(),
            canonical_root.display()
        );
        return Err(ResolveError::Forbidden(canonical));
    }

    Ok(canonical)
}

/// Search the tree under `root` for a file named like the last segment of `requested`.
fn find_by_name(root: &Path, requested: &str) -> Option<PathBuf> {
    let name = Path::new(requested).file_name()?;
    debug!(
        "{requested:?} is not a direct path, searching for {}",
        name.to_string_lossy()
    );

    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .find(|entry| entry.file_type().is_file() && entry.file_name() == name)
        .map(walkdir::DirEntry::into_path)
}
