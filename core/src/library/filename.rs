//! Best-effort artist/title extraction from a file name.
//!
//! Two patterns are tried in order, and the first that matches wins:
//!
//! 1. `<artist> - <title>`: split at the first hyphen that has text on both sides.
//! 2. `<artist>_<title>`: the same shape with an underscore.
//!
//! Whitespace around both halves is trimmed. If neither pattern matches, the artist is
//! [`UNKNOWN_ARTIST`] and the title is the whole stem.
//!
//! Titles that themselves contain the separator are split at the first one, so
//! `"A - B - C"` becomes artist `"A"` and title `"B - C"`. This ambiguity is accepted.

use std::path::Path;

/// The artist used when no pattern matches the file name.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Separators tried in priority order.
const SEPARATORS: [char; 2] = ['-', '_'];

/// An artist/title pair derived from a file name. Both fields are never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtistAndTitle {
    pub artist: String,
    pub title: String,
}

/// Strip the extension from `filename` and derive an artist and title from the stem.
#[must_use]
#[inline]
pub fn extract_artist_and_title(filename: &str) -> ArtistAndTitle {
    let stem = Path::new(filename)
        .file_stem()
        .map_or_else(|| filename.to_string(), |s| s.to_string_lossy().into_owned());

    SEPARATORS
        .iter()
        .find_map(|&separator| split_at_separator(&stem, separator))
        .unwrap_or_else(|| ArtistAndTitle {
            artist: UNKNOWN_ARTIST.to_string(),
            title: if stem.trim().is_empty() {
                filename.to_string()
            } else {
                stem.trim().to_string()
            },
        })
}

/// Split at the first `separator` with a non-blank prefix and a non-blank suffix.
fn split_at_separator(stem: &str, separator: char) -> Option<ArtistAndTitle> {
    stem.match_indices(separator).find_map(|(idx, _)| {
        let artist = stem[..idx].trim();
        let title = stem[idx + separator.len_utf8()..].trim();
        (!artist.is_empty() && !title.is_empty()).then(|| ArtistAndTitle {
            artist: artist.to_string(),
            title: title.to_string(),
        })
    })
}
