use crate::library::Track;

/// Find a track by its scan-assigned id.
#[must_use]
#[inline]
pub fn find_track(tracks: &[Track], id: u32) -> Option<&Track> {
    tracks.iter().find(|track| track.id == id)
}

/// Case-insensitive substring search over title, artist, file name, and relative path.
///
/// A blank query matches nothing.
#[must_use]
#[inline]
pub fn search<'a>(tracks: &'a [Track], query: &str) -> Vec<&'a Track> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    tracks
        .iter()
        .filter(|track| {
            [
                &track.title,
                &track.artist,
                &track.filename,
                &track.relative_path,
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(&query))
        })
        .collect()
}
