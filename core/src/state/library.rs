use std::{collections::BTreeMap, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{format_duration, library::Track};

/// The id and title of a track, used when listing an artist's tracks.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct TrackSummary {
    pub id: u32,
    pub title: String,
}

/// An artist and the tracks attributed to them.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ArtistSummary {
    pub name: String,
    pub track_count: usize,
    pub tracks: Vec<TrackSummary>,
}

/// A format string and how many tracks have it.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct FormatSummary {
    pub format: String,
    pub count: usize,
}

/// Aggregate numbers about the catalog
#[allow(clippy::module_name_repetitions)]
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LibraryStats {
    pub total_tracks: usize,
    /// Scanned tracks exist by construction, so this always equals `total_tracks`.
    pub available_tracks: usize,
    pub unavailable_tracks: usize,
    pub total_duration_seconds: u64,
    /// `HH:MM:SS`
    pub total_duration_formatted: String,
    pub unique_artists: usize,
    /// Integer seconds, 0 for an empty catalog.
    pub average_track_duration: u64,
    pub total_size_bytes: u64,
}

impl LibraryStats {
    #[must_use]
    #[inline]
    pub fn from_tracks(tracks: &[Track]) -> Self {
        let total_duration_seconds: u64 = tracks.iter().map(|t| t.estimated_duration_seconds).sum();
        let unique_artists = tracks
            .iter()
            .map(|t| t.artist.as_str())
            .collect::<std::collections::HashSet<_>>()
            .len();
        let average_track_duration = u64::try_from(tracks.len())
            .ok()
            .and_then(|count| total_duration_seconds.checked_div(count))
            .unwrap_or_default();

        Self {
            total_tracks: tracks.len(),
            available_tracks: tracks.len(),
            unavailable_tracks: 0,
            total_duration_seconds,
            total_duration_formatted: format_duration(&Duration::from_secs(
                total_duration_seconds,
            )),
            unique_artists,
            average_track_duration,
            total_size_bytes: tracks.iter().map(|t| t.file_size).sum(),
        }
    }
}

/// Group tracks by artist, tracks in id order.
///
/// Artists are sorted by name ignoring case (`aespa` before `BLACKPINK`); names that differ only
/// in case are ordered by their exact bytes.
#[must_use]
#[inline]
pub fn artists(tracks: &[Track]) -> Vec<ArtistSummary> {
    let mut by_artist: BTreeMap<(String, &str), Vec<&Track>> = BTreeMap::new();
    for track in tracks {
        let name = track.artist.as_str();
        by_artist
            .entry((name.to_lowercase(), name))
            .or_default()
            .push(track);
    }

    by_artist
        .into_iter()
        .map(|((_, name), mut tracks)| {
            tracks.sort_by_key(|t| t.id);
            ArtistSummary {
                name: name.to_string(),
                track_count: tracks.len(),
                tracks: tracks
                    .into_iter()
                    .map(|t| TrackSummary {
                        id: t.id,
                        title: t.title.clone(),
                    })
                    .collect(),
            }
        })
        .collect()
}

/// Distinct formats with their counts, in order of first appearance.
#[must_use]
#[inline]
pub fn formats(tracks: &[Track]) -> Vec<FormatSummary> {
    let mut formats: Vec<FormatSummary> = Vec::new();
    for track in tracks {
        match formats.iter_mut().find(|f| f.format == track.format) {
            Some(summary) => summary.count += 1,
            None => formats.push(FormatSummary {
                format: track.format.clone(),
                count: 1,
            }),
        }
    }
    formats
}
