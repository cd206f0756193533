//! JSON bodies returned by the HTTP API.

use chrono::{DateTime, Utc};
use kpop_core::{
    library::Track,
    state::library::{ArtistSummary, FormatSummary, LibraryStats},
};
use serde::{Deserialize, Serialize};

/// The body of every error response.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorBody {
    #[must_use]
    #[inline]
    pub fn new(error: &str, message: String) -> Self {
        Self {
            error: error.to_string(),
            message,
            hint: None,
        }
    }
}

/// `GET /`
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub message: String,
    pub version: String,
    pub status: String,
    pub endpoints: Endpoints,
    pub music_directory: String,
    pub server_time: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoints {
    pub music_list: String,
    pub stream: String,
    pub track_info: String,
    pub search: String,
    pub artists: String,
    pub formats: String,
    pub stats: String,
    pub download: String,
    pub health: String,
}

impl Default for Endpoints {
    #[inline]
    fn default() -> Self {
        Self {
            music_list: "/api/music".into(),
            stream: "/api/stream/{path}".into(),
            track_info: "/api/track/{id}".into(),
            search: "/api/search?q={query}".into(),
            artists: "/api/artists".into(),
            formats: "/api/formats".into(),
            stats: "/api/stats".into(),
            download: "/api/download/{path}".into(),
            health: "/api/health".into(),
        }
    }
}

/// `GET /api/music`
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicLibraryResponse {
    pub success: bool,
    pub tracks: Vec<Track>,
    pub available_count: usize,
    pub total_count: usize,
    pub timestamp: DateTime<Utc>,
}

/// `GET /api/search`
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub query: String,
    pub count: usize,
    pub results: Vec<Track>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `GET /api/artists`
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ArtistsResponse {
    pub success: bool,
    pub count: usize,
    pub artists: Vec<ArtistSummary>,
}

/// `GET /api/formats`
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FormatsResponse {
    pub success: bool,
    pub formats: Vec<FormatSummary>,
}

/// `GET /api/stats`
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: LibraryStats,
}

/// `GET /api/health`
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub music_directory: String,
    pub directory_exists: bool,
    pub uptime_seconds: u64,
    pub timestamp: DateTime<Utc>,
}
