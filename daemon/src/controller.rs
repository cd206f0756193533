//----------------------------------------------------------------------------------------- std lib
use std::{path::PathBuf, sync::Arc};
//--------------------------------------------------------------------------------- other libraries
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use log::{debug, info};
use serde::Deserialize;
use tracing::instrument;
//---------------------------------------------------------------------------------- KPOP libraries
use kpop_core::{
    VERSION,
    config::Settings,
    library::Track,
    logger::uptime,
    search,
    state::library::{self, LibraryStats},
};

use crate::{
    errors::ApiError,
    responses::{
        ArtistsResponse, Endpoints, ErrorBody, FormatsResponse, HealthResponse,
        MusicLibraryResponse, SearchResponse, ServerInfo, StatsResponse,
    },
    services::{
        self,
        stream::{Delivery, serve_file},
    },
};

/// Shared state of the HTTP handlers.
///
/// Holds nothing mutable: the catalog is rebuilt from disk on every request.
#[derive(Clone, Debug)]
pub struct MusicServer {
    music_dir: Arc<PathBuf>,
    settings: Arc<Settings>,
}

impl MusicServer {
    /// `music_dir` must already be resolved to an absolute path.
    #[must_use]
    #[inline]
    pub fn new(music_dir: PathBuf, settings: Arc<Settings>) -> Self {
        Self {
            music_dir: Arc::new(music_dir),
            settings,
        }
    }

    #[must_use]
    #[inline]
    pub fn music_dir(&self) -> &std::path::Path {
        &self.music_dir
    }

    async fn catalog(&self) -> Result<Vec<Track>, ApiError> {
        services::library::catalog(&self.music_dir).await
    }

    async fn serve(
        &self,
        requested: &str,
        headers: &HeaderMap,
        delivery: Delivery,
    ) -> Result<Response, ApiError> {
        let path = services::library::resolve(&self.music_dir, requested).await?;
        let range = headers
            .get(header::RANGE)
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());

        serve_file(
            &path,
            range.as_deref(),
            delivery,
            self.settings.library.chunk_size,
        )
        .await
    }
}

/// `GET /`
#[instrument(skip(server))]
#[inline]
pub async fn server_info(State(server): State<MusicServer>) -> Json<ServerInfo> {
    Json(ServerInfo {
        message: "K-Pop FLAC music server".into(),
        version: VERSION.into(),
        status: "running".into(),
        endpoints: Endpoints::default(),
        music_directory: server.music_dir.display().to_string(),
        server_time: Utc::now(),
    })
}

/// `GET /api/music`
///
/// # Errors
///
/// Only if the scan task fails to complete.
#[instrument(skip(server))]
#[inline]
pub async fn music(
    State(server): State<MusicServer>,
) -> Result<Json<MusicLibraryResponse>, ApiError> {
    let tracks = server.catalog().await?;
    info!("Returning {} tracks", tracks.len());

    Ok(Json(MusicLibraryResponse {
        success: true,
        available_count: tracks.iter().filter(|t| t.available).count(),
        total_count: tracks.len(),
        tracks,
        timestamp: Utc::now(),
    }))
}

/// `GET /api/stream/{*path}`
///
/// # Errors
///
/// 404 for unknown files, 403 for paths outside the music directory, 416 for bad ranges.
#[instrument(skip(server, headers))]
#[inline]
pub async fn stream(
    State(server): State<MusicServer>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    server.serve(&path, &headers, Delivery::Stream).await
}

/// `GET /api/download/{*path}`
///
/// # Errors
///
/// 404 for unknown files, 403 for paths outside the music directory.
#[instrument(skip(server, headers))]
#[inline]
pub async fn download(
    State(server): State<MusicServer>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    server.serve(&path, &headers, Delivery::Download).await
}

/// `GET /api/track/{id}`
///
/// # Errors
///
/// 404 if `id` is not a number or no track in the current catalog has it.
#[instrument(skip(server))]
#[inline]
pub async fn track(
    State(server): State<MusicServer>,
    Path(id): Path<String>,
) -> Result<Json<Track>, ApiError> {
    let Ok(numeric) = id.parse::<u32>() else {
        return Err(ApiError::TrackNotFound(id));
    };

    let tracks = server.catalog().await?;
    search::find_track(&tracks, numeric)
        .cloned()
        .map(Json)
        .ok_or(ApiError::TrackNotFound(id))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
}

/// `GET /api/search?q=`
///
/// # Errors
///
/// Only if the scan task fails to complete.
#[instrument(skip(server))]
#[inline]
pub async fn search(
    State(server): State<MusicServer>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = query.q.unwrap_or_default();
    if query.trim().is_empty() {
        return Ok(Json(SearchResponse {
            success: false,
            query,
            count: 0,
            results: Vec::new(),
            message: Some("Enter a search query".into()),
        }));
    }

    let tracks = server.catalog().await?;
    let results: Vec<Track> = search::search(&tracks, &query)
        .into_iter()
        .cloned()
        .collect();
    debug!("Search for {query:?} matched {} tracks", results.len());

    Ok(Json(SearchResponse {
        success: true,
        query,
        count: results.len(),
        results,
        message: None,
    }))
}

/// `GET /api/artists`
///
/// # Errors
///
/// Only if the scan task fails to complete.
#[instrument(skip(server))]
#[inline]
pub async fn artists(
    State(server): State<MusicServer>,
) -> Result<Json<ArtistsResponse>, ApiError> {
    let artists = library::artists(&server.catalog().await?);

    Ok(Json(ArtistsResponse {
        success: true,
        count: artists.len(),
        artists,
    }))
}

/// `GET /api/formats`
///
/// # Errors
///
/// Only if the scan task fails to complete.
#[instrument(skip(server))]
#[inline]
pub async fn formats(
    State(server): State<MusicServer>,
) -> Result<Json<FormatsResponse>, ApiError> {
    Ok(Json(FormatsResponse {
        success: true,
        formats: library::formats(&server.catalog().await?),
    }))
}

/// `GET /api/stats`
///
/// # Errors
///
/// Only if the scan task fails to complete.
#[instrument(skip(server))]
#[inline]
pub async fn stats(State(server): State<MusicServer>) -> Result<Json<StatsResponse>, ApiError> {
    Ok(Json(StatsResponse {
        success: true,
        stats: LibraryStats::from_tracks(&server.catalog().await?),
    }))
}

/// `GET /api/health`
#[instrument(skip(server))]
#[inline]
pub async fn health(State(server): State<MusicServer>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        version: VERSION.into(),
        music_directory: server.music_dir.display().to_string(),
        directory_exists: server.music_dir.is_dir(),
        uptime_seconds: uptime(),
        timestamp: Utc::now(),
    })
}

async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody::new("Not found", "No such endpoint".into())),
    )
        .into_response()
}

/// All routes of the API, without middleware.
#[must_use]
#[inline]
pub fn router(server: MusicServer) -> Router {
    Router::new()
        .route("/", get(server_info))
        .route("/api/music", get(music))
        .route("/api/stream/{*path}", get(stream))
        .route("/api/track/{id}", get(track))
        .route("/api/search", get(search))
        .route("/api/artists", get(artists))
        .route("/api/formats", get(formats))
        .route("/api/stats", get(stats))
        .route("/api/download/{*path}", get(download))
        .route("/api/health", get(health))
        .fallback(not_found)
        .with_state(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, to_bytes},
        http::Request,
    };
    use kpop_core::test_utils::{MusicDir, file_bytes, init};
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};
    use serde_json::Value;
    use tower::ServiceExt as _;

    struct Harness {
        // kept alive so the directory outlives the router
        dir: MusicDir,
        router: Router,
    }

    impl Harness {
        fn new(files: &[(&str, usize)]) -> Self {
            init();
            let dir = MusicDir::new(files);
            let settings = Settings {
                library: kpop_core::config::LibrarySettings {
                    music_dir: None,
                    chunk_size: 64,
                },
                ..Settings::default()
            };
            let router = router(MusicServer::new(
                dir.path().to_path_buf(),
                Arc::new(settings),
            ));
            Self { dir, router }
        }

        async fn get(&self, uri: &str) -> Response {
            self.get_with(uri, &[]).await
        }

        async fn get_with(&self, uri: &str, headers: &[(&str, &str)]) -> Response {
            let mut request = Request::builder().uri(uri);
            for (name, value) in headers {
                request = request.header(*name, *value);
            }
            self.router
                .clone()
                .oneshot(request.body(Body::empty()).unwrap())
                .await
                .unwrap()
        }
    }

    async fn bytes(response: Response) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    async fn json(response: Response) -> Value {
        serde_json::from_slice(&bytes(response).await).unwrap()
    }

    #[fixture]
    fn library() -> Harness {
        Harness::new(&[
            ("BTS - Dynamite.flac", 1000),
            ("BLACKPINK - How You Like That.flac", 2048),
            ("IU/IU - Blueming.flac", 300),
            ("notes.txt", 10),
        ])
    }

    #[rstest]
    #[tokio::test]
    async fn test_server_info(library: Harness) {
        let body = json(library.get("/").await).await;

        assert_eq!(body["status"], "running");
        assert_eq!(body["version"], VERSION);
        assert_eq!(body["endpoints"]["stream"], "/api/stream/{path}");
    }

    #[rstest]
    #[tokio::test]
    async fn test_music(library: Harness) {
        let response = library.get("/api/music").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["totalCount"], 3);
        assert_eq!(body["availableCount"], 3);

        let mut paths: Vec<&str> = body["tracks"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["relativePath"].as_str().unwrap())
            .collect();
        paths.sort_unstable();
        assert_eq!(
            paths,
            vec![
                "BLACKPINK - How You Like That.flac",
                "BTS - Dynamite.flac",
                "IU/IU - Blueming.flac"
            ]
        );
    }

    #[tokio::test]
    async fn test_music_empty_library() {
        let harness = Harness::new(&[]);

        let response = harness.get("/api/music").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["totalCount"], 0);
        assert_eq!(body["tracks"], Value::Array(vec![]));
    }

    #[rstest]
    #[case::unknown_id("/api/track/99999")]
    #[case::not_a_number("/api/track/abc")]
    #[tokio::test]
    async fn test_track_not_found(library: Harness, #[case] uri: &str) {
        let response = library.get(uri).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json(response).await["error"], "Track not found");
    }

    #[rstest]
    #[tokio::test]
    async fn test_track_by_id(library: Harness) {
        let listing = json(library.get("/api/music").await).await;
        let first = &listing["tracks"][0];

        let response = library
            .get(&format!("/api/track/{}", first["id"]))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(&json(response).await, first);
    }

    #[rstest]
    #[tokio::test]
    async fn test_stream_full_file(library: Harness) {
        let response = library.get("/api/stream/BTS%20-%20Dynamite.flac").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "1000");
        assert_eq!(response.headers()[header::ACCEPT_RANGES], "bytes");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/flac");
        assert_eq!(bytes(response).await, file_bytes(1000));
    }

    #[rstest]
    #[tokio::test]
    async fn test_stream_range(library: Harness) {
        let response = library
            .get_with(
                "/api/stream/BTS%20-%20Dynamite.flac",
                &[("range", "bytes=0-99")],
            )
            .await;

        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes 0-99/1000");
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "100");
        assert_eq!(bytes(response).await, file_bytes(1000)[..100].to_vec());
    }

    #[rstest]
    #[tokio::test]
    async fn test_stream_open_ended_range(library: Harness) {
        let response = library
            .get_with(
                "/api/stream/BTS%20-%20Dynamite.flac",
                &[("range", "bytes=900-")],
            )
            .await;

        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes 900-999/1000");
        assert_eq!(bytes(response).await, file_bytes(1000)[900..].to_vec());
    }

    #[rstest]
    #[case::malformed("bytes=abc")]
    #[case::past_the_end("bytes=1000-")]
    #[case::wrong_unit("items=0-1")]
    #[tokio::test]
    async fn test_stream_bad_range(library: Harness, #[case] range: &str) {
        let response = library
            .get_with("/api/stream/BTS%20-%20Dynamite.flac", &[("range", range)])
            .await;

        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes */1000");
    }

    #[tokio::test]
    async fn test_contiguous_ranges_rebuild_the_file() {
        let harness = Harness::new(&[("a.flac", 1000)]);

        let mut rebuilt = Vec::new();
        for (start, end) in [(0, 299), (300, 599), (600, 999)] {
            let response = harness
                .get_with(
                    "/api/stream/a.flac",
                    &[("range", format!("bytes={start}-{end}").as_str())],
                )
                .await;
            assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
            rebuilt.extend(bytes(response).await);
        }

        assert_eq!(rebuilt, file_bytes(1000));
    }

    #[rstest]
    #[case::nested_path("/api/stream/IU/IU%20-%20Blueming.flac")]
    #[case::bare_name("/api/stream/IU%20-%20Blueming.flac")]
    #[case::wrong_folder("/api/stream/elsewhere/IU%20-%20Blueming.flac")]
    #[tokio::test]
    async fn test_stream_finds_nested_file(library: Harness, #[case] uri: &str) {
        let response = library.get(uri).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(bytes(response).await, file_bytes(300));
    }

    #[rstest]
    #[tokio::test]
    async fn test_stream_missing_file(library: Harness) {
        let response = library.get("/api/stream/missing.flac").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json(response).await;
        assert_eq!(body["error"], "File not found");
        assert!(body["hint"].is_string());
    }

    #[tokio::test]
    async fn test_stream_outside_music_directory_is_forbidden() {
        let outer = tempfile::tempdir().unwrap();
        let music = outer.path().join("music");
        std::fs::create_dir_all(&music).unwrap();
        std::fs::write(outer.path().join("secret.flac"), file_bytes(10)).unwrap();
        let router = router(MusicServer::new(music, Arc::new(Settings::default())));

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/stream/..%2Fsecret.flac")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = json(response).await;
        assert_eq!(body["error"], "Access denied");
        assert!(!body.to_string().contains("secret"));
    }

    #[rstest]
    #[tokio::test]
    async fn test_download(library: Harness) {
        let response = library
            .get_with(
                "/api/download/BTS%20-%20Dynamite.flac",
                &[("range", "bytes=0-9")],
            )
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"BTS - Dynamite.flac\""
        );
        assert_eq!(bytes(response).await, file_bytes(1000));
    }

    #[rstest]
    #[case::blank("/api/search?q=%20%20")]
    #[case::missing("/api/search")]
    #[tokio::test]
    async fn test_search_blank_query(library: Harness, #[case] uri: &str) {
        let body = json(library.get(uri).await).await;

        assert_eq!(body["success"], false);
        assert_eq!(body["count"], 0);
        assert_eq!(body["results"], Value::Array(vec![]));
        assert_eq!(body["message"], "Enter a search query");
    }

    #[rstest]
    #[case::artist("bts", 1)]
    #[case::case_insensitive("BLACKPINK", 1)]
    #[case::folder("iu/", 1)]
    #[case::extension(".flac", 3)]
    #[case::nothing("twice", 0)]
    #[tokio::test]
    async fn test_search(library: Harness, #[case] query: &str, #[case] expected: usize) {
        let body = json(library.get(&format!("/api/search?q={query}")).await).await;

        assert_eq!(body["success"], true);
        assert_eq!(body["query"], query);
        assert_eq!(body["count"], expected);
        assert!(body.get("message").is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn test_artists(library: Harness) {
        let body = json(library.get("/api/artists").await).await;

        assert_eq!(body["count"], 3);
        let names: Vec<&str> = body["artists"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["BLACKPINK", "BTS", "IU"]);
        assert_eq!(body["artists"][1]["trackCount"], 1);
    }

    #[rstest]
    #[tokio::test]
    async fn test_formats(library: Harness) {
        let body = json(library.get("/api/formats").await).await;

        assert_eq!(body["formats"][0]["format"], "FLAC Lossless");
        assert_eq!(body["formats"][0]["count"], 3);
    }

    #[rstest]
    #[tokio::test]
    async fn test_stats(library: Harness) {
        let body = json(library.get("/api/stats").await).await;

        assert_eq!(body["success"], true);
        assert_eq!(body["stats"]["totalTracks"], 3);
        assert_eq!(body["stats"]["uniqueArtists"], 3);
        assert_eq!(body["stats"]["totalSizeBytes"], 1000 + 2048 + 300);
    }

    #[rstest]
    #[tokio::test]
    async fn test_health(library: Harness) {
        let body = json(library.get("/api/health").await).await;

        assert_eq!(body["status"], "healthy");
        assert_eq!(body["directoryExists"], true);
        assert_eq!(
            body["musicDirectory"],
            library.dir.path().display().to_string()
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_unknown_route(library: Harness) {
        let response = library.get("/api/nope").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json(response).await["error"], "Not found");
    }
}
