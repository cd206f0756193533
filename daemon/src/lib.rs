#![deny(clippy::missing_inline_in_public_items)]

//----------------------------------------------------------------------------------------- std lib
use std::sync::Arc;
//--------------------------------------------------------------------------------- other libraries
use axum::{
    Router,
    http::{HeaderValue, header},
};
use log::{error, info, warn};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
//---------------------------------------------------------------------------------- KPOP libraries
use kpop_core::{
    config::Settings,
    is_server_running,
    logger::{init_logger, init_tracing},
};

pub mod controller;
pub mod errors;
pub mod responses;
pub mod services;
pub mod termination;

use crate::controller::MusicServer;

/// The API routes wrapped in the CORS and request tracing layers.
#[must_use]
#[inline]
pub fn app(server: MusicServer, settings: &Settings) -> Router {
    controller::router(server)
        .layer(cors_layer(&settings.server.cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .inspect_err(|e| warn!("Ignoring invalid CORS origin {origin:?}: {e}"))
                .ok()
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([header::CONTENT_RANGE, header::ACCEPT_RANGES])
}

/// Run the daemon
///
/// also initializes the logger and tracing, and resolves (creating it if needed) the music
/// directory.
///
/// # Errors
///
/// If the daemon cannot be started, an error is returned.
#[inline]
pub async fn start_daemon(settings: Settings) -> anyhow::Result<()> {
    let settings = Arc::new(settings);

    // check if a server is already running
    if is_server_running(settings.server.port) {
        anyhow::bail!(
            "A server is already running on port {}",
            settings.server.port
        );
    }

    init_logger(settings.server.log_level);
    tracing::subscriber::set_global_default(init_tracing())?;

    let music_dir = settings
        .library
        .resolve_music_dir(&std::env::current_dir()?)?;

    // initialize the termination handler
    let (_terminator, mut interrupt_rx) = termination::create_termination();

    let server = MusicServer::new(music_dir, settings.clone());
    let track_count = services::library::catalog(server.music_dir()).await?.len();

    let address = (settings.server.bind_address.as_str(), settings.server.port);
    let listener = match TcpListener::bind(address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to start server: {e}");
            return Err(anyhow::anyhow!("Failed to start server: {e}"));
        }
    };

    info!("Listening on http://{}", listener.local_addr()?);
    info!("Music directory: {}", server.music_dir().display());
    info!("Tracks found: {track_count}");
    info!("Streaming:  GET /api/stream/{{path}} (supports Range requests)");
    info!("Library:    GET /api/music");
    info!("Search:     GET /api/search?q={{query}}");
    info!("Statistics: GET /api/stats");

    let app = app(server, &settings);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            match interrupt_rx.wait().await {
                Ok(reason) => info!("Stopping server because of {reason}"),
                Err(e) => error!("Stopping server because of an unexpected error: {e}"),
            }
        })
        .await?;

    info!("Cleanup complete, exiting...");

    Ok(())
}
