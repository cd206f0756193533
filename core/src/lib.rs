#![deny(clippy::missing_inline_in_public_items)]

use std::time::Duration;

pub mod config;
pub mod errors;
pub mod library;
pub mod logger;
pub mod range;
pub mod search;
pub mod state;
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

/// The version of the server, reported by the info and health endpoints.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Format a duration as `HH:MM:SS`.
///
/// Hours are not wrapped at 24, so a 30 hour library renders as `30:00:00`.
#[must_use]
#[inline]
pub fn format_duration(duration: &Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Checks if a server is already listening on the given port.
///
/// A failed bind on the wildcard address is taken to mean the port is in use.
#[must_use]
#[inline]
pub fn is_server_running(port: u16) -> bool {
    std::net::TcpListener::bind(("0.0.0.0", port)).is_err()
}
