//----------------------------------------------------------------------------------------- std lib
use std::io::Write;
use std::time::Instant;
//--------------------------------------------------------------------------------- other libraries
use env_logger::fmt::style::{AnsiColor, Style};
use log::info;
use once_cell::sync::Lazy;
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt as _};

// This will get initialized below.
/// Returns the init [`Instant`]
pub static INIT_INSTANT: Lazy<Instant> = Lazy::new(Instant::now);

/// Returns the seconds since [`INIT_INSTANT`].
#[cfg(not(tarpaulin_include))]
#[must_use]
#[inline]
pub fn uptime() -> u64 {
    INIT_INSTANT.elapsed().as_secs()
}

//---------------------------------------------------------------------------------------------------- Logger init function
#[allow(clippy::module_name_repetitions)]
/// Initializes the logger.
///
/// This enables console logging on all the internals of `kpop`.
///
/// Functionality is provided by [`log`].
///
/// The levels are:
/// - ERROR
/// - WARN
/// - INFO
/// - DEBUG
/// - TRACE
///
/// # Panics
/// This must only be called _once_.
#[cfg(not(tarpaulin_include))]
#[inline]
pub fn init_logger(filter: log::LevelFilter) {
    // Initialize timer.
    let now = Lazy::force(&INIT_INSTANT);

    // If `RUST_LOG` isn't set, disable all
    // library crate logs except for kpop and its sub-crates.
    let env = std::env::var("RUST_LOG").unwrap_or_default();
    let filters = if env.is_empty() {
        format!("off,kpop={filter}")
    } else {
        env.clone()
    };

    let dimmed = Style::new().dimmed();

    env_logger::Builder::new()
        .format(move |buf, record| {
            let (color, level) = match record.level() {
                log::Level::Debug => (AnsiColor::Blue, "D"),
                log::Level::Trace => (AnsiColor::Magenta, "T"),
                log::Level::Info => (AnsiColor::White, "I"),
                log::Level::Warn => (AnsiColor::Yellow, "W"),
                log::Level::Error => (AnsiColor::Red, "E"),
            };
            let style = color.on_default().bold();
            writeln!(
                buf,
                // Longest PATH in the repo: `daemon/src/services/stream.rs` - `29` characters
                "| {style}{level}{style:#} | {dimmed}{}{dimmed:#} | {dimmed}{: >29}{dimmed:#} @ {dimmed}{: <3}{dimmed:#} | {}",
                crate::format_duration(&now.elapsed()),
                record.file_static().unwrap_or("???"),
                record.line().unwrap_or(0),
                record.args(),
            )
        })
        .write_style(env_logger::WriteStyle::Always)
        .parse_filters(&filters)
        .init();

    if env.is_empty() {
        info!("Log Level (Flag) ... {filter}");
    } else {
        info!("Log Level (RUST_LOG) ... {env}");
    }
}

/// Initializes the tracing layer.
///
/// Spans (HTTP requests from `tower-http`, library scans, path resolution) are reported when they
/// close, together with how long they took.
#[must_use]
#[inline]
pub fn init_tracing() -> impl tracing::Subscriber + Send + Sync {
    let filter = tracing_subscriber::EnvFilter::builder()
        .parse_lossy("off,kpop=debug,tower_http=debug");

    tracing_subscriber::registry().with(filter).with(
        tracing_subscriber::fmt::layer()
            .compact()
            .with_span_events(FmtSpan::CLOSE),
    )
}
