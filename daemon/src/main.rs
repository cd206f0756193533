//! This is the daemon binary that runs the kpop music server.
//! there are no tests or anything else in this file because the only thing it does is set up and
//! start the daemon with functions from the `kpop_daemon` library crate (which is tested).

use std::path::PathBuf;

use kpop_core::config::{MUSIC_DIR_ENV, Settings};
use kpop_daemon::start_daemon;

use clap::Parser;

#[cfg(not(feature = "cli"))]
compile_error!("The cli feature is required to build the daemon binary");

/// Options configurable via the CLI.
#[derive(Parser)]
#[command(version, about)]
struct Flags {
    /// Sets the port number to listen on.
    #[clap(long)]
    port: Option<u16>,
    /// config file path
    #[clap(long)]
    config: Option<PathBuf>,
    /// log level
    #[clap(long)]
    log_level: Option<log::LevelFilter>,
    /// Directory to scan for FLAC files (defaults to `./music`)
    #[clap(long, env = MUSIC_DIR_ENV)]
    music_dir: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let flags = Flags::parse();

    let settings = Settings::init(flags.config, flags.port, flags.log_level, flags.music_dir)?;

    start_daemon(settings).await
}
