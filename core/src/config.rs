//! Handles the configuration of the server.
//!
//! this module is responsible for layering the built-in `Kpop.toml`, an optional user config file,
//! `KPOP_`-prefixed environment variables, and CLI overrides into a single [`Settings`] value.

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

pub static DEFAULT_CONFIG: &str = include_str!("../../Kpop.toml");

/// The environment variable naming the music root directory.
pub const MUSIC_DIR_ENV: &str = "KPOP_MUSIC_DIR";

/// The directory (relative to the working directory) used when no music root is configured.
pub const DEFAULT_MUSIC_DIR: &str = "music";

/// How many bytes are read from disk per chunk while streaming.
pub const DEFAULT_CHUNK_SIZE: usize = 80 * 1024;

#[derive(Clone, Debug, Deserialize, Default, PartialEq, Eq)]
pub struct Settings {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerSettings,
    /// Music library settings
    #[serde(default)]
    pub library: LibrarySettings,
}

impl Settings {
    /// Load settings from the built-in defaults, the config file, environment variables, and CLI
    /// arguments.
    ///
    /// The environment variables are prefixed with `KPOP_` and use `__` to separate sections.
    ///
    /// # Arguments
    ///
    /// * `config` - path to a user config file, if any.
    /// * `port` - overrides `server.port`.
    /// * `log_level` - overrides `server.log_level`.
    /// * `music_dir` - overrides `library.music_dir`.
    ///
    /// # Errors
    ///
    /// This function will return an error if the given config file is not found or if any source is
    /// invalid.
    #[inline]
    pub fn init(
        config: Option<PathBuf>,
        port: Option<u16>,
        log_level: Option<log::LevelFilter>,
        music_dir: Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));
        if let Some(config) = config {
            builder = builder.add_source(File::from(config));
        }
        let s = builder
            .add_source(
                Environment::with_prefix("KPOP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let mut settings: Self = s.try_deserialize()?;

        if let Some(port) = port {
            settings.server.port = port;
        }

        if let Some(log_level) = log_level {
            settings.server.log_level = log_level;
        }

        if let Some(music_dir) = music_dir {
            settings.library.music_dir = Some(music_dir);
        }

        if settings.library.chunk_size == 0 {
            settings.library.chunk_size = DEFAULT_CHUNK_SIZE;
        }

        Ok(settings)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ServerSettings {
    /// The address to bind the HTTP server to.
    /// Default is "0.0.0.0".
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// The port to listen on for HTTP requests.
    /// Default is 5000.
    #[serde(default = "default_port")]
    pub port: u16,
    /// What level of logging to use.
    /// Default is "info".
    #[serde(default = "default_log_level")]
    #[serde(deserialize_with = "de_log_level")]
    pub log_level: log::LevelFilter,
    /// Origins allowed to make cross-origin requests (the web player).
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn de_log_level<'de, D>(deserializer: D) -> Result<log::LevelFilter, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(log::LevelFilter::from_str(&s).unwrap_or_else(|_| default_log_level()))
}

fn default_bind_address() -> String {
    "0.0.0.0".into()
}

const fn default_port() -> u16 {
    5000
}

const fn default_log_level() -> log::LevelFilter {
    log::LevelFilter::Info
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".into(),
        "http://localhost:3001".into(),
    ]
}

impl Default for ServerSettings {
    #[inline]
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            log_level: default_log_level(),
            cors_origins: default_cors_origins(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct LibrarySettings {
    /// The root of the music library, as written by the user.
    ///
    /// Supports absolute paths, `~/...`, and paths relative to the working directory.
    /// See [`LibrarySettings::resolve_music_dir`].
    #[serde(default)]
    pub music_dir: Option<String>,
    /// Size of each chunk read while streaming a file.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

const fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

impl Default for LibrarySettings {
    #[inline]
    fn default() -> Self {
        Self {
            music_dir: None,
            chunk_size: default_chunk_size(),
        }
    }
}

impl LibrarySettings {
    /// Turn the configured music directory into an absolute path.
    ///
    /// - unset or blank: `<cwd>/music`, which is created if it does not exist.
    /// - `~` or `~/...`: expanded to the home directory.
    /// - absolute: used as-is.
    /// - relative: joined onto `cwd`.
    ///
    /// A configured directory that does not exist is left alone; the library will simply be empty.
    ///
    /// # Errors
    ///
    /// Fails if the default directory is missing and cannot be created.
    #[inline]
    pub fn resolve_music_dir(&self, cwd: &Path) -> std::io::Result<PathBuf> {
        let Some(raw) = self.music_dir.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            let dir = cwd.join(DEFAULT_MUSIC_DIR);
            if !dir.exists() {
                std::fs::create_dir_all(&dir)?;
                log::info!("Created music directory: {}", dir.display());
            }
            return Ok(dir);
        };

        let expanded = PathBuf::from(shellexpand::tilde(raw).into_owned());
        if expanded.is_absolute() {
            Ok(expanded)
        } else {
            Ok(cwd.join(expanded))
        }
    }
}
