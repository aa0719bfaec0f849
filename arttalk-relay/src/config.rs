//! Relay configuration.
//!
//! Each setting is taken from the first source that has it: command-line
//! flag, its environment variable, the `[server]` table of the TOML file
//! (`~/.config/arttalk-relay/config.toml` unless `--config` names another),
//! then the built-in default. `--port N` is shorthand for `--bind 0.0.0.0:N`.

use std::path::{Path, PathBuf};

use crate::lifecycle::DEFAULT_MAX_FRAME_SIZE;

/// Failure to load the relay config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

/// Parsed config file. Every key is optional.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    server: ServerSection,
}

/// `[server]` table.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerSection {
    bind_addr: Option<String>,
    max_frame_size: Option<usize>,
}

/// CLI arguments for the relay server.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Art Talks discussion relay server")]
pub struct RelayCliArgs {
    /// Address to bind the relay server to.
    #[arg(short, long, env = "ARTTALK_ADDR")]
    pub bind: Option<String>,

    /// Port to listen on all interfaces; ignored when `--bind` is given.
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Path to config file (default: `~/.config/arttalk-relay/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Maximum inbound frame size in bytes.
    #[arg(long)]
    pub max_frame_size: Option<usize>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "ARTTALK_LOG")]
    pub log_level: String,
}

/// Fully resolved relay server configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Address to bind the server to (e.g., `0.0.0.0:8080`).
    pub bind_addr: String,
    /// Maximum accepted inbound frame size in bytes.
    pub max_frame_size: usize,
    /// Log level filter string.
    pub log_level: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            log_level: "info".to_string(),
        }
    }
}

impl RelayConfig {
    /// Reads the config file and merges it under the CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a `--config` file is missing or unreadable,
    /// or if any config file fails to parse.
    pub fn load(cli: &RelayCliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Resolve a `RelayConfig` from CLI args and a parsed config file.
    ///
    /// Priority: `--bind` > `--port` > file > default.
    #[must_use]
    fn resolve(cli: &RelayCliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            bind_addr: cli
                .bind
                .clone()
                .or_else(|| cli.port.map(|port| format!("0.0.0.0:{port}")))
                .or_else(|| file.server.bind_addr.clone())
                .unwrap_or(defaults.bind_addr),
            max_frame_size: cli
                .max_frame_size
                .or(file.server.max_frame_size)
                .unwrap_or(defaults.max_frame_size),
            log_level: cli.log_level.clone(),
        }
    }
}

/// Default config file location, if the platform has a config directory.
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("arttalk-relay").join("config.toml"))
}

/// Reads the explicit config file, or the default one when none is given.
///
/// Only the default file may be absent.
fn load_config_file(explicit_path: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    let (path, required) = match explicit_path {
        Some(p) => (p.to_path_buf(), true),
        None => match default_config_path() {
            Some(p) => (p, false),
            None => return Ok(ConfigFile::default()),
        },
    };

    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(ConfigFile::default());
        }
        Err(source) => return Err(ConfigError::ReadFile { path, source }),
    };
    Ok(toml::from_str(&contents)?)
}
