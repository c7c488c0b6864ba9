//! Host configuration file loading.

use std::fs;
use std::path::{Path, PathBuf};

use atari_host::HostConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Load a JSON [`HostConfig`]. Missing fields take their defaults.
pub fn load(path: &Path) -> Result<HostConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse(text: &str) -> Result<HostConfig, serde_json::Error> {
    serde_json::from_str(text)
}

/// Default per-user data directory: `$XDG_DATA_HOME/emu-atari-host`, then
/// `$HOME/.local/share/emu-atari-host`, then `./emu-atari-host-data`.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("XDG_DATA_HOME") {
        return PathBuf::from(dir).join("emu-atari-host");
    }
    if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        return PathBuf::from(home).join(".local/share/emu-atari-host");
    }
    PathBuf::from("emu-atari-host-data")
}
