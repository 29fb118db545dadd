// Persisted configuration.
// The configuration file holds the defaults used when a command does not
// carry explicit connection flags. It lives next to the other per-user
// settings (`~/.config/redfish-cli/config.json` on Linux) unless the
// caller points `--config` somewhere else.

use crate::error::{CliError, CliResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "redfish-cli";

/// Connection defaults read from the configuration file. Every field is
/// optional; an empty string counts as unset.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Directory for the session cache. Defaults to the user cache dir.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

impl Config {
    /// Load from an explicit path, or from the default location.
    ///
    /// A missing default file is not an error: the CLI works without one.
    /// An explicit path that cannot be read is.
    pub fn load(explicit: Option<&Path>) -> CliResult<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Config::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> CliResult<Self> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| CliError::Configuration(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&data)
            .map_err(|e| CliError::Configuration(format!("{}: {}", path.display(), e)))
    }

    pub fn url(&self) -> Option<&str> {
        non_empty(&self.url)
    }

    pub fn username(&self) -> Option<&str> {
        non_empty(&self.username)
    }

    pub fn password(&self) -> Option<&str> {
        non_empty(&self.password)
    }

    /// Where the session cache file is kept.
    pub fn session_cache_path(&self) -> PathBuf {
        let dir = self
            .cache_dir
            .clone()
            .or_else(|| dirs::cache_dir().map(|d| d.join(APP_DIR)))
            .unwrap_or_else(|| PathBuf::from("."));
        dir.join("session.json")
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.json"))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
