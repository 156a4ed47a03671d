use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Apply the leading run of never-relevant events at startup.
    pub skip_never_relevant: bool,
    pub track_new_code: bool,
    pub track_attribution: bool,
    pub verify_deletes: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            skip_never_relevant: true,
            track_new_code: true,
            track_attribution: false,
            verify_deletes: true,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "read config: {err}"),
            ConfigError::Json(err) => write!(f, "parse config: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Json(err) => Some(err),
        }
    }
}

impl PlaybackConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(ConfigError::Json)
    }
}

pub fn load_config(path: &Path) -> Result<PlaybackConfig, ConfigError> {
    let data = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
    PlaybackConfig::from_json_str(&data)
}
