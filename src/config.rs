//! Dashboard configuration, read from an optional JSON file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Looked up in the working directory at startup.
pub const CONFIG_FILE: &str = "solar_dashboard.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config '{0}': {1}")]
    Io(PathBuf, #[source] io::Error),
    #[error("Invalid config '{0}': {1}")]
    Parse(PathBuf, #[source] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Directory holding the cleaned per-country CSV files.
    pub data_dir: PathBuf,
    /// Countries offered for selection.
    pub countries: Vec<String>,
    /// Appended to the lowercased country name to form the file name.
    pub file_suffix: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            countries: vec![
                "Benin".to_string(),
                "Sierra Leone".to_string(),
                "Togo".to_string(),
            ],
            file_suffix: "_clean.csv".to_string(),
        }
    }
}

impl DashboardConfig {
    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(path.to_path_buf(), e)),
        };

        serde_json::from_str(&text).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }
}
