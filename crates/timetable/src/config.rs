//! Runtime configuration for the `timetable` binary.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::WeekGridBuilder;

/// Failure loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid configuration JSON
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Top-level configuration, read from a JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimetableConfig {
    /// JSON array of schedules loaded into the in-memory repository.
    pub seed_path: Option<PathBuf>,
    pub grid: GridConfig,
    /// Used when `RUST_LOG` is not set.
    pub log_filter: String,
}

/// Options for the week grid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Pass cancelled entries to the grid builder as well.
    pub include_cancelled: bool,
}

impl Default for TimetableConfig {
    fn default() -> Self {
        Self {
            seed_path: None,
            grid: GridConfig::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl TimetableConfig {
    /// Loads the configuration from a JSON file.
    ///
    /// A relative `seed_path` is resolved against the config file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: TimetableConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if let (Some(seed), Some(dir)) = (&config.seed_path, path.parent()) {
            if seed.is_relative() {
                config.seed_path = Some(dir.join(seed));
            }
        }

        Ok(config)
    }

    /// Loads from `path` if given, otherwise returns the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Grid builder configured from the `grid` section.
    pub fn grid_builder(&self) -> WeekGridBuilder {
        WeekGridBuilder::new().include_cancelled(self.grid.include_cancelled)
    }
}
