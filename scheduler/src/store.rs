//! JSON file storage for the pair/alarm configuration.

use std::path::{Path, PathBuf};

use fxwatch_common::{ConfigError, ConfigSource, Configuration};
use tracing::{info, warn};

/// File name used next to the executable when no path is configured.
pub const DEFAULT_FILE_NAME: &str = "fxwatch.json";

/// Configuration stored as an indented JSON file.
#[derive(Debug, Clone)]
pub struct JsonConfigStore {
    path: PathBuf,
}

impl JsonConfigStore {
    /// Create a store for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `fxwatch.json` in the executable's directory, or in the working
    /// directory if the executable path is unknown.
    pub fn default_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_FILE_NAME)))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FILE_NAME))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the starter configuration if the file does not exist yet.
    ///
    /// Returns true if a file was created.
    pub fn ensure_default(&self) -> Result<bool, ConfigError> {
        if self.path.exists() {
            return Ok(false);
        }

        self.save(&Configuration::starter())?;
        info!(path = %self.path.display(), "Created starter configuration");
        Ok(true)
    }

    /// Read and parse the configuration file.
    pub fn read(&self) -> Result<Configuration, ConfigError> {
        let data = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source,
        })?;

        let config = Configuration::from_json(&data).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })?;

        for (index, alarm) in config.alarms.iter().enumerate() {
            for problem in alarm.problems() {
                warn!(
                    index,
                    pair = %alarm.pair,
                    problem = %problem,
                    "Alarm will never fire"
                );
            }
        }

        Ok(config)
    }

    /// Replace the file contents with `config`.
    pub fn save(&self, config: &Configuration) -> Result<(), ConfigError> {
        let data = config.to_json_pretty()?;
        std::fs::write(&self.path, data).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

impl ConfigSource for JsonConfigStore {
    fn load(&self) -> Result<Configuration, ConfigError> {
        self.read()
    }
}
