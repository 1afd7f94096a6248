//! Error types shared across fxwatch crates.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or writing the pair/alarm configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration could not be read.
    #[error("Cannot read configuration {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration was read but is not valid JSON for the schema.
    #[error("Cannot parse configuration {}: {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The configuration could not be written.
    #[error("Cannot write configuration {}: {}", .path.display(), .source)]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration could not be encoded.
    #[error("Cannot encode configuration: {0}")]
    Encode(#[source] serde_json::Error),
}

/// An alarm direction other than `above` or `below`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown alarm direction: {0:?}")]
pub struct UnknownDirection(pub String);
