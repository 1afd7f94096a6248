//! Scheduler error types.

use fxwatch_common::ConfigError;
use fxwatch_fx::FxError;
use thiserror::Error;

/// Errors surfaced by a refresh cycle or by service setup.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The pair/alarm configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A rate fetch failed; the cycle was aborted.
    #[error(transparent)]
    Fx(#[from] FxError),

    /// Service settings are invalid.
    #[error("Invalid service configuration: {0}")]
    InvalidSettings(String),
}

impl SchedulerError {
    /// Get error code for logs and metrics.
    pub fn error_code(&self) -> &'static str {
        match self {
            SchedulerError::Config(ConfigError::Read { .. }) => "CONFIG_READ",
            SchedulerError::Config(ConfigError::Parse { .. }) => "CONFIG_PARSE",
            SchedulerError::Config(_) => "CONFIG_WRITE",
            SchedulerError::Fx(e) => e.error_code(),
            SchedulerError::InvalidSettings(_) => "INVALID_SETTINGS",
        }
    }
}

/// Result type alias for scheduler operations.
pub type Result<T> = std::result::Result<T, SchedulerError>;
