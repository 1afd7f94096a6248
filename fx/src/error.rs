//! FX engine error types.

use thiserror::Error;

/// Errors that can occur while fetching rates.
#[derive(Debug, Error)]
pub enum FxError {
    /// The request never produced a response (connect failure, timeout, ...).
    #[error("Transport error fetching {base}: {message}")]
    Transport { base: String, message: String },

    /// The remote answered with a non-success status.
    #[error("Rate source returned status {status} for {base}: {body}")]
    Remote {
        base: String,
        status: u16,
        body: String,
    },

    /// The response body does not match the expected schema.
    #[error("Malformed response for {base}: {message}")]
    Protocol { base: String, message: String },

    /// The response was well-formed but reported failure.
    #[error("Rate source rejected request for {base}: result={result}")]
    ProviderRejected { base: String, result: String },
}

impl FxError {
    /// Base currency the failed request was for.
    pub fn base(&self) -> &str {
        match self {
            FxError::Transport { base, .. }
            | FxError::Remote { base, .. }
            | FxError::Protocol { base, .. }
            | FxError::ProviderRejected { base, .. } => base,
        }
    }

    /// Check if the next scheduled cycle is likely to succeed without changes.
    pub fn is_retryable(&self) -> bool {
        match self {
            FxError::Transport { .. } => true,
            FxError::Remote { status, .. } => *status == 429 || *status >= 500,
            FxError::Protocol { .. } | FxError::ProviderRejected { .. } => false,
        }
    }

    /// Get error code for logs and metrics.
    pub fn error_code(&self) -> &'static str {
        match self {
            FxError::Transport { .. } => "TRANSPORT",
            FxError::Remote { .. } => "REMOTE",
            FxError::Protocol { .. } => "PROTOCOL",
            FxError::ProviderRejected { .. } => "PROVIDER_REJECTED",
        }
    }
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;
