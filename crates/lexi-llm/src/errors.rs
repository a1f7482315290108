//! Generator error types, kept distinct from store errors so callers can
//! tell "the content service failed" from "persistence failed".

use thiserror::Error;

/// Errors that can occur during content generation.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// HTTP request failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The generator returned an API error.
    #[error("api error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error description.
        message: String,
    },

    /// Rate limited by the generator.
    #[error("rate limited: retry after {retry_after_ms}ms")]
    RateLimited {
        /// Suggested retry delay in milliseconds.
        retry_after_ms: u64,
    },

    /// The configured API key environment variable is unset.
    #[error("api key environment variable not set: {0}")]
    MissingApiKey(String),

    /// The response body could not be turned into a stage payload.
    #[error("invalid payload: {message}")]
    InvalidPayload {
        /// What was wrong with the response.
        message: String,
    },

    /// Generation exceeded the configured timeout.
    #[error("generation timed out after {timeout_secs}s")]
    Timeout {
        /// The timeout that elapsed.
        timeout_secs: u64,
    },

    /// Generation was cancelled.
    #[error("generation cancelled")]
    Cancelled,
}

impl GeneratorError {
    /// Whether retrying the same request may succeed.
    ///
    /// Server errors, rate limits, and transport timeouts are retryable;
    /// client errors and malformed payloads are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::RateLimited { .. } => true,
            Self::Json(_)
            | Self::MissingApiKey(_)
            | Self::InvalidPayload { .. }
            | Self::Timeout { .. }
            | Self::Cancelled => false,
        }
    }
}

/// Convenience type alias for generator results.
pub type Result<T> = std::result::Result<T, GeneratorError>;
