//! Error types for the backend gateway.

use thiserror::Error;

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for backend gateway operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Non-2xx response returned by the backend.
    #[error("backend: {message} (http={http_status})")]
    Api { message: String, http_status: u16 },

    /// HTTP request error (transport-level).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Creates a new API error from a response body and status.
    pub fn api(message: impl Into<String>, http_status: u16) -> Self {
        Error::Api {
            message: message.into(),
            http_status,
        }
    }

    /// Returns true if this is a server-side error.
    pub fn is_server_error(&self) -> bool {
        match self {
            Error::Api { http_status, .. } => *http_status >= 500,
            _ => false,
        }
    }

    /// Returns true if this is a rate limit error.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Error::Api { http_status, .. } if *http_status == 429)
    }

    /// Returns true if the request can be retried.
    ///
    /// Timeouts, connection failures, rate limits and 5xx responses are
    /// retryable; 4xx responses and decode errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            _ => self.is_server_error() || self.is_rate_limit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_retryable() {
        assert!(Error::api("boom", 500).is_retryable());
        assert!(Error::api("busy", 429).is_retryable());
        assert!(!Error::api("bad request", 400).is_retryable());
        assert!(!Error::api("not found", 404).is_server_error());
    }
}
