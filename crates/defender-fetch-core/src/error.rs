//! Error types for defender-fetch

use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias using defender-fetch's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for a fetch run
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Token endpoint unreachable or returned a non-success status
    #[error("Token request failed: {0}")]
    TokenRequest(String),

    /// Token endpoint answered but no usable access token could be read
    #[error("Token response could not be parsed: {0}")]
    TokenParse(String),

    /// Time range is not a signed duration
    #[error("Invalid time range '{input}': {reason}")]
    InvalidDuration {
        /// The configured value
        input: String,
        /// Why it was rejected
        reason: String,
    },

    /// Alerts API rejected the request with a 4xx status
    #[error("Alerts API returned {status}: {body}")]
    ApiClient {
        /// HTTP status returned by the API
        status: StatusCode,
        /// Captured response body
        body: String,
    },

    /// Alerts API unreachable, 5xx, or otherwise unsuccessful
    #[error("Alerts API error: {0}")]
    Api(String),

    /// Response JSON lacks a top-level `value` array
    #[error("Malformed alerts response: {0}")]
    MalformedResponse(String),

    /// Output or log file could not be opened or written
    #[error("File write error on {path}: {source}")]
    FileWrite {
        /// File that failed
        path: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid duration error
    pub fn invalid_duration(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDuration {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create a malformed response error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Create a file write error
    pub fn file_write(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
