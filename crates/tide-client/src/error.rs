//! Error types for backend communication.

use thiserror::Error;

/// Errors that can occur while talking to the search backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The transport layer failed (connection, timeout, body read).
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {body}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The response body, as far as it could be read.
        body: String,
    },

    /// A response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The client was configured with an unusable base URL.
    #[error("invalid base URL: {0}")]
    InvalidUrl(String),
}

/// Result type alias for backend operations.
pub type Result<T> = std::result::Result<T, ClientError>;
