//! Error types for the tailing engine.

use thiserror::Error;

use tide_client::ClientError;
use tide_query::ValidationError;

/// Errors that terminate a tailing sequence.
///
/// Validation failures surface before any network call; transport and
/// search failures terminate the sequence with the original cause
/// preserved. The engine never retries — resilience belongs to callers.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Caller-supplied input failed a safety pattern or bound.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A poll-cycle search failed.
    #[error("search failed during poll cycle: {source}")]
    Search {
        /// The backend failure that aborted the cycle.
        #[source]
        source: ClientError,
    },

    /// The chunked transport failed mid-stream.
    #[error("stream transport failed: {source}")]
    Transport {
        /// The underlying transport failure.
        #[source]
        source: ClientError,
    },
}

/// Result type alias for tailing operations.
pub type Result<T> = std::result::Result<T, StreamError>;
