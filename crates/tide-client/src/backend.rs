//! The search collaborator seam.
//!
//! The tailing engine depends only on this trait; the HTTP implementation
//! lives in [`crate::http`] and tests substitute in-memory fakes.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::error::ClientError;
use crate::types::{SearchQuery, SearchResults};

/// A lazy sequence of raw byte chunks from a streaming endpoint.
pub type ByteChunks = Pin<Box<dyn Stream<Item = Result<Bytes, ClientError>> + Send>>;

/// A backend that executes bounded searches and opens chunked streams.
///
/// Implementations are stateless collaborators: safe to share read-only
/// across any number of pollers, one call at a time per poller.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Executes one bounded search over the query's time window.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the request cannot be issued, the
    /// backend answers with a non-success status, or the response body
    /// cannot be decoded.
    async fn search(&self, query: &SearchQuery) -> Result<SearchResults, ClientError>;

    /// Opens a long-lived chunked byte stream for the query.
    ///
    /// The stream stays open until the backend closes it or the consumer
    /// drops it; each item is one network frame.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the stream cannot be opened.
    async fn stream(&self, query: &SearchQuery) -> Result<ByteChunks, ClientError>;
}
