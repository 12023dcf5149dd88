//! # tide-tail
//!
//! Tailing and streaming engine for SQL-queryable log backends.
//!
//! This crate provides:
//!
//! - [`LogPoller`] — Deduplicating poll loop over an advancing time window
//! - [`LogTail`] / [`tail`] — `tail -f`-style history-then-follow sequences
//! - [`RecordDecoder`] — Newline-delimited JSON decoding of chunked streams
//! - [`Fingerprint`] / [`SeenSet`] — Client-side record identity
//! - [`StreamError`] — The failure taxonomy of a tailing sequence
//!
//! The engine is generic over the [`SearchBackend`](tide_client::SearchBackend)
//! collaborator; run one poller per task to tail multiple streams
//! concurrently — each owns its seen set and window floor outright.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tide_client::{ClientConfig, HttpSearchClient};
//! use tide_query::QueryFilter;
//! use tide_tail::{tail, TailRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = Arc::new(HttpSearchClient::new(ClientConfig::new(
//!     "http://localhost:5080",
//!     "default",
//! ))?);
//!
//! let request = TailRequest::new("app_logs")
//!     .with_filters(QueryFilter::new().with("level", "error"))
//!     .lines(50)
//!     .follow(true);
//!
//! let mut tail = tail(backend, &request).await?;
//! while let Some(record) = tail.next_record().await? {
//!     println!("{}", serde_json::to_string(&record)?);
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod decode;
pub mod error;
pub mod fingerprint;
pub mod poller;
pub mod tail;

pub use decode::{decode_chunk, stream_records, RecordDecoder};
pub use error::{Result, StreamError};
pub use fingerprint::{canonical_json, Fingerprint, SeenSet};
pub use poller::{
    LogPoller, PollerConfig, StopHandle, DEFAULT_PAGE_SIZE, DEFAULT_POLL_INTERVAL,
    DEFAULT_PRUNE_HORIZON,
};
pub use tail::{tail, tail_with_config, LogTail, TailRequest, DEFAULT_LINES};
