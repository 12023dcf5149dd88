//! # tide-client
//!
//! Search backend client for the tideline log tailing engine.
//!
//! This crate provides:
//!
//! - [`LogRecord`] — One schema-agnostic backend record
//! - [`SearchQuery`] / [`SearchResults`] — The bounded-search wire shapes
//! - [`SearchBackend`] — The collaborator trait the engine depends on
//! - [`HttpSearchClient`] — The OpenObserve-compatible HTTP implementation
//!
//! The engine in `tide-tail` is generic over [`SearchBackend`], so tests
//! and embedders can substitute their own transports.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod error;
pub mod http;
pub mod types;

pub use backend::{ByteChunks, SearchBackend};
pub use error::{ClientError, Result};
pub use http::{ClientConfig, HttpSearchClient};
pub use types::{LogRecord, SearchQuery, SearchResults, TIMESTAMP_FIELD};
