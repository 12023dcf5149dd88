//! # tide-query
//!
//! Query construction and input validation for the tideline log client.
//!
//! This crate provides:
//!
//! - [`TimeExpr`] — Relative/absolute time bounds and their resolution
//! - [`QueryFilter`] — Exact-match column filters
//! - [`SelectBuilder`] — Injection-safe `SELECT` assembly
//! - [`ValidationError`] — Detailed rejection reasons for bad input
//!
//! Everything here is pure and synchronous; the network-facing crates build
//! on top of it. All caller-supplied identifiers and literals pass through
//! this crate before they reach SQL text.
//!
//! ## Example
//!
//! ```rust
//! use tide_query::{OrderDir, QueryFilter, SelectBuilder};
//!
//! let sql = SelectBuilder::new("app_logs")
//!     .filters(QueryFilter::new().with("level", "error"))
//!     .order(OrderDir::Descending)
//!     .limit(100)
//!     .build()?;
//! assert_eq!(
//!     sql,
//!     "SELECT * FROM app_logs WHERE level = 'error' ORDER BY _timestamp DESC LIMIT 100"
//! );
//! # Ok::<(), tide_query::ValidationError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod filter;
pub mod sql;
pub mod time;

pub use error::{ValidationError, ValidationErrorKind};
pub use filter::{build_filter_clause, escape_value, validate_identifier, QueryFilter};
pub use sql::{
    validate_line_count, OrderDir, SelectBuilder, MAX_TAIL_LINES, MIN_TAIL_LINES, TIMESTAMP_COLUMN,
};
pub use time::{now_us, resolve_or, resolve_or_at, TimeExpr, TimeUnit, MICROS_PER_SECOND};
