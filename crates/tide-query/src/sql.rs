//! Assembly of `SELECT` statements from validated parts.
//!
//! Emitted text follows the shape other components parse:
//! `SELECT * FROM <stream> [WHERE ...] ORDER BY _timestamp {ASC|DESC} [LIMIT <n>]`.

use crate::error::ValidationError;
use crate::filter::{build_filter_clause, validate_identifier, QueryFilter};

/// Minimum number of lines a tail query may request.
pub const MIN_TAIL_LINES: u64 = 1;

/// Maximum number of lines a tail query may request.
pub const MAX_TAIL_LINES: u64 = 10_000;

/// The timestamp column every stream carries.
pub const TIMESTAMP_COLUMN: &str = "_timestamp";

/// Validate a requested line count against `1..=10000`.
///
/// # Errors
///
/// Returns a [`ValidationError`] when the count is out of range.
pub fn validate_line_count(lines: u64) -> Result<(), ValidationError> {
    if !(MIN_TAIL_LINES..=MAX_TAIL_LINES).contains(&lines) {
        return Err(ValidationError::out_of_range(
            "lines",
            MIN_TAIL_LINES,
            MAX_TAIL_LINES,
            lines,
        ));
    }
    Ok(())
}

/// Sort direction for the timestamp column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDir {
    /// Oldest first.
    Ascending,
    /// Newest first.
    Descending,
}

impl OrderDir {
    /// The SQL keyword for this direction.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// Builder for tail/poll `SELECT` statements.
///
/// All caller input flows through validation before it reaches the emitted
/// text: the stream name through the identifier pattern, the limit through
/// the line-count bounds, and filters through [`build_filter_clause`].
#[derive(Debug, Clone)]
pub struct SelectBuilder {
    stream: String,
    filters: QueryFilter,
    order: OrderDir,
    limit: Option<u64>,
}

impl SelectBuilder {
    /// Creates a builder for the given stream.
    #[must_use]
    pub fn new(stream: impl Into<String>) -> Self {
        Self {
            stream: stream.into(),
            filters: QueryFilter::new(),
            order: OrderDir::Ascending,
            limit: None,
        }
    }

    /// Sets the exact-match filters.
    #[must_use]
    pub fn filters(mut self, filters: QueryFilter) -> Self {
        self.filters = filters;
        self
    }

    /// Sets the sort direction.
    #[must_use]
    pub const fn order(mut self, order: OrderDir) -> Self {
        self.order = order;
        self
    }

    /// Sets a row limit.
    #[must_use]
    pub const fn limit(mut self, lines: u64) -> Self {
        self.limit = Some(lines);
        self
    }

    /// Renders the statement, validating every caller-supplied part.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for a bad stream name, an out-of-range
    /// limit, or an invalid filter column.
    pub fn build(&self) -> Result<String, ValidationError> {
        validate_identifier("stream", &self.stream)?;
        if let Some(lines) = self.limit {
            validate_line_count(lines)?;
        }

        let mut sql = format!("SELECT * FROM {}", self.stream);

        let clause = build_filter_clause(&self.filters)?;
        if !clause.is_empty() {
            sql.push(' ');
            sql.push_str(&clause);
        }

        sql.push_str(" ORDER BY ");
        sql.push_str(TIMESTAMP_COLUMN);
        sql.push(' ');
        sql.push_str(self.order.as_sql());

        if let Some(lines) = self.limit {
            sql.push_str(" LIMIT ");
            sql.push_str(&lines.to_string());
        }

        Ok(sql)
    }
}
