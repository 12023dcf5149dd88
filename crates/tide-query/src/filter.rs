//! Exact-match column filters and their rendering as a `WHERE` fragment.
//!
//! This module is the only place untrusted filter input touches SQL text.
//! Column names cannot be parameterized in the backend dialect, so they are
//! validated against a strict identifier pattern; values are escaped by
//! doubling embedded single quotes.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ValidationError;

/// Allowed characters for SQL identifiers (columns, stream names).
pub const IDENTIFIER_PATTERN: &str = "^[A-Za-z0-9_]+$";

static IDENTIFIER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(IDENTIFIER_PATTERN).unwrap_or_else(|_| unreachable!()));

/// Validate a SQL identifier.
///
/// # Errors
///
/// Returns a [`ValidationError`] naming `field` when `value` is empty or
/// contains characters outside `[A-Za-z0-9_]`.
pub fn validate_identifier(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::empty(field));
    }
    if !IDENTIFIER_REGEX.is_match(value) {
        return Err(ValidationError::invalid_characters(
            field,
            value,
            "[A-Za-z0-9_]",
        ));
    }
    Ok(())
}

/// Escape a string literal for interpolation into SQL text.
#[must_use]
pub fn escape_value(value: &str) -> String {
    value.replace('\'', "''")
}

/// An ordered set of exact-match column filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFilter {
    entries: Vec<(String, String)>,
}

impl QueryFilter {
    /// Creates an empty filter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column filter, preserving insertion order.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(column, value);
        self
    }

    /// Adds a column filter in place.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.entries.push((column.into(), value.into()));
    }

    /// Returns true if no filters are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterates the filters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Render a filter set as a `WHERE` fragment.
///
/// An empty set renders as an empty string. Conditions are joined with
/// `AND` and the fragment is prefixed with `WHERE ` only when at least one
/// condition exists.
///
/// # Errors
///
/// Returns a [`ValidationError`] naming the offending column when a column
/// name fails the identifier pattern.
pub fn build_filter_clause(filter: &QueryFilter) -> Result<String, ValidationError> {
    if filter.is_empty() {
        return Ok(String::new());
    }

    let mut conditions = Vec::with_capacity(filter.len());
    for (column, value) in filter.iter() {
        validate_identifier(column, column)?;
        conditions.push(format!("{column} = '{}'", escape_value(value)));
    }

    Ok(format!("WHERE {}", conditions.join(" AND ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // ===========================================
    // Identifier Tests
    // ===========================================

    #[test]
    fn accepts_plain_identifiers() {
        for ident in ["level", "k8s_namespace", "Field2", "_timestamp"] {
            assert!(validate_identifier("column", ident).is_ok());
        }
    }

    #[test]
    fn rejects_injection_attempts() {
        for ident in [
            "level; DROP TABLE x",
            "a b",
            "a-b",
            "a'b",
            "a\"b",
            "a.b",
            "",
        ] {
            assert!(validate_identifier("column", ident).is_err());
        }
    }

    #[test]
    fn empty_identifier_reports_empty_kind() {
        let err = validate_identifier("stream", "").expect_err("should fail");
        assert_eq!(err.kind, crate::error::ValidationErrorKind::Empty);
    }

    // ===========================================
    // Clause Tests
    // ===========================================

    #[test]
    fn empty_filter_renders_nothing() {
        let clause = build_filter_clause(&QueryFilter::new()).expect("should build");
        assert_eq!(clause, "");
    }

    #[test]
    fn single_condition() {
        let filter = QueryFilter::new().with("level", "error");
        let clause = build_filter_clause(&filter).expect("should build");
        assert_eq!(clause, "WHERE level = 'error'");
    }

    #[test]
    fn conditions_join_with_and_in_insertion_order() {
        let filter = QueryFilter::new()
            .with("level", "error")
            .with("service", "api");
        let clause = build_filter_clause(&filter).expect("should build");
        assert_eq!(clause, "WHERE level = 'error' AND service = 'api'");
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        let filter = QueryFilter::new().with("level", "O'Brien");
        let clause = build_filter_clause(&filter).expect("should build");
        assert_eq!(clause, "WHERE level = 'O''Brien'");
    }

    #[test]
    fn bad_column_fails_and_names_the_key() {
        let filter = QueryFilter::new().with("level; --", "x");
        let err = build_filter_clause(&filter).expect_err("should fail");
        assert_eq!(err.field, "level; --");
    }

    proptest! {
        // Undoing the escaping must reconstruct the original value exactly.
        #[test]
        fn escaping_round_trips(value in ".*") {
            let escaped = escape_value(&value);
            prop_assert!(!escaped.replace("''", "").contains('\''));
            prop_assert_eq!(escaped.replace("''", "'"), value);
        }
    }
}
