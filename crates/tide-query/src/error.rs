//! Validation error types with detailed rejection reasons.

use std::fmt;

use thiserror::Error;

/// The kind of validation error that occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Input was empty when a value was required.
    Empty,
    /// Input contained invalid characters.
    InvalidCharacters {
        /// The offending input.
        found: String,
        /// Description of allowed characters.
        allowed: String,
    },
    /// Numeric value was out of allowed range.
    OutOfRange {
        /// Minimum allowed value.
        min: u64,
        /// Maximum allowed value.
        max: u64,
        /// Actual value provided.
        actual: u64,
    },
    /// Input did not match expected format.
    InvalidFormat {
        /// Expected format description.
        expected: String,
        /// What was actually provided.
        actual: String,
    },
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "input cannot be empty"),
            Self::InvalidCharacters { found, allowed } => {
                write!(f, "invalid characters in '{found}': allowed: {allowed}")
            }
            Self::OutOfRange { min, max, actual } => {
                write!(f, "value {actual} out of range [{min}, {max}]")
            }
            Self::InvalidFormat { expected, actual } => {
                write!(f, "invalid format: expected {expected}, got '{actual}'")
            }
        }
    }
}

/// Error returned when validation fails.
#[derive(Debug, Clone, Error)]
#[error("validation failed for '{field}': {kind}")]
pub struct ValidationError {
    /// The name of the field that failed validation.
    pub field: String,
    /// The kind of validation error.
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    /// Create a new validation error.
    #[must_use]
    pub fn new(field: impl Into<String>, kind: ValidationErrorKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }

    /// Create an "empty" validation error.
    #[must_use]
    pub fn empty(field: impl Into<String>) -> Self {
        Self::new(field, ValidationErrorKind::Empty)
    }

    /// Create an "invalid characters" validation error.
    #[must_use]
    pub fn invalid_characters(
        field: impl Into<String>,
        found: impl Into<String>,
        allowed: impl Into<String>,
    ) -> Self {
        Self::new(
            field,
            ValidationErrorKind::InvalidCharacters {
                found: found.into(),
                allowed: allowed.into(),
            },
        )
    }

    /// Create an "out of range" validation error.
    #[must_use]
    pub fn out_of_range(field: impl Into<String>, min: u64, max: u64, actual: u64) -> Self {
        Self::new(field, ValidationErrorKind::OutOfRange { min, max, actual })
    }

    /// Create an "invalid format" validation error.
    #[must_use]
    pub fn invalid_format(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::new(
            field,
            ValidationErrorKind::InvalidFormat {
                expected: expected.into(),
                actual: actual.into(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_names_the_field() {
        let err = ValidationError::empty("stream");
        assert_eq!(
            err.to_string(),
            "validation failed for 'stream': input cannot be empty"
        );
    }

    #[test]
    fn invalid_characters_display() {
        let err = ValidationError::invalid_characters("column", "drop table", "[A-Za-z0-9_]");
        let msg = err.to_string();
        assert!(msg.contains("column"));
        assert!(msg.contains("drop table"));
        assert!(msg.contains("[A-Za-z0-9_]"));
    }

    #[test]
    fn out_of_range_display() {
        let err = ValidationError::out_of_range("lines", 1, 10_000, 50_000);
        assert_eq!(
            err.to_string(),
            "validation failed for 'lines': value 50000 out of range [1, 10000]"
        );
    }

    #[test]
    fn invalid_format_display() {
        let err = ValidationError::invalid_format("start", "-<N><s|m|h|d> or 'now'", "-5y");
        assert!(err.to_string().contains("-5y"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ValidationError>();
    }
}
