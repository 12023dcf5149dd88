//! Relative time expressions and their resolution to absolute timestamps.
//!
//! The backend and the client share a small grammar for time bounds:
//! `"-<N><unit>"` with unit in `{s, m, h, d}`, or the literal `"now"`.
//! Absolute bounds are microseconds since the Unix epoch. [`TimeExpr`]
//! models all three forms and serializes to exactly the wire shape the
//! backend expects (a number or a grammar string).

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// Microseconds in one second.
pub const MICROS_PER_SECOND: i64 = 1_000_000;

/// Human-readable description of the relative time grammar, used in errors.
const TIME_GRAMMAR: &str = "'-<N><s|m|h|d>' or 'now'";

/// Regex for relative time expressions (`-5m`, `-12h`, ...).
static RELATIVE_TIME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-([0-9]+)([smhd])$").unwrap_or_else(|_| unreachable!()));

/// A unit in a relative time expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    /// Seconds (`s`).
    Seconds,
    /// Minutes (`m`).
    Minutes,
    /// Hours (`h`).
    Hours,
    /// Days (`d`).
    Days,
}

impl TimeUnit {
    /// The number of microseconds in one unit.
    #[must_use]
    pub const fn micros(self) -> i64 {
        match self {
            Self::Seconds => MICROS_PER_SECOND,
            Self::Minutes => 60 * MICROS_PER_SECOND,
            Self::Hours => 3600 * MICROS_PER_SECOND,
            Self::Days => 86_400 * MICROS_PER_SECOND,
        }
    }

    /// The grammar suffix for this unit.
    #[must_use]
    pub const fn suffix(self) -> char {
        match self {
            Self::Seconds => 's',
            Self::Minutes => 'm',
            Self::Hours => 'h',
            Self::Days => 'd',
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "s" => Some(Self::Seconds),
            "m" => Some(Self::Minutes),
            "h" => Some(Self::Hours),
            "d" => Some(Self::Days),
            _ => None,
        }
    }
}

/// A time bound: absolute microseconds, an offset from now, or now itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeExpr {
    /// An absolute timestamp in microseconds since the epoch.
    Absolute(i64),
    /// An offset into the past, e.g. `-5m`.
    Relative {
        /// Offset magnitude, always non-negative.
        amount: i64,
        /// Offset unit.
        unit: TimeUnit,
    },
    /// The resolution instant itself.
    Now,
}

impl TimeExpr {
    /// Parse a relative time expression.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the string matches no known
    /// relative-time grammar.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();

        if trimmed == "now" {
            return Ok(Self::Now);
        }

        let captures = RELATIVE_TIME_REGEX
            .captures(trimmed)
            .ok_or_else(|| ValidationError::invalid_format("time", TIME_GRAMMAR, trimmed))?;

        let amount: i64 = captures
            .get(1)
            .and_then(|m| m.as_str().parse().ok())
            .ok_or_else(|| ValidationError::invalid_format("time", TIME_GRAMMAR, trimmed))?;
        let unit = captures
            .get(2)
            .and_then(|m| TimeUnit::from_suffix(m.as_str()))
            .ok_or_else(|| ValidationError::invalid_format("time", TIME_GRAMMAR, trimmed))?;

        Ok(Self::Relative { amount, unit })
    }

    /// Resolve to absolute microseconds against the current clock.
    #[must_use]
    pub fn resolve(&self) -> i64 {
        self.resolve_at(now_us())
    }

    /// Resolve to absolute microseconds against the given instant.
    ///
    /// Absolute expressions pass through unchanged regardless of `now_us`.
    #[must_use]
    pub fn resolve_at(&self, now_us: i64) -> i64 {
        match self {
            Self::Absolute(us) => *us,
            Self::Relative { amount, unit } => {
                now_us.saturating_sub(amount.saturating_mul(unit.micros()))
            }
            Self::Now => now_us,
        }
    }
}

/// Resolve an optional expression, falling back to a default.
#[must_use]
pub fn resolve_or(expr: Option<&TimeExpr>, default: &TimeExpr) -> i64 {
    resolve_or_at(expr, default, now_us())
}

/// Resolve an optional expression against a pinned clock.
#[must_use]
pub fn resolve_or_at(expr: Option<&TimeExpr>, default: &TimeExpr, now_us: i64) -> i64 {
    expr.unwrap_or(default).resolve_at(now_us)
}

/// The current instant in microseconds since the epoch.
#[must_use]
pub fn now_us() -> i64 {
    Utc::now().timestamp_micros()
}

impl FromStr for TimeExpr {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<i64> for TimeExpr {
    fn from(us: i64) -> Self {
        Self::Absolute(us)
    }
}

impl fmt::Display for TimeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absolute(us) => write!(f, "{us}"),
            Self::Relative { amount, unit } => write!(f, "-{amount}{}", unit.suffix()),
            Self::Now => write!(f, "now"),
        }
    }
}

// Wire form: absolute bounds are JSON numbers, everything else is the
// grammar string. This must stay bit-exact with the backend's own syntax.
impl Serialize for TimeExpr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Absolute(us) => serializer.serialize_i64(*us),
            other => serializer.serialize_str(&other.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for TimeExpr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TimeExprVisitor;

        impl Visitor<'_> for TimeExprVisitor {
            type Value = TimeExpr;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "microseconds or a relative time string")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<TimeExpr, E> {
                Ok(TimeExpr::Absolute(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<TimeExpr, E> {
                i64::try_from(v)
                    .map(TimeExpr::Absolute)
                    .map_err(|_| E::custom("timestamp out of range"))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<TimeExpr, E> {
                TimeExpr::parse(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(TimeExprVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const NOW: i64 = 1_700_000_000_000_000;

    // ===========================================
    // Grammar Tests
    // ===========================================

    #[test_case("-1s", 1, TimeUnit::Seconds; "one second")]
    #[test_case("-5m", 5, TimeUnit::Minutes; "five minutes")]
    #[test_case("-12h", 12, TimeUnit::Hours; "twelve hours")]
    #[test_case("-30d", 30, TimeUnit::Days; "thirty days")]
    fn parses_relative_expressions(input: &str, amount: i64, unit: TimeUnit) {
        let expr = TimeExpr::parse(input).expect("should parse");
        assert_eq!(expr, TimeExpr::Relative { amount, unit });
    }

    #[test]
    fn parses_now_literal() {
        let expr = TimeExpr::parse("now").expect("should parse");
        assert_eq!(expr, TimeExpr::Now);
    }

    #[test_case(""; "empty")]
    #[test_case("5m"; "missing sign")]
    #[test_case("-5"; "missing unit")]
    #[test_case("-5y"; "unknown unit")]
    #[test_case("-m"; "missing amount")]
    #[test_case("yesterday"; "prose")]
    #[test_case("--5m"; "double sign")]
    fn rejects_unknown_grammar(input: &str) {
        assert!(TimeExpr::parse(input).is_err());
    }

    #[test]
    fn parse_trims_whitespace() {
        let expr = TimeExpr::parse(" -1h ").expect("should parse");
        assert_eq!(
            expr,
            TimeExpr::Relative {
                amount: 1,
                unit: TimeUnit::Hours
            }
        );
    }

    // ===========================================
    // Resolution Tests
    // ===========================================

    #[test]
    fn absolute_passes_through_unchanged() {
        let expr = TimeExpr::Absolute(42);
        assert_eq!(expr.resolve_at(NOW), 42);
    }

    #[test]
    fn now_resolves_to_the_instant() {
        assert_eq!(TimeExpr::Now.resolve_at(NOW), NOW);
    }

    #[test]
    fn relative_resolves_backwards() {
        let expr = TimeExpr::parse("-1m").expect("should parse");
        assert_eq!(expr.resolve_at(NOW), NOW - 60 * MICROS_PER_SECOND);

        let expr = TimeExpr::parse("-1h").expect("should parse");
        assert_eq!(expr.resolve_at(NOW), NOW - 3600 * MICROS_PER_SECOND);
    }

    #[test]
    fn resolve_or_prefers_the_expression() {
        let expr = TimeExpr::Absolute(7);
        let default = TimeExpr::Now;
        assert_eq!(resolve_or_at(Some(&expr), &default, NOW), 7);
        assert_eq!(resolve_or_at(None, &default, NOW), NOW);
    }

    #[test]
    fn resolve_uses_a_recent_clock() {
        let before = now_us();
        let resolved = TimeExpr::Now.resolve();
        let after = now_us();
        assert!(resolved >= before);
        assert!(resolved <= after);
    }

    // ===========================================
    // Wire Format Tests
    // ===========================================

    #[test]
    fn serializes_absolute_as_number() {
        let json = serde_json::to_string(&TimeExpr::Absolute(1000)).expect("serialize");
        assert_eq!(json, "1000");
    }

    #[test]
    fn serializes_relative_as_grammar_string() {
        let expr = TimeExpr::parse("-5m").expect("should parse");
        let json = serde_json::to_string(&expr).expect("serialize");
        assert_eq!(json, "\"-5m\"");

        let json = serde_json::to_string(&TimeExpr::Now).expect("serialize");
        assert_eq!(json, "\"now\"");
    }

    #[test]
    fn deserializes_both_wire_forms() {
        let expr: TimeExpr = serde_json::from_str("1000").expect("deserialize");
        assert_eq!(expr, TimeExpr::Absolute(1000));

        let expr: TimeExpr = serde_json::from_str("\"-2h\"").expect("deserialize");
        assert_eq!(
            expr,
            TimeExpr::Relative {
                amount: 2,
                unit: TimeUnit::Hours
            }
        );
    }

    #[test]
    fn deserialize_rejects_bad_grammar() {
        let result: Result<TimeExpr, _> = serde_json::from_str("\"-5y\"");
        assert!(result.is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        for input in ["-1s", "-5m", "-12h", "-30d", "now"] {
            let expr = TimeExpr::parse(input).expect("should parse");
            assert_eq!(expr.to_string(), input);
        }
    }
}
