//! Record and wire types shared between the client and the tailing engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use tide_query::TimeExpr;

/// The field every backend record keys its timestamp under.
pub const TIMESTAMP_FIELD: &str = "_timestamp";

/// One backend record: an insertion-ordered map of caller-defined fields.
///
/// The client is schema-agnostic. The only structure assumed is a numeric
/// `_timestamp` field in microseconds since the epoch; a record without one
/// reads as timestamp `0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogRecord {
    fields: Map<String, Value>,
}

impl LogRecord {
    /// Creates a record from raw fields.
    #[must_use]
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Converts a decoded JSON value into a record; non-objects are not
    /// records.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    /// The record timestamp in microseconds; missing or non-numeric reads
    /// as `0`.
    #[must_use]
    pub fn timestamp_us(&self) -> i64 {
        self.fields
            .get(TIMESTAMP_FIELD)
            .and_then(Value::as_i64)
            .unwrap_or(0)
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The underlying fields in backend order.
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Consumes the record, returning its fields.
    #[must_use]
    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }
}

impl From<Map<String, Value>> for LogRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

/// One bounded search over a time window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchQuery {
    /// The statement to execute.
    pub sql: String,
    /// Window floor (inclusive).
    pub start_time: TimeExpr,
    /// Window ceiling (inclusive); usually [`TimeExpr::Now`].
    pub end_time: TimeExpr,
    /// Maximum number of hits to return.
    pub size: u64,
}

impl SearchQuery {
    /// Creates a query over `[start, end]`.
    #[must_use]
    pub fn new(sql: impl Into<String>, start_time: TimeExpr, end_time: TimeExpr, size: u64) -> Self {
        Self {
            sql: sql.into(),
            start_time,
            end_time,
            size,
        }
    }
}

/// The hits of one search call — the only response shape the engine
/// depends on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    /// Matching records, in backend order.
    #[serde(default)]
    pub hits: Vec<LogRecord>,
}
