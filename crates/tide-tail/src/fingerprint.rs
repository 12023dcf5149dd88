//! Record identity for client-side deduplication.
//!
//! A [`Fingerprint`] pairs a record's timestamp with a content digest of
//! its canonical JSON form. Canonicalization sorts keys recursively, so
//! two polls that return the same logical record produce the same
//! fingerprint even when the backend reorders keys.

use std::collections::HashSet;
use std::fmt;

use serde_json::{Map, Value};

use tide_client::LogRecord;

fn sort_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_unstable();
            let mut sorted = Map::new();
            for key in keys {
                if let Some(inner) = map.get(key) {
                    sorted.insert(key.clone(), sort_value(inner));
                }
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_value).collect()),
        other => other.clone(),
    }
}

/// Canonical JSON text of a record: compact, recursively key-sorted.
#[must_use]
pub fn canonical_json(record: &LogRecord) -> String {
    sort_value(&Value::Object(record.fields().clone())).to_string()
}

/// Identity of one record across polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    timestamp_us: i64,
    digest: [u8; 32],
}

impl Fingerprint {
    /// Derives the fingerprint of a record.
    #[must_use]
    pub fn of(record: &LogRecord) -> Self {
        let canonical = canonical_json(record);
        Self {
            timestamp_us: record.timestamp_us(),
            digest: *blake3::hash(canonical.as_bytes()).as_bytes(),
        }
    }

    /// The record timestamp captured at derivation time.
    #[must_use]
    pub const fn timestamp_us(&self) -> i64 {
        self.timestamp_us
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            self.timestamp_us,
            blake3::Hash::from(self.digest).to_hex()
        )
    }
}

/// Fingerprints already observed by one poller.
///
/// Owned exclusively by its poller instance and mutated only inside that
/// poller's loop. Pruning bounds memory under sustained tailing at the
/// cost of not deduplicating records re-delivered past the horizon.
#[derive(Debug, Default)]
pub struct SeenSet {
    entries: HashSet<Fingerprint>,
}

impl SeenSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a sighting; returns true on the first one.
    pub fn observe(&mut self, fingerprint: Fingerprint) -> bool {
        self.entries.insert(fingerprint)
    }

    /// Whether the fingerprint has been observed.
    #[must_use]
    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.entries.contains(fingerprint)
    }

    /// Number of retained fingerprints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing has been observed (or everything was pruned).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Discards fingerprints older than the given timestamp.
    pub fn prune_older_than(&mut self, min_timestamp_us: i64) {
        self.entries
            .retain(|fingerprint| fingerprint.timestamp_us >= min_timestamp_us);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> LogRecord {
        LogRecord::from_value(value).expect("object value")
    }

    // ===========================================
    // Canonicalization Tests
    // ===========================================

    #[test]
    fn key_order_does_not_change_the_canonical_form() {
        let a = record(json!({"b": 1, "a": {"y": 2, "x": 3}}));
        let b = record(json!({"a": {"x": 3, "y": 2}, "b": 1}));
        assert_eq!(canonical_json(&a), canonical_json(&b));
    }

    #[test]
    fn canonical_form_is_sorted_and_compact() {
        let rec = record(json!({"z": 1, "a": 2}));
        assert_eq!(canonical_json(&rec), r#"{"a":2,"z":1}"#);
    }

    #[test]
    fn array_order_is_significant() {
        let a = record(json!({"v": [1, 2]}));
        let b = record(json!({"v": [2, 1]}));
        assert_ne!(canonical_json(&a), canonical_json(&b));
    }

    // ===========================================
    // Fingerprint Tests
    // ===========================================

    #[test]
    fn identical_records_share_a_fingerprint() {
        let a = record(json!({"_timestamp": 1000, "msg": "hi"}));
        let b = record(json!({"msg": "hi", "_timestamp": 1000}));
        assert_eq!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[test]
    fn content_changes_the_fingerprint() {
        let a = record(json!({"_timestamp": 1000, "msg": "hi"}));
        let b = record(json!({"_timestamp": 1000, "msg": "ho"}));
        assert_ne!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[test]
    fn fingerprint_embeds_the_timestamp() {
        let rec = record(json!({"_timestamp": 12345, "msg": "hi"}));
        assert_eq!(Fingerprint::of(&rec).timestamp_us(), 12345);
    }

    #[test]
    fn display_is_timestamp_colon_digest() {
        let rec = record(json!({"_timestamp": 7}));
        let shown = Fingerprint::of(&rec).to_string();
        assert!(shown.starts_with("7:"));
        assert_eq!(shown.len(), "7:".len() + 64);
    }

    // ===========================================
    // SeenSet Tests
    // ===========================================

    #[test]
    fn observe_reports_first_sighting_only() {
        let mut seen = SeenSet::new();
        let fp = Fingerprint::of(&record(json!({"_timestamp": 1000, "msg": "hi"})));

        assert!(seen.observe(fp));
        assert!(!seen.observe(fp));
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn prune_discards_only_old_fingerprints() {
        let mut seen = SeenSet::new();
        let old = Fingerprint::of(&record(json!({"_timestamp": 1000, "msg": "old"})));
        let recent = Fingerprint::of(&record(json!({"_timestamp": 5000, "msg": "new"})));
        seen.observe(old);
        seen.observe(recent);

        seen.prune_older_than(2000);

        assert_eq!(seen.len(), 1);
        assert!(!seen.contains(&old));
        assert!(seen.contains(&recent));
    }

    #[test]
    fn prune_keeps_fingerprints_at_the_horizon() {
        let mut seen = SeenSet::new();
        let fp = Fingerprint::of(&record(json!({"_timestamp": 2000})));
        seen.observe(fp);

        seen.prune_older_than(2000);
        assert!(seen.contains(&fp));
    }
}
