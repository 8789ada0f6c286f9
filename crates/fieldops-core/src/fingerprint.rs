//! Content hashing for cache keys and insight fingerprints

use serde_json::Value;
use sha2::{Digest, Sha256};

/// SHA-256 of the content as a lowercase hex string
pub fn sha256_hex(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Stable hash over the canonical form of a set of facts
///
/// Object keys are sorted recursively before hashing, so two equivalent fact
/// sets hash identically regardless of construction order.
pub fn fingerprint(facts: &Value) -> String {
    sha256_hex(&canonicalize(facts).to_string())
}

/// Rebuild a JSON value with every object's keys in sorted order
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k.clone(), canonicalize(v))).collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Round a metric down to the nearest bucket so small drift keeps the same hash
pub fn bucket(value: f64, size: f64) -> i64 {
    if !value.is_finite() || size <= 0.0 {
        return 0;
    }
    (value / size).floor() as i64
}
