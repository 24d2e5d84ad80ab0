//! Canonical hashing primitives.
//!
//! A record's hash is the SHA-256 of a canonical JSON document built from its
//! hashed fields. Canonical form is:
//!
//!   1. object keys sorted lexicographically at every nesting level
//!   2. no insignificant whitespace
//!   3. enums as their lowercase wire strings
//!   4. timestamps as RFC 3339 in UTC with a `Z` suffix
//!   5. numbers as serde_json renders them (shortest round-trip form for floats)
//!
//! Rule 1 is enforced explicitly by `canonicalize` rather than relying on the
//! map type behind `serde_json::Value`, so enabling `preserve_order` anywhere
//! in the dependency graph cannot change a digest.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Rebuild `value` with every object's keys in sorted order.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            let mut sorted = Map::new();
            for (key, inner) in entries {
                sorted.insert(key.clone(), canonicalize(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Serialize `value` in canonical form.
pub fn canonical_string(value: &Value) -> String {
    // Serializing a `Value` cannot fail: every key is already a string.
    canonicalize(value).to_string()
}

/// SHA-256 of `value`'s canonical form, as 64 lowercase hex characters.
pub fn digest_value(value: &Value) -> String {
    sha256_hex(canonical_string(value).as_bytes())
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// The timestamp encoding committed to by the hash.
pub fn canonical_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// True when `hash` begins with at least `difficulty` `'0'` characters.
pub fn meets_difficulty(hash: &str, difficulty: usize) -> bool {
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}
