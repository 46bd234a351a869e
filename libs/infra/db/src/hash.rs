// [libs/infra/db/src/hash.rs]
//! Canonical config hashing (spec §4.3). A config's hash must be stable
//! across re-serialization so a device that re-sends an identical config
//! doesn't see `config_changed = true` just because key order shifted.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Rewrites a `Value` so object keys are sorted, recursively. Arrays keep
/// their order — order is meaningful there, unlike in an object.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = serde_json::Map::new();
            for (k, v) in entries {
                sorted.insert(k.clone(), canonicalize(v));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Hashes a config payload to a 16-hex-char fingerprint. Truncated SHA-256:
/// plenty of collision resistance for change-detection, short enough to
/// carry on every heartbeat response.
pub fn hash_config(value: &Value) -> String {
    let canonical = canonicalize(value);
    let bytes = serde_json::to_vec(&canonical).unwrap_or_default();
    let digest = Sha256::digest(&bytes);
    hex::encode(digest)[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_order_does_not_affect_hash() {
        let a = json!({"b": 1, "a": 2});
        let b = json!({"a": 2, "b": 1});
        assert_eq!(hash_config(&a), hash_config(&b));
    }

    #[test]
    fn different_values_hash_differently() {
        let a = json!({"a": 1});
        let b = json!({"a": 2});
        assert_ne!(hash_config(&a), hash_config(&b));
    }

    #[test]
    fn hash_is_sixteen_hex_chars() {
        let h = hash_config(&json!({"x": [1, 2, 3]}));
        assert_eq!(h.len(), 16);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn nested_object_key_order_is_normalized() {
        let a = json!({"outer": {"z": 1, "a": 2}, "first": true});
        let b = json!({"first": true, "outer": {"a": 2, "z": 1}});
        assert_eq!(hash_config(&a), hash_config(&b));
    }
}
