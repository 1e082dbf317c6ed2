// hasher.rs — Canonical JSON and SHA-256 utilities.
//
// Decision records carry a hash of the request parameters instead of the
// parameters themselves, so audit logs never leak payloads. For the hash
// to be stable it must be computed over a canonical rendering: UTF-8,
// object keys sorted at every depth, no insignificant whitespace, numbers
// in serde_json's shortest-round-trip form. Two requests that differ only
// in key order hash identically.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Hash arbitrary bytes, returning a lowercase hex-encoded SHA-256 string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Hash a UTF-8 string, returning a lowercase hex-encoded SHA-256 string.
pub fn hash_str(s: &str) -> String {
    hash_bytes(s.as_bytes())
}

/// Render a JSON value canonically: sorted object keys at every depth, no
/// whitespace, shortest-round-trip numbers.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

/// The hex SHA-256 of a value's canonical JSON rendering.
pub fn hash_params(value: &Value) -> String {
    hash_str(&canonical_json(value))
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // serde_json handles string escaping; a String never fails
                // to serialize.
                out.push_str(&serde_json::to_string(key).unwrap_or_default());
                out.push(':');
                write_canonical(&map[*key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        // Scalars already serialize canonically (ryu/itoa for numbers).
        scalar => out.push_str(&serde_json::to_string(scalar).unwrap_or_default()),
    }
}
