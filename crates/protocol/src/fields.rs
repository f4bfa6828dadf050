//! Lenient accessors for JSON envelopes.
//!
//! The remote encodes most numbers as strings, sends `"0"`/`"1"` for flags,
//! and collapses one-element lists into a bare object. These helpers hide
//! those quirks from the parsers built on top of them.

use serde_json::Value;

/// Reads `key` as text. Numbers and booleans are rendered; anything else is `None`.
pub fn opt_text(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Reads `key` as text, defaulting to an empty string.
pub fn text(value: &Value, key: &str) -> String {
    opt_text(value, key).unwrap_or_default()
}

/// Reads `key` as a non-empty string, treating `""` like a missing field.
pub fn non_empty(value: &Value, key: &str) -> Option<String> {
    opt_text(value, key).filter(|s| !s.is_empty())
}

/// Reads `key` as an unsigned integer from a number or a numeric string.
pub fn opt_number(value: &Value, key: &str) -> Option<u64> {
    match value.get(key)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Reads `key` as an unsigned integer, defaulting to zero.
pub fn number(value: &Value, key: &str) -> u64 {
    opt_number(value, key).unwrap_or(0)
}

/// Reads `key` as a flag: `true`, non-zero numbers and non-zero numeric strings.
pub fn flag(value: &Value, key: &str) -> bool {
    match value.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(_) => opt_number(value, key).is_some_and(|n| n != 0),
        None => false,
    }
}

/// Reads `key` as a Unix timestamp in seconds. Zero is treated as absent.
pub fn timestamp(value: &Value, key: &str) -> Option<u64> {
    opt_number(value, key).filter(|secs| *secs > 0)
}

/// Normalizes a field that may hold a list, a single object, or an
/// id-keyed map into a list of entries.
pub fn one_or_many(value: Option<&Value>) -> Vec<&Value> {
    match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(v @ Value::Object(map)) => {
            // An id-keyed map of objects, e.g. {"1": {...}, "2": {...}}.
            let id_keyed = !map.is_empty()
                && map
                    .iter()
                    .all(|(key, item)| item.is_object() && key.parse::<u64>().is_ok());
            if id_keyed {
                map.values().collect()
            } else {
                vec![v]
            }
        }
        _ => Vec::new(),
    }
}

/// Follows a path of object keys.
pub fn path<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().try_fold(value, |current, key| current.get(*key))
}
