//! Canonical JSON encoding for content hashing (spec §9: "implementers
//! must pick a canonical-JSON library or implement one and test it
//! against the pinned genesis hash").
//!
//! The `original_source/` prototype hashes `json.dumps(data,
//! sort_keys=True)` — Python's default separators, `", "` between
//! items and `": "` between a key and its value, not the compact form
//! `serde_json::to_string` produces. Reproducing that spacing is load
//! bearing: [`crate::blockchain::main_block::GENESIS_HASH`] is pinned
//! against it.

use serde_json::Value;

/// Renders `value` the way Python's `json.dumps(value, sort_keys=True)`
/// would: sorted object keys, `", "`/`": "` separators, one line.
///
/// Relies on `serde_json::Map` being a `BTreeMap` (the default, absent
/// the `preserve_order` feature), so iterating a `Map` already yields
/// keys in sorted order.
pub fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let parts: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", quote(k), canonical_json(v)))
                .collect();
            format!("{{{}}}", parts.join(", "))
        }
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", parts.join(", "))
        }
        scalar => serde_json::to_string(scalar).expect("scalar JSON values always serialize"),
    }
}

fn quote(s: &str) -> String {
    serde_json::to_string(s).expect("strings always serialize to JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn matches_python_sort_keys_spacing() {
        let value = json!({"b": 1, "a": {"d": 2, "c": null}});
        assert_eq!(canonical_json(&value), r#"{"a": {"c": null, "d": 2}, "b": 1}"#);
    }

    #[test]
    fn empty_object_has_no_inner_space() {
        assert_eq!(canonical_json(&json!({})), "{}");
    }

    #[test]
    fn arrays_join_with_comma_space() {
        assert_eq!(canonical_json(&json!([1, 2, 3])), "[1, 2, 3]");
    }
}
