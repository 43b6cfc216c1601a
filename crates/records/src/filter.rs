//! Recursive pruning of empty placeholders.
//!
//! Every payload that leaves the server passes through [`deep_filter`] once, so tool output never
//! carries `null`, `""`, `{}` or `[]`. `false` and `0` are values, not placeholders, and survive.

use serde_json::{Map, Value};

/// Prune `value` recursively.
///
/// An object or array that becomes empty is returned as an empty container of the same kind; an
/// empty scalar (`null` or `""`) becomes `null`.
pub fn deep_filter(value: Value) -> Value {
    match value {
        Value::Object(_) => prune(value).unwrap_or_else(|| Value::Object(Map::new())),
        Value::Array(_) => prune(value).unwrap_or_else(|| Value::Array(Vec::new())),
        other => prune(other).unwrap_or(Value::Null),
    }
}

/// `true` when the value is one of the placeholders [`deep_filter`] removes.
pub fn is_placeholder(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn prune(value: Value) -> Option<Value> {
    let pruned = match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter_map(|(key, value)| prune(value).map(|value| (key, value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().filter_map(prune).collect()),
        scalar => scalar,
    };
    (!is_placeholder(&pruned)).then_some(pruned)
}
