use serde_json::Value;

pub(crate) fn is_primitive(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

/// Header fields for a tabular block, or `None` when `items` must use the nested list form.
///
/// Tabular requires a non-empty array of non-empty objects that share one key set and hold only
/// primitive values. Columns follow the first object's key order.
pub fn tabular_fields(items: &[Value]) -> Option<Vec<String>> {
    let Value::Object(first) = items.first()? else {
        return None;
    };
    if first.is_empty() {
        return None;
    }
    let fields: Vec<String> = first.keys().cloned().collect();

    let uniform = items.iter().all(|item| match item {
        Value::Object(map) => {
            map.len() == fields.len()
                && fields
                    .iter()
                    .all(|key| map.get(key).is_some_and(is_primitive))
        }
        _ => false,
    });
    uniform.then_some(fields)
}
