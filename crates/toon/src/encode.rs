use crate::classify::{is_primitive, tabular_fields};
use crate::literal::{write_key, write_primitive, DELIMITER};
use serde_json::{Map, Value};

const INDENT: &str = "  ";

/// Render `value` as TOON text.
///
/// Objects become indented `key: value` lines. Arrays of primitives are written inline, arrays of
/// uniform flat objects as a header plus one delimited row per item, and anything else as a
/// `- item` list. No trailing newline is emitted.
pub fn encode(value: &Value) -> String {
    let mut writer = Writer::default();
    match value {
        Value::Object(map) => writer.fields(map, 0),
        Value::Array(items) => writer.array("", items, 0, 1),
        primitive => writer.line(0, write_primitive(primitive)),
    }
    writer.lines.join("\n")
}

#[derive(Default)]
struct Writer {
    lines: Vec<String>,
}

impl Writer {
    fn line(&mut self, depth: usize, text: String) {
        self.lines.push(format!("{}{}", INDENT.repeat(depth), text));
    }

    fn fields(&mut self, map: &Map<String, Value>, depth: usize) {
        for (key, value) in map {
            self.field("", key, value, depth, depth + 1);
        }
    }

    /// One `key: ...` entry. `prefix` is `"- "` when the entry opens a list item, in which case
    /// the nested content sits two levels below the hyphen line.
    fn field(&mut self, prefix: &str, key: &str, value: &Value, depth: usize, child_depth: usize) {
        let label = format!("{prefix}{}", write_key(key));
        match value {
            Value::Object(map) => {
                self.line(depth, format!("{label}:"));
                self.fields(map, child_depth);
            }
            Value::Array(items) => self.array(&label, items, depth, child_depth),
            primitive => self.line(depth, format!("{label}: {}", write_primitive(primitive))),
        }
    }

    fn array(&mut self, label: &str, items: &[Value], depth: usize, child_depth: usize) {
        let count = items.len();
        if items.iter().all(is_primitive) {
            let inline = items
                .iter()
                .map(write_primitive)
                .collect::<Vec<_>>()
                .join(&DELIMITER.to_string());
            if inline.is_empty() {
                self.line(depth, format!("{label}[{count}]:"));
            } else {
                self.line(depth, format!("{label}[{count}]: {inline}"));
            }
            return;
        }

        if let Some(columns) = tabular_fields(items) {
            let header = columns
                .iter()
                .map(|c| write_key(c))
                .collect::<Vec<_>>()
                .join(&DELIMITER.to_string());
            self.line(depth, format!("{label}[{count}]{{{header}}}:"));
            for item in items {
                let row = columns
                    .iter()
                    .map(|c| item.get(c).map(write_primitive).unwrap_or_default())
                    .collect::<Vec<_>>()
                    .join(&DELIMITER.to_string());
                self.line(child_depth, row);
            }
            return;
        }

        self.line(depth, format!("{label}[{count}]:"));
        for item in items {
            self.list_item(item, child_depth);
        }
    }

    fn list_item(&mut self, item: &Value, depth: usize) {
        match item {
            Value::Object(map) => {
                let mut entries = map.iter();
                let Some((first_key, first_value)) = entries.next() else {
                    self.line(depth, "-".to_string());
                    return;
                };
                self.field("- ", first_key, first_value, depth, depth + 2);
                for (key, value) in entries {
                    self.field("", key, value, depth + 1, depth + 2);
                }
            }
            Value::Array(items) => self.array("- ", items, depth, depth + 2),
            primitive => self.line(depth, format!("- {}", write_primitive(primitive))),
        }
    }
}
