//! Scalar literals: when a string needs quotes, how quotes are escaped, and how a token reads back.

use crate::error::{Result, ToonError};
use serde_json::{Number, Value};
use std::fmt::Write as _;

pub(crate) const DELIMITER: char = ',';

const STRUCTURAL: &[char] = &[DELIMITER, ':', '"', '\\', '[', ']', '{', '}'];

pub(crate) fn is_bare_key(key: &str) -> bool {
    let mut chars = key.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

pub(crate) fn write_key(key: &str) -> String {
    if is_bare_key(key) {
        key.to_string()
    } else {
        quote(key)
    }
}

pub(crate) fn write_primitive(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) if needs_quotes(s) => quote(s),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => unreachable!("write_primitive called on a container"),
    }
}

fn looks_numeric(s: &str) -> bool {
    serde_json::from_str::<Number>(s).is_ok()
}

fn needs_quotes(s: &str) -> bool {
    s.is_empty()
        || s.trim() != s
        || matches!(s, "true" | "false" | "null")
        || s.starts_with('-')
        || s.chars().any(|c| STRUCTURAL.contains(&c) || c.is_control())
        || looks_numeric(s)
}

pub(crate) fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Parse a quoted string at the start of `raw`. Returns the string and the byte length consumed
/// (including both quotes).
pub(crate) fn parse_quoted(raw: &str, line: usize) -> Result<(String, usize)> {
    let mut out = String::new();
    let mut chars = raw.char_indices();
    match chars.next() {
        Some((_, '"')) => {}
        _ => return Err(ToonError::syntax(line, "expected '\"'")),
    }
    while let Some((idx, c)) = chars.next() {
        match c {
            '"' => return Ok((out, idx + 1)),
            '\\' => {
                let Some((_, escaped)) = chars.next() else {
                    return Err(ToonError::UnterminatedQuote { line });
                };
                match escaped {
                    '"' => out.push('"'),
                    '\\' => out.push('\\'),
                    'n' => out.push('\n'),
                    'r' => out.push('\r'),
                    't' => out.push('\t'),
                    'u' => {
                        let hex: String = chars.by_ref().take(4).map(|(_, h)| h).collect();
                        let decoded = u32::from_str_radix(&hex, 16)
                            .ok()
                            .filter(|_| hex.len() == 4)
                            .and_then(char::from_u32)
                            .ok_or_else(|| ToonError::syntax(line, "invalid \\u escape"))?;
                        out.push(decoded);
                    }
                    other => {
                        return Err(ToonError::syntax(line, format!("invalid escape '\\{other}'")))
                    }
                }
            }
            c => out.push(c),
        }
    }
    Err(ToonError::UnterminatedQuote { line })
}

pub(crate) fn parse_primitive(token: &str, line: usize) -> Result<Value> {
    let token = token.trim();
    if token.starts_with('"') {
        let (s, used) = parse_quoted(token, line)?;
        if used != token.len() {
            return Err(ToonError::syntax(line, "unexpected text after quoted string"));
        }
        return Ok(Value::String(s));
    }
    Ok(match token {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        _ => match serde_json::from_str::<Number>(token) {
            Ok(n) => Value::Number(n),
            Err(_) => Value::String(token.to_string()),
        },
    })
}

/// Split on the delimiter outside quotes. Cells are returned untrimmed.
pub(crate) fn split_delimited(raw: &str, line: usize) -> Result<Vec<&str>> {
    let mut cells = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;
    for (idx, c) in raw.char_indices() {
        if in_quotes {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_quotes = false;
            }
            continue;
        }
        if c == '"' {
            in_quotes = true;
        } else if c == DELIMITER {
            cells.push(&raw[start..idx]);
            start = idx + c.len_utf8();
        }
    }
    if in_quotes {
        return Err(ToonError::UnterminatedQuote { line });
    }
    cells.push(&raw[start..]);
    Ok(cells)
}
