use crate::error::{Result, ToonError};
use crate::literal::{parse_primitive, parse_quoted, split_delimited};
use serde_json::{Map, Value};

/// Parse TOON text back into a JSON value.
///
/// Empty input decodes to an empty object. Row widths and declared array lengths are checked, so
/// truncated or hand-edited tables fail with a line-numbered error instead of shifting columns.
pub fn decode(input: &str) -> Result<Value> {
    let lines = lex(input)?;
    let Some(first) = lines.first().copied() else {
        return Ok(Value::Object(Map::new()));
    };
    if first.depth != 0 {
        return Err(ToonError::syntax(first.number, "document must start at column zero"));
    }

    let mut parser = Parser { lines, pos: 0 };
    let value = if first.content.starts_with('[') {
        parser.array(first.content, 0, first.number)?
    } else if split_key(first.content, first.number)?.is_some() {
        Value::Object(parser.object(0)?)
    } else {
        parser.pos += 1;
        parse_primitive(first.content, first.number)?
    };

    match parser.peek() {
        Some(extra) => Err(ToonError::syntax(extra.number, "unexpected content")),
        None => Ok(value),
    }
}

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    number: usize,
    depth: usize,
    content: &'a str,
}

fn lex(input: &str) -> Result<Vec<Line<'_>>> {
    let mut lines = Vec::new();
    for (idx, raw) in input.lines().enumerate() {
        let number = idx + 1;
        if raw.trim().is_empty() {
            continue;
        }
        let body = raw.trim_start_matches(' ');
        let indent = raw.len() - body.len();
        if indent % 2 != 0 || body.starts_with('\t') {
            return Err(ToonError::Indentation { line: number });
        }
        lines.push(Line {
            number,
            depth: indent / 2,
            content: body.trim_end(),
        });
    }
    Ok(lines)
}

/// Split `content` into a key and the remainder starting at `:` or `[`, or `None` when the line
/// holds a bare value.
fn split_key(content: &str, line: usize) -> Result<Option<(String, &str)>> {
    if content.starts_with('"') {
        let (key, used) = parse_quoted(content, line)?;
        let rest = &content[used..];
        return Ok((rest.starts_with(':') || rest.starts_with('[')).then_some((key, rest)));
    }

    let mut chars = content.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return Ok(None),
    }
    let end = chars
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '.'))
        .map(|(idx, _)| idx)
        .unwrap_or(content.len());
    let rest = &content[end..];
    Ok((rest.starts_with(':') || rest.starts_with('['))
        .then(|| (content[..end].to_string(), rest)))
}

/// Index of the first `target` outside double quotes.
fn find_unquoted(raw: &str, target: char) -> Option<usize> {
    let mut in_quotes = false;
    let mut escaped = false;
    for (idx, c) in raw.char_indices() {
        if in_quotes {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_quotes = false,
                _ => {}
            }
        } else if c == '"' {
            in_quotes = true;
        } else if c == target {
            return Some(idx);
        }
    }
    None
}

fn parse_field_name(raw: &str, line: usize) -> Result<String> {
    let raw = raw.trim();
    if raw.starts_with('"') {
        let (name, used) = parse_quoted(raw, line)?;
        if used != raw.len() {
            return Err(ToonError::syntax(line, "unexpected text after quoted field name"));
        }
        return Ok(name);
    }
    if raw.is_empty() {
        return Err(ToonError::syntax(line, "empty field name"));
    }
    Ok(raw.to_string())
}

/// Decoded `[N]{fields}:` header plus whatever followed the colon.
struct Header<'a> {
    count: usize,
    fields: Option<Vec<String>>,
    inline: &'a str,
}

fn parse_header(raw: &str, line: usize) -> Result<Header<'_>> {
    let body = raw
        .strip_prefix('[')
        .ok_or_else(|| ToonError::syntax(line, "expected '['"))?;
    let close = body
        .find(']')
        .ok_or_else(|| ToonError::syntax(line, "unclosed array length"))?;
    let count = body[..close]
        .trim()
        .parse::<usize>()
        .map_err(|_| ToonError::syntax(line, "array length must be a non-negative integer"))?;
    let mut rest = &body[close + 1..];

    let fields = match rest.strip_prefix('{') {
        Some(inner) => {
            let end = find_unquoted(inner, '}')
                .ok_or_else(|| ToonError::syntax(line, "unclosed field list"))?;
            let names = split_delimited(&inner[..end], line)?
                .into_iter()
                .map(|name| parse_field_name(name, line))
                .collect::<Result<Vec<_>>>()?;
            rest = &inner[end + 1..];
            Some(names)
        }
        None => None,
    };

    let inline = rest
        .strip_prefix(':')
        .ok_or_else(|| ToonError::syntax(line, "expected ':' after array header"))?
        .trim();
    if fields.is_some() && !inline.is_empty() {
        return Err(ToonError::syntax(line, "table header must end the line"));
    }
    Ok(Header {
        count,
        fields,
        inline,
    })
}

struct Parser<'a> {
    lines: Vec<Line<'a>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<Line<'a>> {
        self.lines.get(self.pos).copied()
    }

    /// Next line if it sits exactly at `depth`; deeper lines are an error.
    fn child_at(&self, depth: usize) -> Result<Option<Line<'a>>> {
        match self.peek() {
            Some(line) if line.depth == depth => Ok(Some(line)),
            Some(line) if line.depth > depth => {
                Err(ToonError::syntax(line.number, "unexpected indentation"))
            }
            _ => Ok(None),
        }
    }

    fn object(&mut self, depth: usize) -> Result<Map<String, Value>> {
        let mut map = Map::new();
        while let Some(line) = self.child_at(depth)? {
            let (key, rest) = split_key(line.content, line.number)?
                .ok_or_else(|| ToonError::syntax(line.number, "expected 'key: value'"))?;
            let value = match rest.strip_prefix(':') {
                Some(after) => {
                    self.pos += 1;
                    let after = after.trim();
                    if after.is_empty() {
                        Value::Object(self.object(depth + 1)?)
                    } else {
                        parse_primitive(after, line.number)?
                    }
                }
                None => self.array(rest, depth, line.number)?,
            };
            map.insert(key, value);
        }
        Ok(map)
    }

    /// Parse an array whose header (`[N]...`) is `raw`, sitting on the current line at `depth`.
    fn array(&mut self, raw: &str, depth: usize, number: usize) -> Result<Value> {
        let header = parse_header(raw, number)?;
        self.pos += 1;

        let items = if let Some(fields) = header.fields {
            let mut rows = Vec::new();
            while let Some(line) = self.child_at(depth + 1)? {
                let cells = split_delimited(line.content, line.number)?;
                if cells.len() != fields.len() {
                    return Err(ToonError::ColumnCount {
                        line: line.number,
                        expected: fields.len(),
                        found: cells.len(),
                    });
                }
                let mut row = Map::new();
                for (field, cell) in fields.iter().zip(cells) {
                    row.insert(field.clone(), parse_primitive(cell, line.number)?);
                }
                rows.push(Value::Object(row));
                self.pos += 1;
            }
            rows
        } else if !header.inline.is_empty() {
            split_delimited(header.inline, number)?
                .into_iter()
                .map(|cell| parse_primitive(cell, number))
                .collect::<Result<Vec<_>>>()?
        } else {
            let mut items = Vec::new();
            while let Some(line) = self.child_at(depth + 1)? {
                items.push(self.list_item(line)?);
            }
            items
        };

        if items.len() != header.count {
            return Err(ToonError::LengthMismatch {
                line: number,
                expected: header.count,
                found: items.len(),
            });
        }
        Ok(Value::Array(items))
    }

    fn list_item(&mut self, line: Line<'a>) -> Result<Value> {
        if line.content == "-" {
            self.pos += 1;
            return Ok(Value::Object(Map::new()));
        }
        let rest = line
            .content
            .strip_prefix("- ")
            .ok_or_else(|| ToonError::syntax(line.number, "expected '- ' list item"))?
            .trim_start();

        if rest.starts_with('[') {
            return self.array(rest, line.depth + 1, line.number);
        }
        if split_key(rest, line.number)?.is_some() {
            // Re-read the item line as the first field of an object one level deeper, so the
            // remaining fields line up with it.
            self.lines[self.pos] = Line {
                number: line.number,
                depth: line.depth + 1,
                content: rest,
            };
            return Ok(Value::Object(self.object(line.depth + 1)?));
        }
        self.pos += 1;
        parse_primitive(rest, line.number)
    }
}
