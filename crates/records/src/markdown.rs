//! Lossy markdown → plain text for summaries.
//!
//! Only paired or line-anchored constructs are rewritten, so malformed markdown (an unmatched
//! `**`, a dangling `[`) is left verbatim instead of failing.

use once_cell::sync::Lazy;
use regex::Regex;

static IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[([^\]\n]*)\]\([^)\n]*\)").unwrap());
static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]\n]+)\]\([^)\n]*\)").unwrap());
static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#{1,6}[ \t]+").unwrap());
static BLOCKQUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:>[ \t]?)+").unwrap());
static BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-*+][ \t]+").unwrap());
static RULE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:-{3,}|\*{3,}|_{3,})$").unwrap());
static STRONG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*([^*\n]+)\*\*|__([^_\n]+)__").unwrap());
static STRIKE: Lazy<Regex> = Lazy::new(|| Regex::new(r"~~([^~\n]+)~~").unwrap());
static EMPHASIS_STAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*\s][^*\n]*)\*").unwrap());
static EMPHASIS_UNDERSCORE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[^\w])_([^_\s][^_\n]*)_([^\w]|$)").unwrap());
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`\n]+)`").unwrap());

/// Convert a markdown summary into compact readable prose.
pub fn markdown_to_plain(markdown: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut previous_blank = true;

    for raw in markdown.lines() {
        let line = strip_line_markers(raw.trim());
        if line.is_empty() {
            if !previous_blank {
                lines.push(String::new());
            }
            previous_blank = true;
            continue;
        }
        lines.push(strip_inline(&line));
        previous_blank = false;
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

fn strip_line_markers(line: &str) -> String {
    if RULE.is_match(line) {
        return String::new();
    }
    let line = BLOCKQUOTE.replace(line, "");
    let line = HEADING.replace(&line, "");
    let line = BULLET.replace(&line, "");
    line.trim().to_string()
}

fn strip_inline(line: &str) -> String {
    let line = IMAGE.replace_all(line, "$1");
    let line = LINK.replace_all(&line, "$1");
    let line = INLINE_CODE.replace_all(&line, "$1");
    let line = STRONG.replace_all(&line, "$1$2");
    let line = STRIKE.replace_all(&line, "$1");
    let line = EMPHASIS_STAR.replace_all(&line, "$1");
    let line = EMPHASIS_UNDERSCORE.replace_all(&line, "$1$2$3");
    line.trim_end().to_string()
}
