//! Byte-range editing of XML parts.
//!
//! Parts are navigated with `roxmltree`, which keeps the byte range of every
//! node. Edits are expressed as splices over the original text so anything that
//! is not touched stays byte-identical.

use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    pub range: Range<usize>,
    pub replacement: String,
}

impl Splice {
    pub fn replace(range: Range<usize>, replacement: impl Into<String>) -> Self {
        Self { range, replacement: replacement.into() }
    }

    pub fn insert(at: usize, content: impl Into<String>) -> Self {
        Self { range: at..at, replacement: content.into() }
    }
}

/// Applies `splices` to `source`.
///
/// Splices must not overlap; their order in the vector does not matter. Two
/// inserts at the same offset keep their relative order.
pub fn apply_splices(source: &str, mut splices: Vec<Splice>) -> String {
    splices.sort_by_key(|s| (s.range.start, s.range.end));

    let extra: usize = splices.iter().map(|s| s.replacement.len()).sum();
    let mut out = String::with_capacity(source.len() + extra);
    let mut cursor = 0;
    for splice in splices {
        debug_assert!(splice.range.start >= cursor, "overlapping splices");
        out.push_str(&source[cursor..splice.range.start]);
        out.push_str(&splice.replacement);
        cursor = splice.range.end;
    }
    out.push_str(&source[cursor..]);
    out
}

/// Escapes character data. Control characters that XML 1.0 cannot carry are
/// written in the OOXML `_xHHHH_` notation.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\t' | '\n' | '\r' => out.push(ch),
            c if (c as u32) < 0x20 => out.push_str(&format!("_x{:04X}_", c as u32)),
            c => out.push(c),
        }
    }
    out
}

pub fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

/// Qualified tag name for `local` in the namespace bound to `prefix`.
pub fn qname(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}:{local}"),
        _ => local.to_string(),
    }
}
