//! Literal find and replace over the document buffer.
//!
//! Patterns are always matched literally: user text is escaped before it
//! reaches the regex engine, so `a.b` only ever matches `a.b`. Matching is
//! left to right and non-overlapping. A pattern that cannot be compiled is
//! treated as matching nothing.
//!
//! Positions are character offsets.

mod match_set;

pub use match_set::MatchSet;

use regex::{Regex, RegexBuilder};

/// Compile `pattern` as a literal matcher.
///
/// Returns `None` for an empty pattern or one the engine rejects.
pub fn literal_regex(pattern: &str, case_sensitive: bool) -> Option<Regex> {
    if pattern.is_empty() {
        return None;
    }
    RegexBuilder::new(&regex::escape(pattern))
        .case_insensitive(!case_sensitive)
        .build()
        .inspect_err(|err| tracing::debug!(%err, "search pattern rejected"))
        .ok()
}

/// Start offsets of every occurrence of `pattern` in `text`.
pub fn find_matches(text: &str, pattern: &str, case_sensitive: bool) -> Vec<usize> {
    let Some(regex) = literal_regex(pattern, case_sensitive) else {
        return Vec::new();
    };
    let mut positions = Vec::new();
    let mut chars = 0;
    let mut last_byte = 0;
    for found in regex.find_iter(text) {
        chars += text[last_byte..found.start()].chars().count();
        last_byte = found.start();
        positions.push(chars);
    }
    positions
}

/// Replace every occurrence in a single pass over the original text.
///
/// The replacement is inserted verbatim (`$1` is not expanded). Returns the
/// new text and the number of replacements.
pub fn replace_all(
    text: &str,
    pattern: &str,
    replacement: &str,
    case_sensitive: bool,
) -> (String, usize) {
    let Some(regex) = literal_regex(pattern, case_sensitive) else {
        return (text.to_string(), 0);
    };
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut count = 0;
    for found in regex.find_iter(text) {
        out.push_str(&text[last..found.start()]);
        out.push_str(replacement);
        last = found.end();
        count += 1;
    }
    out.push_str(&text[last..]);
    (out, count)
}

/// A piece of rendered text, flagged when it matched the search pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub matched: bool,
}

/// Split `text` into alternating plain and matched segments.
///
/// Empty segments are never produced; text with no match comes back as a
/// single plain segment.
pub fn highlight_segments<'a>(text: &'a str, pattern: &str, case_sensitive: bool) -> Vec<Segment<'a>> {
    let mut segments = Vec::new();
    let mut last = 0;
    if let Some(regex) = literal_regex(pattern, case_sensitive) {
        for found in regex.find_iter(text) {
            if found.start() > last {
                segments.push(Segment {
                    text: &text[last..found.start()],
                    matched: false,
                });
            }
            segments.push(Segment {
                text: found.as_str(),
                matched: true,
            });
            last = found.end();
        }
    }
    if last < text.len() {
        segments.push(Segment {
            text: &text[last..],
            matched: false,
        });
    }
    segments
}
