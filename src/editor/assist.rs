//! Structural editing assistance for markdown source.
//!
//! Every function here is pure: it takes the buffer and the current
//! selection and returns an [`Edit`] describing the new buffer and where the
//! selection lands. Functions that may decline return `None`, in which case
//! the caller falls back to its plain behaviour.

use std::sync::LazyLock;

use regex::Regex;

use crate::document::{Edit, Selection, char_to_byte};

/// One indentation step.
pub const INDENT: &str = "  ";

static BULLET_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)([-*+]) ").expect("bullet marker pattern"));
static NUMBERED_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)([0-9]+)\. ").expect("numbered marker pattern"));

/// Inline styles that wrap a selection in a marker pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineStyle {
    Bold,
    Italic,
    Strikethrough,
    Code,
}

impl InlineStyle {
    /// Prefix and suffix markers.
    pub const fn markers(self) -> (&'static str, &'static str) {
        match self {
            Self::Bold => ("**", "**"),
            Self::Italic => ("_", "_"),
            Self::Strikethrough => ("~~", "~~"),
            Self::Code => ("`", "`"),
        }
    }
}

/// Byte offset of the start of the line containing `byte`.
fn line_start_byte(text: &str, byte: usize) -> usize {
    text[..byte].rfind('\n').map_or(0, |idx| idx + 1)
}

/// Prepend one indentation step to the line holding `selection.start`.
pub fn indent(text: &str, selection: Selection) -> Edit {
    let selection = selection.clamp(text.chars().count());
    let line_start = line_start_byte(text, char_to_byte(text, selection.start));

    let mut out = String::with_capacity(text.len() + INDENT.len());
    out.push_str(&text[..line_start]);
    out.push_str(INDENT);
    out.push_str(&text[line_start..]);

    let shift = INDENT.len();
    Edit {
        text: out,
        selection: Selection::new(selection.start + shift, selection.end + shift),
    }
}

/// Remove one indentation step from the line holding `selection.start`.
///
/// Returns `None` when the line does not start with a full step.
pub fn outdent(text: &str, selection: Selection) -> Option<Edit> {
    let selection = selection.clamp(text.chars().count());
    let line_start = line_start_byte(text, char_to_byte(text, selection.start));
    if !text[line_start..].starts_with(INDENT) {
        return None;
    }

    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..line_start]);
    out.push_str(&text[line_start + INDENT.len()..]);

    let floor = text[..line_start].chars().count();
    let shift = INDENT.len();
    Some(Edit {
        text: out,
        selection: Selection::new(
            selection.start.saturating_sub(shift).max(floor),
            selection.end.saturating_sub(shift).max(floor),
        ),
    })
}

/// The marker a line break after `line` should start the next line with.
fn next_list_marker(line: &str) -> Option<String> {
    if let Some(caps) = BULLET_MARKER.captures(line) {
        return Some(format!("{}{} ", &caps[1], &caps[2]));
    }
    let caps = NUMBERED_MARKER.captures(line)?;
    let next = caps[2].parse::<u64>().ok()?.checked_add(1)?;
    Some(format!("{}{next}. ", &caps[1]))
}

/// Continue a bullet or numbered list on a line break.
///
/// Applies only to a caret sitting at the end of its line. Returns `None`
/// when the line is not a list item, leaving the caller to insert a plain
/// break.
pub fn continue_list(text: &str, selection: Selection) -> Option<Edit> {
    if !selection.is_caret() {
        return None;
    }
    let caret = char_to_byte(text, selection.start);
    let rest = &text[caret..];
    let line_break = if rest.is_empty() || rest.starts_with('\n') {
        "\n"
    } else if rest.starts_with("\r\n") {
        "\r\n"
    } else {
        return None;
    };

    let line = &text[line_start_byte(text, caret)..caret];
    let marker = next_list_marker(line)?;

    let mut out = String::with_capacity(text.len() + line_break.len() + marker.len());
    out.push_str(&text[..caret]);
    out.push_str(line_break);
    out.push_str(&marker);
    out.push_str(rest);

    let caret = selection.start + line_break.chars().count() + marker.chars().count();
    Some(Edit {
        text: out,
        selection: Selection::caret(caret),
    })
}

/// Wrap the selection in an arbitrary marker pair.
///
/// Both selection ends move right by the prefix length, so the same span
/// stays selected inside the markers. A caret ends up between them.
pub fn wrap_with(text: &str, selection: Selection, prefix: &str, suffix: &str) -> Edit {
    let selection = selection.clamp(text.chars().count());
    let start = char_to_byte(text, selection.start);
    let end = char_to_byte(text, selection.end);

    let mut out = String::with_capacity(text.len() + prefix.len() + suffix.len());
    out.push_str(&text[..start]);
    out.push_str(prefix);
    out.push_str(&text[start..end]);
    out.push_str(suffix);
    out.push_str(&text[end..]);

    let shift = prefix.chars().count();
    Edit {
        text: out,
        selection: Selection::new(selection.start + shift, selection.end + shift),
    }
}

/// Wrap the selection in the markers of `style`.
pub fn wrap_style(text: &str, selection: Selection, style: InlineStyle) -> Edit {
    let (prefix, suffix) = style.markers();
    wrap_with(text, selection, prefix, suffix)
}
