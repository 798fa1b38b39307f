use crate::document::{Document, Selection};

/// Direction for caret movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Caret motions beyond single steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Step(Direction),
    LineStart,
    LineEnd,
    WordLeft,
    WordRight,
    DocumentStart,
    DocumentEnd,
    /// Move vertically by a number of lines (page up/down).
    Lines(isize),
}

/// Caret and selection state of the editing pane.
///
/// The anchor stays put while the head moves when a motion extends the
/// selection. Offsets are character offsets into the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    anchor: usize,
    head: usize,
    /// Remembered column for vertical movement (sticky column).
    col_memory: Option<usize>,
}

impl Cursor {
    /// A caret at `offset`.
    pub const fn at(offset: usize) -> Self {
        Self {
            anchor: offset,
            head: offset,
            col_memory: None,
        }
    }

    pub const fn head(&self) -> usize {
        self.head
    }

    pub const fn selection(&self) -> Selection {
        Selection::new(self.anchor, self.head)
    }

    /// Adopt a selection produced by an edit, e.g. a structural edit or a
    /// find target. The head ends up at `selection.end`.
    pub const fn select(&mut self, selection: Selection) {
        self.anchor = selection.start;
        self.head = selection.end;
        self.col_memory = None;
    }

    /// Clamp to a buffer that may have shrunk underneath us.
    pub fn clamp(&mut self, len: usize) {
        self.anchor = self.anchor.min(len);
        self.head = self.head.min(len);
    }

    /// Line and column (in characters) of the head.
    pub fn line_col(&self, doc: &Document) -> (usize, usize) {
        let line = doc.line_of(self.head);
        (line, self.head - doc.line_start(line))
    }

    /// Move the head; without `extend` the selection collapses onto it.
    pub fn apply(&mut self, doc: &Document, motion: Motion, extend: bool) {
        let selection = self.selection();
        // A horizontal step over a range without extending collapses to its edge.
        if !extend && !selection.is_caret() {
            let edge = match motion {
                Motion::Step(Direction::Left) => Some(selection.start),
                Motion::Step(Direction::Right) => Some(selection.end),
                _ => None,
            };
            if let Some(edge) = edge {
                self.collapse(edge);
                return;
            }
        }

        let vertical = matches!(
            motion,
            Motion::Step(Direction::Up | Direction::Down) | Motion::Lines(_)
        );
        let target = match motion {
            Motion::Step(Direction::Left) => self.head.saturating_sub(1),
            Motion::Step(Direction::Right) => (self.head + 1).min(doc.len_chars()),
            Motion::Step(Direction::Up) => self.vertical_target(doc, -1),
            Motion::Step(Direction::Down) => self.vertical_target(doc, 1),
            Motion::Lines(delta) => self.vertical_target(doc, delta),
            Motion::LineStart => doc.line_start(doc.line_of(self.head)),
            Motion::LineEnd => {
                let line = doc.line_of(self.head);
                doc.line_start(line) + doc.line_len(line)
            }
            Motion::WordLeft => word_left(doc, self.head),
            Motion::WordRight => word_right(doc, self.head),
            Motion::DocumentStart => 0,
            Motion::DocumentEnd => doc.len_chars(),
        };

        if !vertical {
            self.col_memory = None;
        }
        self.head = target;
        if !extend {
            self.anchor = target;
        }
    }

    const fn collapse(&mut self, offset: usize) {
        self.anchor = offset;
        self.head = offset;
        self.col_memory = None;
    }

    fn vertical_target(&mut self, doc: &Document, delta: isize) -> usize {
        let (line, col) = self.line_col(doc);
        let want = *self.col_memory.get_or_insert(col);
        let last = doc.line_count().saturating_sub(1);
        let target_line = line.saturating_add_signed(delta).min(last);
        if target_line == line {
            // Moving past the first or last line pins to its edge.
            return match delta.signum() {
                -1 => 0,
                1 => doc.len_chars(),
                _ => self.head,
            };
        }
        doc.line_start(target_line) + want.min(doc.line_len(target_line))
    }

    /// Replace the selection with `text`, leaving a caret after it.
    pub fn insert(&mut self, doc: &mut Document, text: &str) {
        let caret = doc.replace(self.selection().range(), text);
        self.collapse(caret.start);
    }

    /// Backspace: remove the selection, or the character before the caret.
    ///
    /// Returns `false` when there was nothing to delete.
    pub fn delete_back(&mut self, doc: &mut Document) -> bool {
        let selection = self.selection();
        let range = if selection.is_caret() {
            if selection.start == 0 {
                return false;
            }
            back_span(doc, selection.start)..selection.start
        } else {
            selection.range()
        };
        let caret = doc.replace(range, "");
        self.collapse(caret.start);
        true
    }

    /// Delete: remove the selection, or the character after the caret.
    pub fn delete_forward(&mut self, doc: &mut Document) -> bool {
        let selection = self.selection();
        let range = if selection.is_caret() {
            if selection.start >= doc.len_chars() {
                return false;
            }
            selection.start..forward_span(doc, selection.start)
        } else {
            selection.range()
        };
        let caret = doc.replace(range, "");
        self.collapse(caret.start);
        true
    }
}

/// Start of the character cluster to delete before `offset`; a CRLF pair
/// goes as one.
fn back_span(doc: &Document, offset: usize) -> usize {
    let rope = doc.rope();
    if offset >= 2 && rope.char(offset - 1) == '\n' && rope.char(offset - 2) == '\r' {
        offset - 2
    } else {
        offset - 1
    }
}

fn forward_span(doc: &Document, offset: usize) -> usize {
    let rope = doc.rope();
    if rope.char(offset) == '\r' && offset + 1 < rope.len_chars() && rope.char(offset + 1) == '\n' {
        offset + 2
    } else {
        offset + 1
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn word_left(doc: &Document, offset: usize) -> usize {
    let line = doc.line_of(offset);
    let line_start = doc.line_start(line);
    if offset == line_start {
        return if line == 0 {
            0
        } else {
            doc.line_start(line - 1) + doc.line_len(line - 1)
        };
    }
    let before: Vec<char> = doc.rope().slice(line_start..offset).chars().collect();
    let mut idx = before.len();
    while idx > 0 && before[idx - 1].is_whitespace() {
        idx -= 1;
    }
    while idx > 0 && is_word_char(before[idx - 1]) {
        idx -= 1;
    }
    if idx == before.len() {
        // Punctuation directly before the caret is skipped one character at a time.
        idx -= 1;
    }
    line_start + idx
}

fn word_right(doc: &Document, offset: usize) -> usize {
    let line = doc.line_of(offset);
    let line_end = doc.line_start(line) + doc.line_len(line);
    if offset >= line_end {
        return if line + 1 < doc.line_count() {
            doc.line_start(line + 1)
        } else {
            offset
        };
    }
    let after: Vec<char> = doc.rope().slice(offset..line_end).chars().collect();
    let mut idx = after.iter().position(|&c| !is_word_char(c)).unwrap_or(after.len());
    idx += after[idx..]
        .iter()
        .position(|&c| is_word_char(c))
        .unwrap_or(after.len() - idx);
    if idx == 0 {
        idx = 1;
    }
    offset + idx
}
