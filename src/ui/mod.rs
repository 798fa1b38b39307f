//! Terminal UI.
//!
//! - [`viewport`]: scroll position of each pane
//! - [`style`]: fixed styling for preview lines and search hits
//!
//! Pane geometry lives here so the model (for re-layout) and the input
//! handler (for mouse hit testing) agree with what gets drawn.

pub mod style;
pub mod viewport;

mod render;
mod status;

pub use render::render;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use unicode_width::UnicodeWidthChar;

use crate::sync::{LayoutMode, Side};

/// Where each part of the screen goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaneAreas {
    pub editor: Option<Rect>,
    pub preview: Option<Rect>,
    /// Find bar or prompt row.
    pub bar: Option<Rect>,
    pub status: Rect,
}

impl PaneAreas {
    pub const fn pane(&self, side: Side) -> Option<Rect> {
        match side {
            Side::Raw => self.editor,
            Side::Rendered => self.preview,
        }
    }

    /// The pane containing a screen position.
    pub fn side_at(&self, column: u16, row: u16) -> Option<Side> {
        let hit = |rect: Option<Rect>| {
            rect.is_some_and(|r| {
                column >= r.x && column < r.x + r.width && row >= r.y && row < r.y + r.height
            })
        };
        if hit(self.editor) {
            Some(Side::Raw)
        } else if hit(self.preview) {
            Some(Side::Rendered)
        } else {
            None
        }
    }
}

/// Split the screen for `layout`, reserving a bar row when `bar` is set.
pub fn pane_areas(area: Rect, layout: LayoutMode, bar: bool) -> PaneAreas {
    let footer = 1 + u16::from(bar);
    let main = Rect {
        height: area.height.saturating_sub(footer),
        ..area
    };
    let status = Rect {
        y: area.y + area.height.saturating_sub(1),
        height: 1.min(area.height),
        ..area
    };
    let bar = bar.then(|| Rect {
        y: area.y + area.height.saturating_sub(2),
        height: 1.min(area.height.saturating_sub(1)),
        ..area
    });

    let (editor, preview) = match layout {
        LayoutMode::Edit => (Some(main), None),
        LayoutMode::Read => (None, Some(main)),
        LayoutMode::Split => {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(main);
            (Some(columns[0]), Some(columns[1]))
        }
    };

    PaneAreas {
        editor,
        preview,
        bar,
        status,
    }
}

/// Content area of a bordered pane.
pub const fn pane_inner(rect: Rect) -> Rect {
    Rect {
        x: rect.x.saturating_add(1),
        y: rect.y.saturating_add(1),
        width: rect.width.saturating_sub(2),
        height: rect.height.saturating_sub(2),
    }
}

/// Width of the editor's line-number gutter, including its trailing space.
pub const fn gutter_width(total_lines: usize) -> u16 {
    let mut digits = 1;
    let mut n = total_lines;
    while n >= 10 {
        digits += 1;
        n /= 10;
    }
    digits + 1
}

/// Characters hidden to the left of every editor line so the caret column
/// stays inside `width`.
pub const fn editor_hscroll(caret_column: usize, width: u16) -> usize {
    let width = width as usize;
    if width == 0 || caret_column < width {
        0
    } else {
        caret_column + 1 - width
    }
}

/// Character index within `line` shown at screen `cell`, after skipping
/// `skip` characters. Clicks past the end land on the end.
pub fn char_at_cell(line: &str, skip: usize, cell: usize) -> usize {
    let mut used = 0;
    let mut idx = skip;
    for ch in line.chars().skip(skip) {
        let w = if ch == '\t' { 1 } else { ch.width().unwrap_or(0) };
        if used + w > cell {
            return idx;
        }
        used += w;
        idx += 1;
    }
    idx
}
