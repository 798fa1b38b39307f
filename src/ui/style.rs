//! Styling for the panes.
//!
//! Uses the terminal's ANSI palette so it follows whatever colors the user
//! has configured.

use ratatui::style::{Color, Modifier, Style};

use crate::preview::{LineKind, SpanStyle};

/// Base style for a preview line.
pub fn style_for_line(kind: LineKind) -> Style {
    match kind {
        LineKind::Heading(1) => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        LineKind::Heading(2) => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
        LineKind::Heading(3) => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
        LineKind::Heading(_) => Style::default()
            .fg(Color::Blue)
            .add_modifier(Modifier::BOLD),
        LineKind::CodeBlock => Style::default().fg(Color::Indexed(245)),
        LineKind::Quote => Style::default()
            .fg(Color::Blue)
            .add_modifier(Modifier::ITALIC),
        LineKind::Rule => Style::default()
            .fg(Color::Indexed(240))
            .add_modifier(Modifier::DIM),
        LineKind::Image => Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::ITALIC),
        LineKind::Html => Style::default().add_modifier(Modifier::DIM),
        LineKind::ListItem(_) | LineKind::Table | LineKind::Paragraph | LineKind::Empty => {
            Style::default()
        }
    }
}

/// Merge inline styling into a line's base style.
pub fn style_for_span(base: Style, inline: SpanStyle) -> Style {
    let mut style = base;
    if inline.decoration {
        return style.fg(Color::DarkGray).remove_modifier(Modifier::UNDERLINED);
    }
    if inline.emphasis {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if inline.strong {
        style = style.add_modifier(Modifier::BOLD);
    }
    if inline.strikethrough {
        style = style.add_modifier(Modifier::CROSSED_OUT);
    }
    if inline.link {
        style = style.fg(Color::LightBlue).add_modifier(Modifier::UNDERLINED);
    }
    if inline.code {
        style = style.fg(Color::Red);
    }
    style
}

/// Image placeholder whose target could not be found.
pub fn broken_image() -> Style {
    Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::DIM | Modifier::CROSSED_OUT)
}

/// A search hit.
pub fn search_hit(base: Style) -> Style {
    base.bg(Color::Yellow).fg(Color::Black)
}

/// The search hit navigation currently points at.
pub fn current_hit(base: Style) -> Style {
    base.bg(Color::LightRed)
        .fg(Color::Black)
        .add_modifier(Modifier::BOLD)
}

pub fn selection() -> Style {
    Style::default().bg(Color::White).fg(Color::Black)
}

pub fn gutter() -> Style {
    Style::default().fg(Color::DarkGray)
}

/// Border of a pane, highlighted when it has keyboard focus.
pub fn pane_border(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}
