use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::{FindField, Model, ToastLevel};

pub fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    if let Some((message, level)) = model.active_toast() {
        render_toast(message, level, frame, area);
        return;
    }

    let dirty = if model.document.is_dirty() { " *" } else { "" };
    let (line, column) = model.caret_position();
    let sync = if model.scroll_sync.is_enabled() {
        "sync"
    } else {
        "nosync"
    };
    let matches = if model.find.is_some() && !model.matches.pattern().is_empty() {
        match model.matches.current_index() {
            Some(idx) => format!("  [{}/{}]", idx + 1, model.matches.len()),
            None => "  [no matches]".to_string(),
        }
    } else {
        String::new()
    };
    let pending = if model.is_refresh_pending() {
        "  [updating]"
    } else {
        ""
    };

    let status = format!(
        " {}{dirty}  [{}] [{sync}]  Ln {line}, Col {column}  [{}%]{matches}{pending}",
        model.document.display_name(),
        model.layout.name(),
        model.preview_view.scroll_percent(),
    );
    let bar = Paragraph::new(status).style(Style::default().bg(Color::DarkGray).fg(Color::White));
    frame.render_widget(bar, area);
}

fn render_toast(message: &str, level: ToastLevel, frame: &mut Frame, area: Rect) {
    let (prefix, style) = match level {
        ToastLevel::Info => ("[info]", Style::default().bg(Color::DarkGray).fg(Color::White)),
        ToastLevel::Warning => ("[warn]", Style::default().bg(Color::Yellow).fg(Color::Black)),
        ToastLevel::Error => ("[error]", Style::default().bg(Color::Red).fg(Color::White)),
    };
    let bar = Paragraph::new(format!(" {prefix} {message}")).style(style);
    frame.render_widget(bar, area);
}

pub fn render_find_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some(find) = model.find.as_ref() else {
        return;
    };
    let active = Style::default().fg(Color::Black).bg(Color::White);
    let idle = Style::default().fg(Color::White).bg(Color::Blue);
    let (pattern_style, replacement_style) = match find.field {
        FindField::Pattern => (active, idle),
        FindField::Replacement => (idle, active),
    };
    let case = if model.matches.case_sensitive() {
        "Aa"
    } else {
        "aa"
    };

    let line = Line::from(vec![
        Span::styled(" Find: ", idle),
        Span::styled(format!("{} ", model.matches.pattern()), pattern_style),
        Span::styled(" Replace: ", idle),
        Span::styled(format!("{} ", find.replacement), replacement_style),
        Span::styled(format!("  [{case}]  Tab: field  Ctrl+R: replace  Alt+R: all"), idle),
    ]);
    frame.render_widget(Paragraph::new(line).style(idle), area);
}

pub fn render_prompt_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some(prompt) = model.prompt.as_ref() else {
        return;
    };
    let text = format!(" {}: {}", prompt.kind.label(), prompt.input);
    let cursor_x = area
        .x
        .saturating_add(u16::try_from(unicode_width::UnicodeWidthStr::width(text.as_str())).unwrap_or(u16::MAX));
    let bar = Paragraph::new(text).style(Style::default().bg(Color::Blue).fg(Color::White));
    frame.render_widget(bar, area);
    if cursor_x < area.x + area.width {
        frame.set_cursor_position((cursor_x, area.y));
    }
}
