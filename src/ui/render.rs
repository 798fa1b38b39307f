use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use unicode_width::UnicodeWidthChar;

use crate::app::Model;
use crate::preview::{LineKind, PreviewLine};
use crate::search::highlight_segments;
use crate::sync::Side;

use super::{editor_hscroll, gutter_width, pane_inner, status, style};

/// Render the complete UI.
pub fn render(model: &Model, frame: &mut Frame) {
    let areas = model.areas();

    if let Some(area) = areas.editor {
        render_editor(model, frame, area);
    }
    if let Some(area) = areas.preview {
        render_preview(model, frame, area);
    }
    if let Some(bar) = areas.bar {
        if model.prompt.is_some() {
            status::render_prompt_bar(model, frame, bar);
        } else {
            status::render_find_bar(model, frame, bar);
        }
    }
    status::render_status_bar(model, frame, areas.status);
}

fn pane_block(title: String, focused: bool) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(style::pane_border(focused))
        .title(title)
}

fn render_editor(model: &Model, frame: &mut Frame, area: Rect) {
    let focused = model.editing_focused();
    frame.render_widget(pane_block(format!(" {} ", model.document.display_name()), focused), area);

    let inner = pane_inner(area);
    let gutter = gutter_width(model.document.line_count());
    let text_width = usize::from(inner.width.saturating_sub(gutter));
    let (caret_line, caret_column) = model.cursor.line_col(&model.document);
    let skip = editor_hscroll(caret_column, model.editor_text_width());
    let selection = model.cursor.selection();
    let selected = (!selection.is_caret()).then(|| selection.range());

    let mut lines = Vec::new();
    for idx in model.editor_view.visible_range() {
        let number = format!("{:>width$} ", idx + 1, width = usize::from(gutter.saturating_sub(1)));
        let mut spans = vec![Span::styled(number, style::gutter())];

        let text = model.document.line_text(idx).unwrap_or_default();
        let start = model.document.line_start(idx);
        let mut used = 0;
        let mut run = String::new();
        let mut run_selected = false;
        for (offset, ch) in text.chars().enumerate().skip(skip) {
            let ch = if ch == '\t' { ' ' } else { ch };
            let w = cell_width(ch);
            if used + w > text_width {
                break;
            }
            used += w;
            let in_selection = selected
                .as_ref()
                .is_some_and(|range| range.contains(&(start + offset)));
            if in_selection != run_selected && !run.is_empty() {
                spans.push(editor_span(std::mem::take(&mut run), run_selected));
            }
            run_selected = in_selection;
            run.push(ch);
        }
        if !run.is_empty() {
            spans.push(editor_span(run, run_selected));
        }
        lines.push(Line::from(spans));
    }
    frame.render_widget(Paragraph::new(lines), inner);

    // The prompt and find bar own the terminal cursor while open.
    if focused && model.prompt.is_none() && model.find.is_none() {
        let visible = model.editor_view.visible_range();
        if visible.contains(&caret_line) {
            let line = model.document.line_text(caret_line).unwrap_or_default();
            let before: usize = line
                .chars()
                .skip(skip)
                .take(caret_column.saturating_sub(skip))
                .map(cell_width)
                .sum();
            let row = caret_line - model.editor_view.offset();
            let x = usize::from(inner.x) + usize::from(gutter) + before;
            if let (Ok(x), Ok(row)) = (u16::try_from(x), u16::try_from(row))
                && x < inner.x + inner.width
            {
                frame.set_cursor_position((x, inner.y + row));
            }
        }
    }
}

/// Tabs are drawn as a single space.
fn cell_width(ch: char) -> usize {
    if ch == '\t' { 1 } else { ch.width().unwrap_or(0) }
}

fn editor_span(text: String, selected: bool) -> Span<'static> {
    if selected {
        Span::styled(text, style::selection())
    } else {
        Span::raw(text)
    }
}

fn render_preview(model: &Model, frame: &mut Frame, area: Rect) {
    let focused = model.layout.shows(Side::Rendered) && !model.editing_focused();
    frame.render_widget(pane_block(" preview ".to_string(), focused), area);

    let inner = pane_inner(area);
    let highlight = model
        .find
        .as_ref()
        .filter(|_| !model.matches.pattern().is_empty());
    let current_hit = highlight.and_then(|find| find.current_preview_hit());

    let lines: Vec<Line> = model
        .preview_view
        .visible_range()
        .filter_map(|idx| Some((idx, model.preview.line(idx)?)))
        .map(|(idx, line)| {
            let mut base = style::style_for_line(line.kind);
            if line.kind == LineKind::Image
                && model
                    .preview
                    .image_on_line(idx)
                    .is_some_and(|image| model.broken_images.contains(&image.src))
            {
                base = style::broken_image();
            }
            let hits = highlight.map(|_| (model.matches.pattern(), model.matches.case_sensitive()));
            preview_line(line, base, hits, current_hit == Some(idx))
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

fn preview_line(
    line: &PreviewLine,
    base: Style,
    hits: Option<(&str, bool)>,
    current: bool,
) -> Line<'static> {
    let mut spans = Vec::with_capacity(line.spans.len());
    for span in &line.spans {
        let span_style = style::style_for_span(base, span.style);
        let Some((pattern, case_sensitive)) = hits.filter(|_| !span.style.decoration) else {
            spans.push(Span::styled(span.text.clone(), span_style));
            continue;
        };
        for segment in highlight_segments(&span.text, pattern, case_sensitive) {
            let segment_style = match (segment.matched, current) {
                (false, _) => span_style,
                (true, false) => style::search_hit(span_style),
                (true, true) => style::current_hit(span_style),
            };
            spans.push(Span::styled(segment.text.to_string(), segment_style));
        }
    }
    Line::from(spans)
}
