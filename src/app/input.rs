use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use crate::app::update::WHEEL_LINES;
use crate::app::{App, Message, Model};
use crate::keymap::{KeyCombo, Scope};
use crate::sync::Side;
use crate::ui::{char_at_cell, editor_hscroll, gutter_width, pane_inner};

use super::event_loop::ResizeDebouncer;

impl App {
    pub(super) fn handle_event(
        event: Event,
        model: &Model,
        now_ms: u64,
        resize_debouncer: &mut ResizeDebouncer,
    ) -> Option<Message> {
        match event {
            Event::Key(key) => handle_key(key, model),
            Event::Mouse(mouse) => handle_mouse(mouse, model),
            Event::Paste(text) => Some(Message::Paste(text)),
            Event::Resize(width, height) => {
                tracing::trace!(width, height, "resize queued");
                resize_debouncer.queue(width, height, now_ms);
                None
            }
            _ => None,
        }
    }
}

/// Scopes live for the current model, most specific first.
pub(super) fn active_scopes(model: &Model) -> Vec<Scope> {
    if model.prompt.is_some() {
        return vec![Scope::Prompt, Scope::Global];
    }
    if model.find.is_some() {
        return vec![Scope::Find, Scope::Global];
    }
    if model.editing_focused() {
        vec![Scope::Editing, Scope::Global]
    } else {
        vec![Scope::Preview, Scope::Global]
    }
}

pub(super) fn handle_key(key: KeyEvent, model: &Model) -> Option<Message> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    let combo = KeyCombo::from_event(&key);
    if let Some((_, command)) = model.keymap.resolve(&active_scopes(model), combo) {
        return Some(Message::Command(command));
    }

    // Unbound keys fall through as text for whichever field has focus.
    let typing = !key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
    match key.code {
        KeyCode::Char(ch) if typing => {
            if model.prompt.is_some() {
                Some(Message::PromptInput(ch))
            } else if model.find.is_some() {
                Some(Message::FindInput(ch))
            } else if model.editing_focused() {
                Some(Message::InsertChar(ch))
            } else {
                None
            }
        }
        KeyCode::Backspace if model.prompt.is_some() => Some(Message::PromptBackspace),
        KeyCode::Backspace if model.find.is_some() => Some(Message::FindBackspace),
        _ => None,
    }
}

pub(super) fn handle_mouse(mouse: MouseEvent, model: &Model) -> Option<Message> {
    let areas = model.areas();
    let side = areas.side_at(mouse.column, mouse.row)?;
    let wheel = isize::try_from(WHEEL_LINES).unwrap_or(3);

    match mouse.kind {
        MouseEventKind::Moved => {
            (model.scroll_sync.active_side() != Some(side)).then_some(Message::PointerEnter(side))
        }
        MouseEventKind::ScrollUp => Some(Message::ScrollPane(side, -wheel)),
        MouseEventKind::ScrollDown => Some(Message::ScrollPane(side, wheel)),
        MouseEventKind::Down(MouseButton::Left) => {
            let inner = pane_inner(areas.pane(side)?);
            if mouse.row < inner.y
                || mouse.row >= inner.y + inner.height
                || mouse.column < inner.x
                || mouse.column >= inner.x + inner.width
            {
                return None;
            }
            let row = usize::from(mouse.row - inner.y);
            let cell = usize::from(mouse.column - inner.x);
            match side {
                Side::Raw => editor_click(model, row, cell),
                Side::Rendered => Some(Message::ClickPreview {
                    line: model.preview_view.offset() + row,
                    column: cell,
                }),
            }
        }
        _ => None,
    }
}

fn editor_click(model: &Model, row: usize, cell: usize) -> Option<Message> {
    let gutter = usize::from(gutter_width(model.document.line_count()));
    let line = model.editor_view.offset() + row;
    let text = model.document.line_text(line)?;
    let (_, caret_column) = model.cursor.line_col(&model.document);
    let skip = editor_hscroll(caret_column, model.editor_text_width());
    let column = char_at_cell(&text, skip, cell.saturating_sub(gutter));
    Some(Message::ClickEditor { line, column })
}
