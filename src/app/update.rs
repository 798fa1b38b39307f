use crate::app::model::{ConfirmAction, FindBar, FindField, Model, Prompt, PromptKind, ToastLevel};
use crate::editor::{Direction, InlineStyle, Motion, assist};
use crate::keymap::Command;
use crate::sync::Side;

/// Lines scrolled per mouse wheel notch.
pub const WHEEL_LINES: usize = 3;

/// All possible events and actions in the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A key bound in the command table.
    Command(Command),
    /// Typed text for the editing pane.
    InsertChar(char),
    Paste(String),
    PromptInput(char),
    PromptBackspace,
    FindInput(char),
    FindBackspace,
    /// The pointer moved over a pane.
    PointerEnter(Side),
    /// Mouse wheel over a pane; negative is up.
    ScrollPane(Side, isize),
    /// Click in the editor at a buffer line and character column.
    ClickEditor { line: usize, column: usize },
    /// Click in the preview at a preview line and display column.
    ClickPreview { line: usize, column: usize },
    /// Deferred rescan and re-layout for large buffers.
    Refresh,
    Resize(u16, u16),
    Redraw,
}

impl ConfirmAction {
    const fn command(self) -> Command {
        match self {
            Self::Quit => Command::Quit,
            Self::Discard => Command::Discard,
            Self::NewDocument => Command::NewDocument,
            Self::Open => Command::Open,
        }
    }
}

/// Pure state transition. File and process side effects happen afterwards
/// in the app's effect handler.
pub fn update(mut model: Model, msg: Message) -> Model {
    // A pending confirmation only survives a repeat of the same command.
    let keeps_confirm = match (&msg, model.confirm) {
        (Message::Command(command), Some(action)) => action.command() == *command,
        (
            Message::PointerEnter(_) | Message::Refresh | Message::Resize(..) | Message::Redraw,
            _,
        ) => true,
        _ => false,
    };
    if !keeps_confirm {
        model.confirm = None;
    }

    match msg {
        Message::Command(command) => apply_command(&mut model, command),
        Message::InsertChar(ch) => {
            if model.editing_focused() {
                let mut buf = [0; 4];
                model.cursor.insert(&mut model.document, ch.encode_utf8(&mut buf));
                model.content_changed();
            }
        }
        Message::Paste(text) => {
            if let Some(prompt) = model.prompt.as_mut() {
                prompt.input.push_str(text.lines().next().unwrap_or_default());
            } else if model.find.is_some() {
                let line = text.lines().next().unwrap_or_default().to_string();
                edit_find_field(&mut model, |field| field.push_str(&line));
            } else if model.editing_focused() {
                model.cursor.insert(&mut model.document, &text);
                model.content_changed();
            }
        }
        Message::PromptInput(ch) => {
            if let Some(prompt) = model.prompt.as_mut() {
                prompt.input.push(ch);
            }
        }
        Message::PromptBackspace => {
            if let Some(prompt) = model.prompt.as_mut() {
                prompt.input.pop();
            }
        }
        Message::FindInput(ch) => edit_find_field(&mut model, |field| field.push(ch)),
        Message::FindBackspace => edit_find_field(&mut model, |field| {
            field.pop();
        }),
        Message::PointerEnter(side) => {
            if model.layout.shows(side) {
                model.scroll_sync.pointer_enter(side);
            }
        }
        Message::ScrollPane(side, delta) => {
            if model.layout.shows(side) {
                let view = model.view_mut(side);
                if delta < 0 {
                    view.scroll_up(delta.unsigned_abs());
                } else {
                    view.scroll_down(delta.unsigned_abs());
                }
                model.sync_from(side);
            }
        }
        Message::ClickEditor { line, column } => {
            model.focus_side(Side::Raw);
            let line = line.min(model.document.line_count().saturating_sub(1));
            let column = column.min(model.document.line_len(line));
            let offset = model.document.line_start(line) + column;
            model.cursor = crate::editor::Cursor::at(offset);
            model.follow_caret();
        }
        Message::ClickPreview { .. } => model.focus_side(Side::Rendered),
        Message::Refresh => model.refresh(),
        Message::Resize(width, height) => model.resize(width, height),
        Message::Redraw => {}
    }

    model
}

fn apply_command(model: &mut Model, command: Command) {
    match command {
        // Global
        Command::ToggleMode => model.set_layout(model.layout.toggled_mode()),
        Command::ToggleSplit => model.set_layout(model.layout.toggled_split()),
        Command::SaveAs => {
            let input = model
                .document
                .path()
                .map(|path| path.display().to_string())
                .unwrap_or_default();
            open_prompt(model, PromptKind::SaveAs, input);
        }
        Command::Open => {
            if confirm_if_dirty(model, ConfirmAction::Open, "open another file") {
                open_prompt(model, PromptKind::Open, String::new());
            }
        }
        Command::NewDocument => {
            if confirm_if_dirty(model, ConfirmAction::NewDocument, "start a new document") {
                model.load_document(crate::document::Document::new());
            }
        }
        Command::OpenFind => open_find(model),
        Command::ToggleSync => {
            let enabled = !model.scroll_sync.is_enabled();
            model.scroll_sync.set_enabled(enabled);
            let state = if enabled { "on" } else { "off" };
            model.show_toast(ToastLevel::Info, format!("Scroll sync {state}"));
        }
        Command::Discard => discard(model),
        Command::SwitchPane => {
            if model.layout.shows_both() {
                model.focus_side(model.focus.other());
            }
        }
        Command::Quit => {
            if confirm_if_dirty(model, ConfirmAction::Quit, "quit") {
                model.should_quit = true;
            }
        }

        // Editing
        Command::Indent => {
            let edit = assist::indent(&model.document.text(), model.cursor.selection());
            model.apply_edit(&edit);
        }
        Command::Outdent => {
            if let Some(edit) = assist::outdent(&model.document.text(), model.cursor.selection()) {
                model.apply_edit(&edit);
            }
        }
        Command::Bold => wrap(model, InlineStyle::Bold),
        Command::Italic => wrap(model, InlineStyle::Italic),
        Command::Strikethrough => wrap(model, InlineStyle::Strikethrough),
        Command::InlineCode => wrap(model, InlineStyle::Code),
        Command::LineBreak => {
            match assist::continue_list(&model.document.text(), model.cursor.selection()) {
                Some(edit) => model.apply_edit(&edit),
                None => {
                    model.cursor.insert(&mut model.document, "\n");
                    model.content_changed();
                }
            }
        }
        Command::DeleteBack => {
            if model.cursor.delete_back(&mut model.document) {
                model.content_changed();
            }
        }
        Command::DeleteForward => {
            if model.cursor.delete_forward(&mut model.document) {
                model.content_changed();
            }
        }
        Command::CaretLeft => motion(model, Motion::Step(Direction::Left), false),
        Command::CaretRight => motion(model, Motion::Step(Direction::Right), false),
        Command::CaretUp => motion(model, Motion::Step(Direction::Up), false),
        Command::CaretDown => motion(model, Motion::Step(Direction::Down), false),
        Command::SelectLeft => motion(model, Motion::Step(Direction::Left), true),
        Command::SelectRight => motion(model, Motion::Step(Direction::Right), true),
        Command::SelectUp => motion(model, Motion::Step(Direction::Up), true),
        Command::SelectDown => motion(model, Motion::Step(Direction::Down), true),
        Command::LineStart => motion(model, Motion::LineStart, false),
        Command::LineEnd => motion(model, Motion::LineEnd, false),
        Command::WordLeft => motion(model, Motion::WordLeft, false),
        Command::WordRight => motion(model, Motion::WordRight, false),
        Command::DocumentStart => motion(model, Motion::DocumentStart, false),
        Command::DocumentEnd => motion(model, Motion::DocumentEnd, false),
        Command::PageUp | Command::PageDown => {
            let page = isize::try_from(model.editor_view.height().max(1)).unwrap_or(1);
            let lines = if command == Command::PageUp { -page } else { page };
            motion(model, Motion::Lines(lines), false);
        }

        // Find
        Command::CloseFind => {
            model.find = None;
            model.reflow();
        }
        Command::NextMatch => step_match(model, true),
        Command::PreviousMatch => step_match(model, false),
        Command::SwitchFindField => {
            if let Some(find) = model.find.as_mut() {
                find.field = match find.field {
                    FindField::Pattern => FindField::Replacement,
                    FindField::Replacement => FindField::Pattern,
                };
            }
        }
        Command::ReplaceCurrent => replace_current(model),
        Command::ReplaceAll => replace_all(model),
        Command::ToggleCase => {
            let case_sensitive = !model.matches.case_sensitive();
            model.matches.set_case_sensitive(case_sensitive);
            model.matches.ensure_fresh(&model.document.text());
            model.refresh_preview_hits();
            let state = if case_sensitive { "on" } else { "off" };
            model.show_toast(ToastLevel::Info, format!("Match case {state}"));
        }

        // Prompt
        Command::CancelPrompt => {
            model.prompt = None;
            model.reflow();
        }

        // Preview
        Command::ScrollUp => scroll_preview(model, |view| view.scroll_up(1)),
        Command::ScrollDown => scroll_preview(model, |view| view.scroll_down(1)),
        Command::ScrollPageUp => scroll_preview(model, |view| view.page_up()),
        Command::ScrollPageDown => scroll_preview(model, |view| view.page_down()),
        Command::ScrollTop => scroll_preview(model, |view| view.go_to_top()),
        Command::ScrollBottom => scroll_preview(model, |view| view.go_to_bottom()),

        // Side effects only
        Command::Save | Command::ConfirmPrompt | Command::FollowVisibleLink => {}
    }
}

/// Ask once more before a destructive `action` when the buffer is dirty.
///
/// Returns true when the action should go ahead.
fn confirm_if_dirty(model: &mut Model, action: ConfirmAction, what: &str) -> bool {
    if !model.document.is_dirty() || model.confirm == Some(action) {
        model.confirm = None;
        return true;
    }
    model.confirm = Some(action);
    model.show_toast(
        ToastLevel::Warning,
        format!("Unsaved changes. Repeat to {what} anyway."),
    );
    false
}

fn discard(model: &mut Model) {
    if !model.document.is_dirty() {
        model.show_toast(ToastLevel::Info, "No changes to discard");
        return;
    }
    if model.confirm == Some(ConfirmAction::Discard) {
        model.confirm = None;
        model.document.discard();
        model.content_changed();
        tracing::info!(document = %model.document.display_name(), "changes discarded");
        model.show_toast(ToastLevel::Info, "Changes discarded");
    } else {
        model.confirm = Some(ConfirmAction::Discard);
        model.show_toast(ToastLevel::Warning, "Discard all changes? Repeat to confirm.");
    }
}

fn open_prompt(model: &mut Model, kind: PromptKind, input: String) {
    model.prompt = Some(Prompt { kind, input });
    model.reflow();
}

fn open_find(model: &mut Model) {
    let selection = model.cursor.selection();
    if !selection.is_caret() {
        let selected = model.document.slice(selection);
        if !selected.contains('\n') {
            model.matches.set_pattern(selected);
        }
    }
    if model.find.is_none() {
        model.find = Some(FindBar::default());
        model.reflow();
    }
    if let Some(find) = model.find.as_mut() {
        find.field = FindField::Pattern;
    }
    model.matches.ensure_fresh(&model.document.text());
    model.refresh_preview_hits();
}

fn edit_find_field(model: &mut Model, edit: impl FnOnce(&mut String)) {
    let Some(find) = model.find.as_mut() else {
        return;
    };
    let field = find.field;
    match field {
        FindField::Replacement => edit(&mut find.replacement),
        FindField::Pattern => {
            let mut pattern = model.matches.pattern().to_string();
            edit(&mut pattern);
            model.matches.set_pattern(pattern);
            model.matches.ensure_fresh(&model.document.text());
            model.refresh_preview_hits();
            if model.editing_focused() {
                model.select_current_match();
            } else if let Some(line) = model.find.as_ref().and_then(FindBar::current_preview_hit) {
                reveal_preview_line(model, line);
            }
        }
    }
}

fn step_match(model: &mut Model, forward: bool) {
    if model.editing_focused() {
        model.matches.ensure_fresh(&model.document.text());
        let target = if forward {
            model.matches.next_match()
        } else {
            model.matches.previous_match()
        };
        if target.is_some() {
            model.select_current_match();
        }
        return;
    }

    let Some(find) = model.find.as_mut() else {
        return;
    };
    let len = find.preview_hits.len();
    if len == 0 {
        return;
    }
    find.preview_index = Some(match (find.preview_index, forward) {
        (None, true) => 0,
        (None, false) => len - 1,
        (Some(idx), true) => (idx + 1) % len,
        (Some(idx), false) => (idx + len - 1) % len,
    });
    if let Some(line) = find.current_preview_hit() {
        reveal_preview_line(model, line);
    }
}

fn reveal_preview_line(model: &mut Model, line: usize) {
    let before = model.preview_view.offset();
    model.preview_view.ensure_visible(line);
    if model.preview_view.offset() != before {
        model.sync_from(Side::Rendered);
    }
}

fn replace_current(model: &mut Model) {
    let replacement = model
        .find
        .as_ref()
        .map(|find| find.replacement.clone())
        .unwrap_or_default();
    let text = model.document.text();
    model.matches.ensure_fresh(&text);
    if model.matches.current_index().is_none() {
        model.matches.next_match();
    }
    let Some(edit) = model.matches.replace_current(&text, &replacement) else {
        model.show_toast(ToastLevel::Info, "No matches");
        return;
    };
    model.apply_edit(&edit);
    model.matches.ensure_fresh(&model.document.text());
    // The index now names the following match.
    if model.matches.is_empty() {
        model.show_toast(ToastLevel::Info, "Last match replaced");
    } else if model.editing_focused() {
        model.select_current_match();
    }
}

fn replace_all(model: &mut Model) {
    let replacement = model
        .find
        .as_ref()
        .map(|find| find.replacement.clone())
        .unwrap_or_default();
    let (text, count) = model.matches.replace_all(&model.document.text(), &replacement);
    if count == 0 {
        model.show_toast(ToastLevel::Info, "No matches");
        return;
    }
    model.document.set_text(&text);
    model.content_changed();
    model.matches.ensure_fresh(&model.document.text());
    tracing::debug!(count, "replaced all matches");
    model.show_toast(ToastLevel::Info, format!("Replaced {count} occurrence(s)"));
}

fn wrap(model: &mut Model, style: InlineStyle) {
    let edit = assist::wrap_style(&model.document.text(), model.cursor.selection(), style);
    model.apply_edit(&edit);
}

fn motion(model: &mut Model, motion: Motion, extend: bool) {
    model.cursor.apply(&model.document, motion, extend);
    model.follow_caret();
}

fn scroll_preview(model: &mut Model, scroll: impl FnOnce(&mut crate::ui::viewport::Viewport)) {
    scroll(&mut model.preview_view);
    model.sync_from(Side::Rendered);
}
