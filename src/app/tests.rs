use std::path::Path;

use tempfile::tempdir;

use crate::document::{Document, FsStore, Selection};
use crate::editor::Cursor;
use crate::keymap::Command;
use crate::sync::{LayoutMode, Side, SyncState};

use super::model::{ConfirmAction, FindField, PromptKind};
use super::{App, Message, Model, ToastLevel, update};

fn create_test_model(text: &str) -> Model {
    Model::new(Document::from_text(text, None), (80, 24))
}

fn create_long_test_model() -> Model {
    let mut md = String::new();
    for i in 1..=100 {
        md.push_str(&format!("line {i}\n\n"));
    }
    create_test_model(&md)
}

/// Run `msg` through update and the side-effect handler, as the event loop does.
fn step(model: Model, msg: Message) -> Model {
    let app = App::new(None);
    let mut model = update(model, msg.clone());
    app.handle_message_side_effects(&mut model, &msg);
    model
}

fn command(model: Model, command: Command) -> Model {
    step(model, Message::Command(command))
}

fn type_text(mut model: Model, text: &str, into: fn(char) -> Message) -> Model {
    for ch in text.chars() {
        model = step(model, into(ch));
    }
    model
}

fn toast_level(model: &Model) -> Option<ToastLevel> {
    model.active_toast().map(|(_, level)| level)
}

// --- editing ---

#[test]
fn test_typing_marks_dirty_and_updates_preview() {
    let model = create_test_model("");
    let model = type_text(model, "# Hi", Message::InsertChar);
    assert_eq!(model.document.text(), "# Hi");
    assert!(model.document.is_dirty());
    assert_eq!(model.preview.headings().len(), 1);
    assert_eq!(model.caret_position(), (1, 5));
}

#[test]
fn test_typing_ignored_when_preview_focused() {
    let model = create_test_model("text").with_layout(LayoutMode::Read);
    let model = step(model, Message::InsertChar('x'));
    assert_eq!(model.document.text(), "text");
}

#[test]
fn test_enter_continues_list() {
    let mut model = create_test_model("3. item");
    model.cursor = Cursor::at(7);
    let model = command(model, Command::LineBreak);
    assert_eq!(model.document.text(), "3. item\n4. ");
    assert_eq!(model.cursor.selection(), Selection::caret(11));
}

#[test]
fn test_enter_outside_list_inserts_break() {
    let mut model = create_test_model("plain");
    model.cursor = Cursor::at(5);
    let model = command(model, Command::LineBreak);
    assert_eq!(model.document.text(), "plain\n");
    assert_eq!(model.caret_position(), (2, 1));
}

#[test]
fn test_bold_wraps_selection() {
    let mut model = create_test_model("make bold");
    model.cursor.select(Selection::new(5, 9));
    let model = command(model, Command::Bold);
    assert_eq!(model.document.text(), "make **bold**");
    assert_eq!(model.cursor.selection(), Selection::new(7, 11));
}

#[test]
fn test_indent_then_outdent_restores_line() {
    let mut model = create_test_model("- item");
    model.cursor = Cursor::at(3);
    let model = command(model, Command::Indent);
    assert_eq!(model.document.text(), "  - item");
    let model = command(model, Command::Outdent);
    assert_eq!(model.document.text(), "- item");
    assert_eq!(model.cursor.selection(), Selection::caret(3));
}

#[test]
fn test_outdent_without_indent_is_noop() {
    let model = create_test_model("flush");
    let model = command(model, Command::Outdent);
    assert_eq!(model.document.text(), "flush");
    assert!(!model.document.is_dirty());
}

#[test]
fn test_backspace_and_delete() {
    let mut model = create_test_model("abc");
    model.cursor = Cursor::at(2);
    let model = command(model, Command::DeleteBack);
    assert_eq!(model.document.text(), "ac");
    let model = command(model, Command::DeleteForward);
    assert_eq!(model.document.text(), "a");
}

#[test]
fn test_paste_inserts_text() {
    let model = create_test_model("");
    let model = step(model, Message::Paste("hello\nworld".to_string()));
    assert_eq!(model.document.text(), "hello\nworld");
    assert_eq!(model.caret_position(), (2, 6));
}

#[test]
fn test_click_in_editor_moves_caret_and_focus() {
    let model = create_test_model("abc\ndef");
    let model = command(model, Command::SwitchPane);
    assert_eq!(model.focus, Side::Rendered);
    let model = step(model, Message::ClickEditor { line: 1, column: 2 });
    assert_eq!(model.focus, Side::Raw);
    assert_eq!(model.cursor.head(), 6);
}

#[test]
fn test_click_past_line_end_clamps() {
    let model = create_test_model("abc\ndef");
    let model = step(model, Message::ClickEditor { line: 0, column: 99 });
    assert_eq!(model.cursor.head(), 3);
}

// --- layout and focus ---

#[test]
fn test_toggle_mode_moves_focus() {
    let model = create_test_model("text");
    let model = command(model, Command::ToggleMode);
    assert_eq!(model.layout, LayoutMode::Read);
    assert_eq!(model.focus, Side::Rendered);
    assert!(!model.editing_focused());

    let model = command(model, Command::ToggleMode);
    assert_eq!(model.layout, LayoutMode::Edit);
    assert!(model.editing_focused());

    let model = command(model, Command::ToggleSplit);
    assert_eq!(model.layout, LayoutMode::Split);
}

#[test]
fn test_preview_is_laid_out_when_shown_again() {
    let model = create_test_model("first").with_layout(LayoutMode::Edit);
    let model = type_text(model, "# ", Message::InsertChar);
    assert_eq!(model.preview.line_count(), 0);
    let model = command(model, Command::ToggleSplit);
    assert_eq!(model.preview.headings().len(), 1);
}

#[test]
fn test_resize_reflows_panes() {
    let model = create_test_model("text");
    let model = step(model, Message::Resize(100, 30));
    assert_eq!(model.size(), (100, 30));
    assert_eq!(model.editor_view.height(), 27);
    assert_eq!(model.preview_view.width(), 48);
}

// --- scroll sync ---

#[test]
fn test_scrolling_editor_moves_preview_proportionally() {
    let model = create_long_test_model();
    let max_editor = model.editor_view.total_lines() - usize::from(model.editor_view.height());
    let model = step(
        model,
        Message::ScrollPane(Side::Raw, isize::try_from(max_editor / 2).unwrap()),
    );
    let max_preview = model.preview_view.total_lines() - usize::from(model.preview_view.height());
    let offset = model.preview_view.offset();
    assert!(offset.abs_diff(max_preview / 2) <= 1, "offset {offset} of {max_preview}");
}

#[test]
fn test_scrolling_preview_moves_editor() {
    let model = create_long_test_model();
    let model = step(model, Message::PointerEnter(Side::Rendered));
    let model = step(model, Message::ScrollPane(Side::Rendered, 3000));
    assert!(!model.editor_view.can_scroll_down());
}

#[test]
fn test_sync_disabled_leaves_other_pane() {
    let model = create_long_test_model();
    let model = command(model, Command::ToggleSync);
    assert!(!model.scroll_sync.is_enabled());
    let model = step(model, Message::ScrollPane(Side::Raw, 50));
    assert_eq!(model.preview_view.offset(), 0);
}

#[test]
fn test_caret_movement_syncs_after_hovering_preview() {
    let model = create_long_test_model();
    let model = step(model, Message::PointerEnter(Side::Rendered));
    let model = command(model, Command::DocumentEnd);
    assert!(model.editor_view.offset() > 0);
    assert!(model.preview_view.offset() > 0);
}

#[test]
fn test_sync_write_in_flight_blocks_reverse_sync() {
    let mut model = create_long_test_model();
    model.sync_from(Side::Raw);
    assert_eq!(model.scroll_sync.state(), SyncState::Idle);

    // A corrective write that has not finished yet.
    let source = model.editor_view.metrics();
    let target = model.preview_view.metrics();
    assert!(model.scroll_sync.on_scroll(Side::Raw, model.layout, source, target).is_some());

    model.preview_view.scroll_down(20);
    model.sync_from(Side::Rendered);
    assert_eq!(model.editor_view.offset(), 0);

    model.scroll_sync.finish();
    model.sync_from(Side::Rendered);
    assert!(model.editor_view.offset() > 0);
    assert_eq!(model.scroll_sync.state(), SyncState::Idle);
}

#[test]
fn test_preview_keys_scroll_in_read_layout() {
    let model = create_long_test_model().with_layout(LayoutMode::Read);
    let model = command(model, Command::ScrollPageDown);
    assert_eq!(model.preview_view.offset(), usize::from(model.preview_view.height()));
    let model = command(model, Command::ScrollTop);
    assert_eq!(model.preview_view.offset(), 0);
}

// --- find and replace ---

#[test]
fn test_open_find_uses_selection_as_pattern() {
    let model = create_test_model("one two one two one");
    let model = type_text(model, "xxx", |_| Message::Command(Command::SelectRight));
    let model = command(model, Command::OpenFind);
    assert!(model.find.is_some());
    assert_eq!(model.matches.pattern(), "one");
    assert_eq!(model.matches.len(), 3);
}

#[test]
fn test_next_match_cycles_and_selects() {
    let model = create_test_model("one two one two one");
    let model = command(model, Command::OpenFind);
    let model = type_text(model, "one", Message::FindInput);
    assert_eq!(model.cursor.selection(), Selection::new(0, 3));

    let model = command(model, Command::NextMatch);
    assert_eq!(model.cursor.selection(), Selection::new(8, 11));
    let model = command(model, Command::NextMatch);
    let model = command(model, Command::NextMatch);
    assert_eq!(model.cursor.selection(), Selection::new(0, 3));
    let model = command(model, Command::PreviousMatch);
    assert_eq!(model.cursor.selection(), Selection::new(16, 19));
}

#[test]
fn test_replace_current_moves_to_next_match() {
    let model = create_test_model("one two one two one");
    let model = command(model, Command::OpenFind);
    let model = type_text(model, "one", Message::FindInput);
    let model = command(model, Command::SwitchFindField);
    assert_eq!(model.find.as_ref().map(|f| f.field), Some(FindField::Replacement));
    let model = type_text(model, "1", Message::FindInput);
    assert_eq!(model.matches.pattern(), "one");

    let model = command(model, Command::ReplaceCurrent);
    assert_eq!(model.document.text(), "1 two one two one");
    assert_eq!(model.matches.len(), 2);
    assert_eq!(model.cursor.selection(), Selection::new(6, 9));
}

#[test]
fn test_replace_all_reports_count() {
    let model = create_test_model("one two one two one");
    let model = command(model, Command::OpenFind);
    let model = type_text(model, "one", Message::FindInput);
    let model = command(model, Command::SwitchFindField);
    let model = type_text(model, "1", Message::FindInput);
    let model = command(model, Command::ReplaceAll);
    assert_eq!(model.document.text(), "1 two 1 two 1");
    assert!(model.matches.is_empty());
    assert_eq!(
        model.active_toast(),
        Some(("Replaced 3 occurrence(s)", ToastLevel::Info))
    );
}

#[test]
fn test_toggle_case_rescans() {
    let model = create_test_model("One one");
    let model = command(model, Command::OpenFind);
    let model = type_text(model, "one", Message::FindInput);
    assert_eq!(model.matches.len(), 2);
    let model = command(model, Command::ToggleCase);
    assert_eq!(model.matches.len(), 1);
}

#[test]
fn test_find_backspace_edits_pattern() {
    let model = create_test_model("ab");
    let model = command(model, Command::OpenFind);
    let model = type_text(model, "abc", Message::FindInput);
    assert!(model.matches.is_empty());
    let model = step(model, Message::FindBackspace);
    assert_eq!(model.matches.pattern(), "ab");
    assert_eq!(model.matches.len(), 1);
}

#[test]
fn test_preview_find_steps_through_lines() {
    let model = create_test_model("alpha beta\n\ngamma beta\n").with_layout(LayoutMode::Read);
    let model = command(model, Command::OpenFind);
    let model = type_text(model, "beta", Message::FindInput);
    let find = model.find.as_ref().unwrap();
    assert_eq!(find.preview_hits, vec![0, 2]);
    assert_eq!(find.current_preview_hit(), Some(0));

    let model = command(model, Command::NextMatch);
    assert_eq!(model.find.as_ref().unwrap().current_preview_hit(), Some(2));
    let model = command(model, Command::NextMatch);
    assert_eq!(model.find.as_ref().unwrap().current_preview_hit(), Some(0));
}

#[test]
fn test_close_find_keeps_pattern() {
    let model = create_test_model("text");
    let model = command(model, Command::OpenFind);
    let model = type_text(model, "te", Message::FindInput);
    let model = command(model, Command::CloseFind);
    assert!(model.find.is_none());
    assert_eq!(model.matches.pattern(), "te");
}

// --- confirmations ---

#[test]
fn test_quit_when_clean() {
    let model = command(create_test_model("text"), Command::Quit);
    assert!(model.should_quit);
}

#[test]
fn test_quit_when_dirty_needs_confirmation() {
    let model = step(create_test_model(""), Message::InsertChar('x'));
    let model = command(model, Command::Quit);
    assert!(!model.should_quit);
    assert_eq!(model.confirm, Some(ConfirmAction::Quit));
    assert_eq!(toast_level(&model), Some(ToastLevel::Warning));
    let model = command(model, Command::Quit);
    assert!(model.should_quit);
}

#[test]
fn test_other_input_cancels_confirmation() {
    let model = step(create_test_model(""), Message::InsertChar('x'));
    let model = command(model, Command::Quit);
    let model = step(model, Message::InsertChar('y'));
    assert_eq!(model.confirm, None);
    let model = command(model, Command::Quit);
    assert!(!model.should_quit);
}

#[test]
fn test_pointer_motion_keeps_confirmation() {
    let model = step(create_test_model(""), Message::InsertChar('x'));
    let model = command(model, Command::Quit);
    let model = step(model, Message::PointerEnter(Side::Rendered));
    let model = command(model, Command::Quit);
    assert!(model.should_quit);
}

#[test]
fn test_discard_needs_two_presses() {
    let model = create_test_model("saved");
    let model = type_text(model, "!!", Message::InsertChar);
    let model = command(model, Command::Discard);
    assert!(model.document.is_dirty());
    let model = command(model, Command::Discard);
    assert_eq!(model.document.text(), "saved");
    assert!(!model.document.is_dirty());
    assert_eq!(model.cursor.head(), 2);
}

#[test]
fn test_discard_when_clean_only_informs() {
    let model = command(create_test_model("saved"), Command::Discard);
    assert_eq!(model.confirm, None);
    assert_eq!(toast_level(&model), Some(ToastLevel::Info));
}

#[test]
fn test_new_document_when_dirty_needs_confirmation() {
    let model = step(create_test_model("old"), Message::InsertChar('x'));
    let model = command(model, Command::NewDocument);
    assert_eq!(model.document.text(), "xold");
    let model = command(model, Command::NewDocument);
    assert_eq!(model.document.text(), "");
    assert!(model.document.path().is_none());
}

// --- large documents ---

#[test]
fn test_large_document_defers_refresh() {
    let text = "a".repeat(super::LARGE_DOCUMENT_CHARS + 1);
    let model = create_test_model(&text);
    let model = command(model, Command::OpenFind);
    let model = type_text(model, "b", Message::FindInput);
    let model = command(model, Command::CloseFind);
    let model = step(model, Message::InsertChar('b'));
    assert!(model.is_refresh_pending());
    assert!(model.matches.is_stale());

    let model = step(model, Message::Refresh);
    assert!(!model.is_refresh_pending());
    assert_eq!(model.matches.len(), 1);
}

// --- files ---

#[test]
fn test_save_writes_file_and_clears_dirty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("doc.md");
    std::fs::write(&path, "old").unwrap();
    let document = Document::open(&FsStore, &path).unwrap();

    let model = Model::new(document, (80, 24));
    let model = step(model, Message::InsertChar('x'));
    let model = command(model, Command::Save);

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "xold");
    assert!(!model.document.is_dirty());
    assert_eq!(model.active_toast(), Some(("Saved doc.md", ToastLevel::Info)));
}

#[test]
fn test_save_untitled_prompts_then_writes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("new.md");

    let model = step(create_test_model(""), Message::InsertChar('x'));
    let model = command(model, Command::Save);
    assert_eq!(model.prompt.as_ref().map(|p| p.kind), Some(PromptKind::SaveAs));

    let model = type_text(model, &path.display().to_string(), Message::PromptInput);
    let model = command(model, Command::ConfirmPrompt);
    assert!(model.prompt.is_none());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "x");
    assert_eq!(model.document.path(), Some(path.as_path()));
    assert!(!model.document.is_dirty());
}

#[test]
fn test_failed_save_keeps_state() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing").join("doc.md");
    let document = Document::from_text("text", Some(path));

    let model = Model::new(document, (80, 24));
    let model = step(model, Message::InsertChar('x'));
    let model = command(model, Command::Save);
    assert!(model.document.is_dirty());
    assert_eq!(toast_level(&model), Some(ToastLevel::Error));
}

#[test]
fn test_open_prompt_loads_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("other.md");
    std::fs::write(&path, "# Other").unwrap();

    let model = command(create_test_model("current"), Command::Open);
    assert_eq!(model.prompt.as_ref().map(|p| p.kind), Some(PromptKind::Open));
    let model = type_text(model, &path.display().to_string(), Message::PromptInput);
    let model = command(model, Command::ConfirmPrompt);
    assert_eq!(model.document.text(), "# Other");
    assert_eq!(model.preview.headings().len(), 1);
}

#[test]
fn test_open_failure_keeps_document() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.md");

    let model = command(create_test_model("current"), Command::Open);
    let model = type_text(model, &missing.display().to_string(), Message::PromptInput);
    let model = command(model, Command::ConfirmPrompt);
    assert_eq!(model.document.text(), "current");
    assert_eq!(toast_level(&model), Some(ToastLevel::Error));
}

#[test]
fn test_cancel_prompt() {
    let model = command(create_test_model(""), Command::SaveAs);
    let model = type_text(model, "abc", Message::PromptInput);
    let model = step(model, Message::PromptBackspace);
    assert_eq!(model.prompt.as_ref().map(|p| p.input.as_str()), Some("ab"));
    let model = command(model, Command::CancelPrompt);
    assert!(model.prompt.is_none());
}

// --- links ---

fn anchor_document() -> String {
    let mut md = String::from("[go](#target)\n\n");
    for _ in 0..60 {
        md.push_str("filler\n\n");
    }
    md.push_str("## Target\n\n");
    for _ in 0..60 {
        md.push_str("more\n\n");
    }
    md
}

#[test]
fn test_follow_visible_anchor_scrolls_preview() {
    let model = create_test_model(&anchor_document()).with_layout(LayoutMode::Read);
    let target = model.preview.anchor_line("target").unwrap();
    let model = command(model, Command::FollowVisibleLink);
    assert_eq!(model.preview_view.offset(), target);
}

#[test]
fn test_click_on_anchor_link() {
    let model = create_test_model(&anchor_document());
    let target = model.preview.anchor_line("target").unwrap();
    let model = step(model, Message::ClickPreview { line: 0, column: 0 });
    assert_eq!(model.focus, Side::Rendered);
    assert_eq!(model.preview_view.offset(), target);
    // Split layout: the editor follows proportionally.
    assert!(model.editor_view.offset() > 0);
}

#[test]
fn test_missing_anchor_warns() {
    let model = create_test_model("[go](#nowhere)").with_layout(LayoutMode::Read);
    let model = command(model, Command::FollowVisibleLink);
    assert_eq!(toast_level(&model), Some(ToastLevel::Warning));
}

#[test]
fn test_following_document_link_opens_it() {
    let dir = tempdir().unwrap();
    let here = dir.path().join("a.md");
    std::fs::write(&here, "[next](b.md)").unwrap();
    std::fs::write(dir.path().join("b.md"), "# B").unwrap();

    let model = Model::new(Document::open(&FsStore, &here).unwrap(), (80, 24))
        .with_layout(LayoutMode::Read);
    let model = command(model, Command::FollowVisibleLink);
    assert_eq!(model.document.text(), "# B");
    assert_eq!(
        model.document.path().and_then(Path::file_name),
        Some(std::ffi::OsStr::new("b.md"))
    );
}

#[test]
fn test_following_document_link_refused_when_dirty() {
    let dir = tempdir().unwrap();
    let here = dir.path().join("a.md");
    std::fs::write(&here, "[next](b.md)").unwrap();
    std::fs::write(dir.path().join("b.md"), "# B").unwrap();

    let model = Model::new(Document::open(&FsStore, &here).unwrap(), (80, 24));
    let model = step(model, Message::InsertChar('x'));
    let model = command(model, Command::ToggleMode);
    let model = command(model, Command::FollowVisibleLink);
    assert_eq!(model.document.text(), "x[next](b.md)");
    assert_eq!(toast_level(&model), Some(ToastLevel::Warning));
}

#[test]
fn test_local_link_without_document_path_prompts() {
    let model = create_test_model("[next](b.md)").with_layout(LayoutMode::Read);
    let model = command(model, Command::FollowVisibleLink);
    let prompt = model.prompt.as_ref().unwrap();
    assert_eq!(prompt.kind, PromptKind::Open);
    assert_eq!(prompt.input, "b.md");
}

#[test]
fn test_no_visible_links_informs() {
    let model = create_test_model("plain").with_layout(LayoutMode::Read);
    let model = command(model, Command::FollowVisibleLink);
    assert_eq!(model.active_toast(), Some(("No visible links", ToastLevel::Info)));
}
