//! End-to-end editing sessions against real files.

use marksync::app::{Message, Model, update};
use marksync::document::{Document, FsStore, Selection, StoreError};
use marksync::editor::{Cursor, assist};
use marksync::keymap::Command;
use marksync::search::MatchSet;
use tempfile::tempdir;

#[test]
fn test_edit_save_reopen_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.md");
    std::fs::write(&path, "- first").unwrap();

    let mut doc = Document::open(&FsStore, &path).unwrap();
    assert!(!doc.is_dirty());

    let edit = assist::continue_list(&doc.text(), Selection::caret(doc.len_chars())).unwrap();
    let selection = doc.apply(&edit);
    let mut cursor = Cursor::at(selection.start);
    cursor.insert(&mut doc, "second");
    assert!(doc.is_dirty());

    doc.save(&FsStore).unwrap();
    assert!(!doc.is_dirty());

    let reopened = Document::open(&FsStore, &path).unwrap();
    assert_eq!(reopened.text(), "- first\n- second");
}

#[test]
fn test_undoing_an_edit_by_hand_leaves_document_clean() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("clean.md");
    std::fs::write(&path, "text").unwrap();

    let mut doc = Document::open(&FsStore, &path).unwrap();
    let mut cursor = Cursor::at(4);
    cursor.insert(&mut doc, "!");
    assert!(doc.is_dirty());
    assert!(cursor.delete_back(&mut doc));
    assert!(!doc.is_dirty());
}

#[test]
fn test_save_as_into_missing_directory_keeps_old_identity() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("keep.md");
    std::fs::write(&path, "body").unwrap();

    let mut doc = Document::open(&FsStore, &path).unwrap();
    doc.set_text("changed");
    let err = doc
        .save_as(&FsStore, &dir.path().join("nowhere").join("new.md"))
        .unwrap_err();
    assert!(matches!(err, StoreError::Write { .. }));
    assert_eq!(doc.path(), Some(path.as_path()));
    assert!(doc.is_dirty());
}

#[test]
fn test_replace_all_then_save() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("replace.md");
    std::fs::write(&path, "Cat and cat and CAT").unwrap();

    let mut doc = Document::open(&FsStore, &path).unwrap();
    let mut matches = MatchSet::new(false);
    matches.set_pattern("cat");
    matches.recompute(&doc.text());
    assert_eq!(matches.len(), 3);

    let (text, count) = matches.replace_all(&doc.text(), "dog");
    assert_eq!(count, 3);
    doc.set_text(&text);
    doc.save(&FsStore).unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "dog and dog and dog");
}

#[test]
fn test_model_session_typing_and_saving() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("typed.md");
    let doc = Document::from_text("", Some(path.clone()));
    let mut model = Model::new(doc, (80, 24));

    for ch in "# Title".chars() {
        model = update(model, Message::InsertChar(ch));
    }
    model = update(model, Message::Command(Command::LineBreak));
    assert_eq!(model.document.text(), "# Title\n");
    assert!(model.preview.anchor_line("title").is_some());

    model.document.save(&FsStore).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Title\n");
    assert!(!model.document.is_dirty());
}
