//! The document model.
//!
//! A [`Document`] owns the live text buffer, the snapshot that was last
//! persisted, and the file the text belongs to. Dirtiness is never tracked
//! with a flag: it is derived by comparing the buffer with the snapshot, so
//! typing a character and deleting it again leaves the document clean.
//!
//! All offsets exchanged with the rest of the crate are *character* offsets.

mod selection;
mod store;

pub use selection::Selection;
pub use store::{DocumentStore, FsStore, StoreError};

use std::ops::Range;
use std::path::{Path, PathBuf};

use ropey::Rope;

/// Name shown for documents that have never been saved.
pub const UNTITLED: &str = "untitled";

/// The result of a whole-buffer transformation: the new text and the
/// selection the editing view should adopt afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub text: String,
    pub selection: Selection,
}

/// The open markdown document.
#[derive(Clone, Default)]
pub struct Document {
    text: Rope,
    saved: Rope,
    path: Option<PathBuf>,
}

impl Document {
    /// Create an empty, untitled document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clean document with the given content and identity.
    pub fn from_text(text: &str, path: Option<PathBuf>) -> Self {
        let rope = Rope::from_str(text);
        Self {
            saved: rope.clone(),
            text: rope,
            path,
        }
    }

    /// Read `path` through `store` and build a clean document from it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Read`] when the store cannot produce the text.
    pub fn open(store: &dyn DocumentStore, path: &Path) -> Result<Self, StoreError> {
        let text = store.read(path)?;
        tracing::info!(path = %path.display(), chars = text.chars().count(), "document opened");
        Ok(Self::from_text(&text, Some(path.to_path_buf())))
    }

    /// Persist the buffer to the document's own path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoPath`] for untitled documents and
    /// [`StoreError::Write`] when the store rejects the write. The document
    /// is left untouched on error.
    pub fn save(&mut self, store: &dyn DocumentStore) -> Result<(), StoreError> {
        let path = self.path.clone().ok_or(StoreError::NoPath)?;
        self.write_to(store, path)
    }

    /// Persist the buffer to `path` and adopt it as the document identity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Write`] when the store rejects the write. The
    /// previous path and snapshot are kept on error.
    pub fn save_as(&mut self, store: &dyn DocumentStore, path: &Path) -> Result<(), StoreError> {
        self.write_to(store, path.to_path_buf())
    }

    fn write_to(&mut self, store: &dyn DocumentStore, path: PathBuf) -> Result<(), StoreError> {
        store.write(&path, &self.text())?;
        tracing::info!(path = %path.display(), "document saved");
        self.saved = self.text.clone();
        self.path = Some(path);
        Ok(())
    }

    /// Throw away unsaved edits.
    pub fn discard(&mut self) {
        self.text = self.saved.clone();
        tracing::debug!("unsaved changes discarded");
    }

    pub fn is_dirty(&self) -> bool {
        self.text != self.saved
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// File name for titles and prompts.
    pub fn display_name(&self) -> String {
        self.path
            .as_deref()
            .and_then(Path::file_name)
            .map_or_else(|| UNTITLED.to_string(), |name| name.to_string_lossy().into_owned())
    }

    /// The full buffer content.
    pub fn text(&self) -> String {
        self.text.to_string()
    }

    pub const fn rope(&self) -> &Rope {
        &self.text
    }

    pub fn len_chars(&self) -> usize {
        self.text.len_chars()
    }

    /// Replace the whole buffer, e.g. with the output of a structural edit.
    pub fn set_text(&mut self, text: &str) {
        self.text = Rope::from_str(text);
    }

    /// Adopt an [`Edit`] and return its selection clamped to the new buffer.
    pub fn apply(&mut self, edit: &Edit) -> Selection {
        self.set_text(&edit.text);
        edit.selection.clamp(self.len_chars())
    }

    /// Replace the characters in `range` with `with`.
    ///
    /// The range is clamped to the buffer. Returns a caret placed right after
    /// the inserted text.
    pub fn replace(&mut self, range: Range<usize>, with: &str) -> Selection {
        let len = self.len_chars();
        let start = range.start.min(len);
        let end = range.end.clamp(start, len);
        if start < end {
            self.text.remove(start..end);
        }
        if !with.is_empty() {
            self.text.insert(start, with);
        }
        Selection::caret(start + with.chars().count())
    }

    /// Number of lines; an empty buffer has one.
    pub fn line_count(&self) -> usize {
        self.text.len_lines()
    }

    /// Line index containing the character offset.
    pub fn line_of(&self, char_idx: usize) -> usize {
        self.text.char_to_line(char_idx.min(self.len_chars()))
    }

    /// Character offset where `line` begins.
    pub fn line_start(&self, line: usize) -> usize {
        self.text.line_to_char(line.min(self.line_count().saturating_sub(1)))
    }

    /// Length of `line` in characters, excluding its line break.
    pub fn line_len(&self, line: usize) -> usize {
        if line >= self.line_count() {
            return 0;
        }
        let slice = self.text.line(line);
        let mut len = slice.len_chars();
        if len > 0 && slice.char(len - 1) == '\n' {
            len -= 1;
            if len > 0 && slice.char(len - 1) == '\r' {
                len -= 1;
            }
        }
        len
    }

    /// Content of `line` without its line break.
    pub fn line_text(&self, line: usize) -> Option<String> {
        if line >= self.line_count() {
            return None;
        }
        let start = self.text.line_to_char(line);
        Some(self.text.slice(start..start + self.line_len(line)).to_string())
    }

    /// Text covered by a selection.
    pub fn slice(&self, selection: Selection) -> String {
        let selection = selection.clamp(self.len_chars());
        self.text.slice(selection.range()).to_string()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("text", &format_args!("Rope({} chars)", self.text.len_chars()))
            .field("path", &self.path)
            .field("dirty", &self.is_dirty())
            .finish()
    }
}

/// Byte index of the `char_idx`-th character, or the string length when the
/// offset is past the end.
pub(crate) fn char_to_byte(text: &str, char_idx: usize) -> usize {
    text.char_indices().nth(char_idx).map_or(text.len(), |(byte, _)| byte)
}
