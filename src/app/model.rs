use std::collections::HashSet;
use std::path::Path;
use std::time::{Duration, Instant};

use ratatui::layout::Rect;

use crate::document::{Document, Edit};
use crate::editor::Cursor;
use crate::keymap::Keymap;
use crate::links::{FileUrlBridge, ImageSource, LinkResolver};
use crate::preview::Preview;
use crate::search::MatchSet;
use crate::sync::{LayoutMode, ScrollSync, Side};
use crate::ui::viewport::Viewport;
use crate::ui::{PaneAreas, gutter_width, pane_areas, pane_inner};

/// Buffers above this size defer rescans and re-layout until typing pauses.
pub const LARGE_DOCUMENT_CHARS: usize = 200_000;

const TOAST_DURATION: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// Which find bar field receives typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FindField {
    #[default]
    Pattern,
    Replacement,
}

/// State of the open find bar. The pattern itself lives in the match set.
#[derive(Debug, Clone, Default)]
pub struct FindBar {
    pub field: FindField,
    pub replacement: String,
    /// Preview lines containing the pattern.
    pub preview_hits: Vec<usize>,
    pub preview_index: Option<usize>,
}

impl FindBar {
    pub fn current_preview_hit(&self) -> Option<usize> {
        self.preview_hits.get(self.preview_index?).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Open,
    SaveAs,
}

impl PromptKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::SaveAs => "Save as",
        }
    }
}

/// A one-line path prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: String,
}

/// An action waiting for its second key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    Quit,
    Discard,
    NewDocument,
    Open,
}

/// The complete application state.
pub struct Model {
    pub document: Document,
    pub cursor: Cursor,
    pub preview: Preview,
    pub editor_view: Viewport,
    pub preview_view: Viewport,
    pub layout: LayoutMode,
    /// Pane receiving keyboard input in split layout.
    pub focus: Side,
    pub scroll_sync: ScrollSync,
    pub matches: MatchSet,
    pub find: Option<FindBar>,
    pub prompt: Option<Prompt>,
    pub keymap: Keymap,
    pub confirm: Option<ConfirmAction>,
    /// Image targets in the preview that resolve to nothing.
    pub broken_images: HashSet<String>,
    pub should_quit: bool,
    refresh_pending: bool,
    size: (u16, u16),
    toast: Option<Toast>,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("document", &self.document)
            .field("layout", &self.layout)
            .field("focus", &self.focus)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::blank(Document::new(), (80, 24))
    }
}

impl Model {
    pub fn new(document: Document, size: (u16, u16)) -> Self {
        let mut model = Self::blank(document, size);
        model.scroll_sync.pointer_enter(Side::Raw);
        model.reflow();
        model.refresh();
        model
    }

    fn blank(document: Document, size: (u16, u16)) -> Self {
        Self {
            document,
            cursor: Cursor::default(),
            preview: Preview::default(),
            editor_view: Viewport::default(),
            preview_view: Viewport::default(),
            layout: LayoutMode::default(),
            focus: Side::Raw,
            scroll_sync: ScrollSync::default(),
            matches: MatchSet::new(false),
            find: None,
            prompt: None,
            keymap: Keymap::default(),
            confirm: None,
            broken_images: HashSet::new(),
            should_quit: false,
            refresh_pending: false,
            size,
            toast: None,
        }
    }

    #[must_use]
    pub fn with_layout(mut self, layout: LayoutMode) -> Self {
        self.set_layout(layout);
        self
    }

    #[must_use]
    pub fn with_sync(mut self, enabled: bool) -> Self {
        self.scroll_sync.set_enabled(enabled);
        self
    }

    #[must_use]
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.matches.set_case_sensitive(case_sensitive);
        self
    }

    pub const fn size(&self) -> (u16, u16) {
        self.size
    }

    pub fn areas(&self) -> PaneAreas {
        let bar = self.find.is_some() || self.prompt.is_some();
        pane_areas(Rect::new(0, 0, self.size.0, self.size.1), self.layout, bar)
    }

    /// Width available to editor text, after the gutter.
    pub fn editor_text_width(&self) -> u16 {
        self.areas().editor.map_or(0, |rect| {
            pane_inner(rect)
                .width
                .saturating_sub(gutter_width(self.document.line_count()))
        })
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.size = (width, height);
        self.reflow();
    }

    pub fn set_layout(&mut self, layout: LayoutMode) {
        self.layout = layout;
        if !layout.shows(self.focus) {
            self.focus_side(self.focus.other());
        }
        self.reflow();
        tracing::debug!(layout = layout.name(), "layout changed");
    }

    /// Resize both panes to the current screen, re-laying out the preview
    /// when its width changed.
    pub fn reflow(&mut self) {
        let areas = self.areas();
        let editor = areas.editor.map(pane_inner).unwrap_or_default();
        self.editor_view.resize(editor.width, editor.height);
        self.editor_view.set_total_lines(self.document.line_count());

        let preview = areas.preview.map(pane_inner).unwrap_or_default();
        let width_changed = preview.width != self.preview_view.width();
        self.preview_view.resize(preview.width, preview.height);
        if width_changed && preview.width > 0 {
            self.render_preview();
        }
    }

    /// The buffer changed: clamp the caret and rescan, now or once typing
    /// settles for large documents.
    pub fn content_changed(&mut self) {
        self.cursor.clamp(self.document.len_chars());
        self.matches.mark_stale();
        self.editor_view.set_total_lines(self.document.line_count());
        if self.document.len_chars() > LARGE_DOCUMENT_CHARS {
            self.refresh_pending = true;
        } else {
            self.refresh();
        }
        self.follow_caret();
    }

    pub const fn is_refresh_pending(&self) -> bool {
        self.refresh_pending
    }

    /// Bring matches and preview up to date with the buffer.
    pub fn refresh(&mut self) {
        self.refresh_pending = false;
        self.matches.ensure_fresh(&self.document.text());
        self.render_preview();
    }

    fn render_preview(&mut self) {
        // Hidden preview is laid out when it next gets a width.
        let width = self.preview_view.width();
        self.preview = if width == 0 {
            Preview::default()
        } else {
            Preview::render(&self.document.text(), width)
        };
        self.preview_view.set_total_lines(self.preview.line_count());
        self.collect_broken_images();
        self.refresh_preview_hits();
    }

    fn collect_broken_images(&mut self) {
        let resolver = LinkResolver::new(self.document.path());
        let exists = |path: &str| Path::new(path).exists();
        self.broken_images = self
            .preview
            .images()
            .iter()
            .filter(|image| {
                matches!(
                    resolver.image_source(&image.src, &FileUrlBridge, &exists),
                    ImageSource::Broken(_)
                )
            })
            .map(|image| image.src.clone())
            .collect();
    }

    pub fn refresh_preview_hits(&mut self) {
        let Some(find) = self.find.as_mut() else {
            return;
        };
        find.preview_hits = self
            .preview
            .find_lines(self.matches.pattern(), self.matches.case_sensitive());
        find.preview_index = match find.preview_index {
            _ if find.preview_hits.is_empty() => None,
            Some(idx) if idx < find.preview_hits.len() => Some(idx),
            _ => Some(0),
        };
    }

    /// Replace the whole buffer with `edit` and adopt its selection.
    pub fn apply_edit(&mut self, edit: &Edit) {
        let selection = self.document.apply(edit);
        self.cursor.select(selection);
        self.content_changed();
    }

    /// Swap in another document, resetting per-document state.
    pub fn load_document(&mut self, document: Document) {
        tracing::info!(document = %document.display_name(), "document loaded");
        self.document = document;
        self.cursor = Cursor::default();
        self.confirm = None;
        self.editor_view.go_to_top();
        self.preview_view.go_to_top();
        self.matches.mark_stale();
        self.reflow();
        self.refresh();
    }

    /// Whether keys go to the editing pane.
    pub const fn editing_focused(&self) -> bool {
        match self.layout {
            LayoutMode::Edit => true,
            LayoutMode::Read => false,
            LayoutMode::Split => matches!(self.focus, Side::Raw),
        }
    }

    pub fn focus_side(&mut self, side: Side) {
        self.focus = side;
        self.scroll_sync.pointer_enter(side);
    }

    pub const fn view(&self, side: Side) -> &Viewport {
        match side {
            Side::Raw => &self.editor_view,
            Side::Rendered => &self.preview_view,
        }
    }

    pub const fn view_mut(&mut self, side: Side) -> &mut Viewport {
        match side {
            Side::Raw => &mut self.editor_view,
            Side::Rendered => &mut self.preview_view,
        }
    }

    /// `side` scrolled: let the controller align the other pane.
    pub fn sync_from(&mut self, side: Side) {
        // Every scroll the app performs is driven by the user on `side`, so
        // the active-side check always passes here. Feedback is stopped by
        // the Syncing state instead: the corrective write below never comes
        // back through `sync_from`.
        self.scroll_sync.pointer_enter(side);
        let source = self.view(side).metrics();
        let target = self.view(side.other()).metrics();
        if let Some(offset) = self.scroll_sync.on_scroll(side, self.layout, source, target) {
            self.view_mut(side.other()).set_offset(offset);
            self.scroll_sync.finish();
        }
    }

    /// Keep the caret's line on screen, syncing if that scrolled.
    pub fn follow_caret(&mut self) {
        let line = self.document.line_of(self.cursor.head());
        let before = self.editor_view.offset();
        self.editor_view.ensure_visible(line);
        if self.editor_view.offset() != before {
            self.sync_from(Side::Raw);
        }
    }

    /// Select the current match in the editor.
    pub fn select_current_match(&mut self) {
        if let Some(selection) = self.matches.target_selection() {
            self.cursor.select(selection);
            self.follow_caret();
        }
    }

    /// One-based caret line and column.
    pub fn caret_position(&self) -> (usize, usize) {
        let (line, col) = self.cursor.line_col(&self.document);
        (line + 1, col + 1)
    }

    pub fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + TOAST_DURATION,
        });
    }

    pub(super) fn expire_toast(&mut self, now: Instant) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .map(|toast| (toast.message.as_str(), toast.level))
    }
}
