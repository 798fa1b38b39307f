//! Application state and main event loop.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete application state
//! - [`Message`]: All possible events and actions
//! - [`update`]: Pure function for state transitions
//! - [`App::run`]: Main event loop with rendering
//!
//! File access, link following and other process effects run after each
//! `update`, keyed by the message that caused them.

mod effects;
mod event_loop;
mod input;
mod model;
mod update;

pub use effects::export_html;
pub use model::{
    ConfirmAction, FindBar, FindField, LARGE_DOCUMENT_CHARS, Model, Prompt, PromptKind, ToastLevel,
};
pub use update::{Message, WHEEL_LINES, update};

use std::path::PathBuf;

use crate::sync::LayoutMode;

/// Main application struct that owns the terminal and runs the event loop.
#[derive(Debug, Default)]
pub struct App {
    file_path: Option<PathBuf>,
    layout: LayoutMode,
    sync_enabled: bool,
    case_sensitive: bool,
    startup_warning: Option<String>,
}

impl App {
    /// Create an application editing `file_path`, or a new untitled document.
    pub fn new(file_path: Option<PathBuf>) -> Self {
        Self {
            file_path,
            sync_enabled: true,
            ..Self::default()
        }
    }

    /// Set the initial pane layout.
    #[must_use]
    pub const fn with_layout(mut self, layout: LayoutMode) -> Self {
        self.layout = layout;
        self
    }

    /// Enable or disable scroll synchronization.
    #[must_use]
    pub const fn with_sync(mut self, enabled: bool) -> Self {
        self.sync_enabled = enabled;
        self
    }

    #[must_use]
    pub const fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }
}

#[cfg(test)]
mod tests;
