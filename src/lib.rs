// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. sync::ScrollSync)
    clippy::module_name_repetitions
)]

//! # Marksync
//!
//! A terminal markdown editor with a scroll-synchronized preview.
//!
//! Marksync shows the raw source and its rendered form side by side:
//! - Structural editing helpers (list continuation, indent, emphasis wrap)
//! - Find and replace across both panes
//! - Proportional scroll synchronization between the panes
//! - Link following for anchors and other markdown files
//! - Standalone HTML export
//!
//! ## Architecture
//!
//! Marksync uses The Elm Architecture (TEA) pattern:
//! - **Model**: Application state
//! - **Message**: Events and actions
//! - **Update**: Pure state transitions
//! - **View**: Render to terminal
//!
//! ## Modules
//!
//! - [`app`]: Main application loop and state
//! - [`document`]: Text buffer, file store and selections
//! - [`editor`]: Caret motion and structural editing assistance
//! - [`search`]: Literal find and replace
//! - [`sync`]: Scroll synchronization between panes
//! - [`links`]: Link classification and resolution
//! - [`preview`]: Markdown to terminal lines and to HTML
//! - [`keymap`]: Command table and key bindings
//! - [`ui`]: Terminal UI components

pub mod app;
pub mod config;
pub mod document;
pub mod editor;
pub mod keymap;
pub mod links;
pub mod perf;
pub mod preview;
pub mod search;
pub mod sync;
pub mod ui;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Message, Model};
    pub use crate::document::Document;
    pub use crate::ui::viewport::Viewport;
}
