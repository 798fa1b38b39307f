//! Editing operations over the document buffer.
//!
//! [`assist`] holds the pure markdown-aware transformations (indentation,
//! list continuation, inline style wrapping); [`motion`] holds the caret
//! and the direct edits typed by the user.

pub mod assist;
mod motion;

pub use assist::InlineStyle;
pub use motion::{Cursor, Direction, Motion};
