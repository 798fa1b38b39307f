//! Keyboard command table.
//!
//! Bindings are keyed by `(Scope, KeyCombo)`. When a key arrives the host
//! passes the scopes that are currently live, most specific first; the first
//! scope with a binding wins and [`Scope::Global`] is always consulted last.
//! Keys with no binding fall through to the host (typed characters in the
//! editor, find bar, or prompt).

use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Where a binding applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    /// The source pane has keyboard focus.
    Editing,
    /// The find bar is open.
    Find,
    /// A path prompt is open.
    Prompt,
    /// Only the preview is shown.
    Preview,
}

/// A key plus the modifiers that matter for dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyCombo {
    pub const fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub const fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    pub const fn alt(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::ALT)
    }

    pub const fn shift(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::SHIFT)
    }

    /// Normalise a terminal key event.
    ///
    /// Terminals disagree on how shifted keys arrive: `Shift+Tab` may come as
    /// `BackTab` with or without the shift flag, and a shifted character
    /// already carries its case. `BackTab` is reported as `Shift+Tab`, the
    /// shift flag is dropped from characters, and letters pressed with Ctrl or
    /// Alt are folded to lower case.
    pub fn from_event(key: &KeyEvent) -> Self {
        let mask = KeyModifiers::SHIFT | KeyModifiers::CONTROL | KeyModifiers::ALT;
        let mut modifiers = key.modifiers & mask;
        let code = match key.code {
            KeyCode::BackTab => {
                modifiers |= KeyModifiers::SHIFT;
                KeyCode::Tab
            }
            KeyCode::Char(c) => {
                modifiers.remove(KeyModifiers::SHIFT);
                if modifiers.is_empty() {
                    KeyCode::Char(c)
                } else {
                    KeyCode::Char(c.to_ascii_lowercase())
                }
            }
            other => other,
        };
        Self::new(code, modifiers)
    }
}

/// Every action reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    // Global
    ToggleMode,
    ToggleSplit,
    Save,
    SaveAs,
    Open,
    NewDocument,
    OpenFind,
    ToggleSync,
    Discard,
    /// Move keyboard focus to the other pane in split layout.
    SwitchPane,
    Quit,

    // Editing
    Indent,
    Outdent,
    Bold,
    Italic,
    Strikethrough,
    InlineCode,
    LineBreak,
    DeleteBack,
    DeleteForward,
    CaretLeft,
    CaretRight,
    CaretUp,
    CaretDown,
    SelectLeft,
    SelectRight,
    SelectUp,
    SelectDown,
    LineStart,
    LineEnd,
    WordLeft,
    WordRight,
    DocumentStart,
    DocumentEnd,
    PageUp,
    PageDown,

    // Find
    CloseFind,
    NextMatch,
    PreviousMatch,
    SwitchFindField,
    ReplaceCurrent,
    ReplaceAll,
    ToggleCase,

    // Prompt
    ConfirmPrompt,
    CancelPrompt,

    // Preview
    ScrollUp,
    ScrollDown,
    ScrollPageUp,
    ScrollPageDown,
    ScrollTop,
    ScrollBottom,
    FollowVisibleLink,
}

/// The command table.
#[derive(Debug, Clone)]
pub struct Keymap {
    bindings: HashMap<(Scope, KeyCombo), Command>,
}

impl Keymap {
    /// A table with no bindings.
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Bind `combo` in `scope`, returning the command it replaced.
    pub fn bind(&mut self, scope: Scope, combo: KeyCombo, command: Command) -> Option<Command> {
        self.bindings.insert((scope, combo), command)
    }

    pub fn lookup(&self, scope: Scope, combo: KeyCombo) -> Option<Command> {
        self.bindings.get(&(scope, combo)).copied()
    }

    /// Resolve a key against the live scopes, then [`Scope::Global`].
    pub fn resolve(&self, scopes: &[Scope], combo: KeyCombo) -> Option<(Scope, Command)> {
        scopes
            .iter()
            .copied()
            .filter(|scope| *scope != Scope::Global)
            .chain(std::iter::once(Scope::Global))
            .find_map(|scope| self.lookup(scope, combo).map(|command| (scope, command)))
    }

    /// All combos bound to `command`, for help text.
    pub fn combos_for(&self, command: Command) -> Vec<(Scope, KeyCombo)> {
        let mut combos: Vec<_> = self
            .bindings
            .iter()
            .filter(|(_, bound)| **bound == command)
            .map(|(key, _)| *key)
            .collect();
        combos.sort_by_key(|(scope, combo)| (*scope as u8, format!("{:?}", combo.code)));
        combos
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Default for Keymap {
    fn default() -> Self {
        use Command as C;
        use KeyCode as K;

        let ctrl = KeyModifiers::CONTROL;
        let table: &[(Scope, KeyCombo, Command)] = &[
            (Scope::Global, KeyCombo::ctrl('e'), C::ToggleMode),
            (Scope::Global, KeyCombo::ctrl('p'), C::ToggleSplit),
            (Scope::Global, KeyCombo::ctrl('s'), C::Save),
            (Scope::Global, KeyCombo::alt('s'), C::SaveAs),
            (Scope::Global, KeyCombo::ctrl('o'), C::Open),
            (Scope::Global, KeyCombo::ctrl('n'), C::NewDocument),
            (Scope::Global, KeyCombo::ctrl('f'), C::OpenFind),
            (Scope::Global, KeyCombo::alt('y'), C::ToggleSync),
            (Scope::Global, KeyCombo::ctrl('d'), C::Discard),
            (Scope::Global, KeyCombo::ctrl('q'), C::Quit),
            (Scope::Global, KeyCombo::plain(K::F(6)), C::SwitchPane),
            // Editing
            (Scope::Editing, KeyCombo::plain(K::Tab), C::Indent),
            (Scope::Editing, KeyCombo::shift(K::Tab), C::Outdent),
            (Scope::Editing, KeyCombo::ctrl('b'), C::Bold),
            (Scope::Editing, KeyCombo::alt('i'), C::Italic),
            (Scope::Editing, KeyCombo::alt('x'), C::Strikethrough),
            (Scope::Editing, KeyCombo::alt('c'), C::InlineCode),
            (Scope::Editing, KeyCombo::plain(K::Enter), C::LineBreak),
            (Scope::Editing, KeyCombo::plain(K::Backspace), C::DeleteBack),
            (Scope::Editing, KeyCombo::plain(K::Delete), C::DeleteForward),
            (Scope::Editing, KeyCombo::plain(K::Left), C::CaretLeft),
            (Scope::Editing, KeyCombo::plain(K::Right), C::CaretRight),
            (Scope::Editing, KeyCombo::plain(K::Up), C::CaretUp),
            (Scope::Editing, KeyCombo::plain(K::Down), C::CaretDown),
            (Scope::Editing, KeyCombo::shift(K::Left), C::SelectLeft),
            (Scope::Editing, KeyCombo::shift(K::Right), C::SelectRight),
            (Scope::Editing, KeyCombo::shift(K::Up), C::SelectUp),
            (Scope::Editing, KeyCombo::shift(K::Down), C::SelectDown),
            (Scope::Editing, KeyCombo::plain(K::Home), C::LineStart),
            (Scope::Editing, KeyCombo::plain(K::End), C::LineEnd),
            (Scope::Editing, KeyCombo::new(K::Left, ctrl), C::WordLeft),
            (Scope::Editing, KeyCombo::new(K::Right, ctrl), C::WordRight),
            (Scope::Editing, KeyCombo::new(K::Home, ctrl), C::DocumentStart),
            (Scope::Editing, KeyCombo::new(K::End, ctrl), C::DocumentEnd),
            (Scope::Editing, KeyCombo::plain(K::PageUp), C::PageUp),
            (Scope::Editing, KeyCombo::plain(K::PageDown), C::PageDown),
            // Find
            (Scope::Find, KeyCombo::plain(K::Esc), C::CloseFind),
            (Scope::Find, KeyCombo::plain(K::Enter), C::NextMatch),
            (Scope::Find, KeyCombo::plain(K::F(3)), C::NextMatch),
            (Scope::Find, KeyCombo::shift(K::Enter), C::PreviousMatch),
            (Scope::Find, KeyCombo::shift(K::F(3)), C::PreviousMatch),
            (Scope::Find, KeyCombo::plain(K::Tab), C::SwitchFindField),
            (Scope::Find, KeyCombo::shift(K::Tab), C::SwitchFindField),
            (Scope::Find, KeyCombo::ctrl('r'), C::ReplaceCurrent),
            (Scope::Find, KeyCombo::alt('r'), C::ReplaceAll),
            (Scope::Find, KeyCombo::alt('a'), C::ToggleCase),
            // Prompt
            (Scope::Prompt, KeyCombo::plain(K::Enter), C::ConfirmPrompt),
            (Scope::Prompt, KeyCombo::plain(K::Esc), C::CancelPrompt),
            // Preview
            (Scope::Preview, KeyCombo::plain(K::Up), C::ScrollUp),
            (Scope::Preview, KeyCombo::plain(K::Char('k')), C::ScrollUp),
            (Scope::Preview, KeyCombo::plain(K::Down), C::ScrollDown),
            (Scope::Preview, KeyCombo::plain(K::Char('j')), C::ScrollDown),
            (Scope::Preview, KeyCombo::plain(K::PageUp), C::ScrollPageUp),
            (Scope::Preview, KeyCombo::plain(K::Char('b')), C::ScrollPageUp),
            (Scope::Preview, KeyCombo::plain(K::PageDown), C::ScrollPageDown),
            (Scope::Preview, KeyCombo::plain(K::Char(' ')), C::ScrollPageDown),
            (Scope::Preview, KeyCombo::plain(K::Home), C::ScrollTop),
            (Scope::Preview, KeyCombo::plain(K::Char('g')), C::ScrollTop),
            (Scope::Preview, KeyCombo::plain(K::End), C::ScrollBottom),
            (Scope::Preview, KeyCombo::plain(K::Char('G')), C::ScrollBottom),
            (Scope::Preview, KeyCombo::plain(K::Enter), C::FollowVisibleLink),
            (Scope::Preview, KeyCombo::plain(K::Char('o')), C::FollowVisibleLink),
        ];

        let mut keymap = Self::empty();
        for &(scope, combo, command) in table {
            keymap.bind(scope, combo, command);
        }
        keymap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_global_bindings() {
        let keymap = Keymap::default();
        assert_eq!(keymap.lookup(Scope::Global, KeyCombo::ctrl('s')), Some(Command::Save));
        assert_eq!(keymap.lookup(Scope::Global, KeyCombo::alt('y')), Some(Command::ToggleSync));
        assert_eq!(keymap.lookup(Scope::Global, KeyCombo::ctrl('q')), Some(Command::Quit));
    }

    #[test]
    fn test_specific_scope_wins_over_global() {
        let mut keymap = Keymap::default();
        keymap.bind(Scope::Find, KeyCombo::ctrl('s'), Command::CloseFind);
        let resolved = keymap.resolve(&[Scope::Find, Scope::Editing], KeyCombo::ctrl('s'));
        assert_eq!(resolved, Some((Scope::Find, Command::CloseFind)));
    }

    #[test]
    fn test_global_is_consulted_last() {
        let keymap = Keymap::default();
        let resolved = keymap.resolve(&[Scope::Global, Scope::Editing], KeyCombo::ctrl('f'));
        assert_eq!(resolved, Some((Scope::Global, Command::OpenFind)));
        let resolved = keymap.resolve(&[Scope::Global, Scope::Editing], KeyCombo::ctrl('b'));
        assert_eq!(resolved, Some((Scope::Editing, Command::Bold)));
    }

    #[test]
    fn test_enter_depends_on_scope() {
        let keymap = Keymap::default();
        let enter = KeyCombo::plain(KeyCode::Enter);
        assert_eq!(
            keymap.resolve(&[Scope::Find, Scope::Editing], enter),
            Some((Scope::Find, Command::NextMatch))
        );
        assert_eq!(
            keymap.resolve(&[Scope::Editing], enter),
            Some((Scope::Editing, Command::LineBreak))
        );
    }

    #[test]
    fn test_unbound_key_resolves_to_none() {
        let keymap = Keymap::default();
        assert_eq!(keymap.resolve(&[Scope::Editing], KeyCombo::plain(KeyCode::Char('x'))), None);
    }

    #[test]
    fn test_back_tab_normalises_to_shift_tab() {
        let combo = KeyCombo::from_event(&event(KeyCode::BackTab, KeyModifiers::NONE));
        assert_eq!(combo, KeyCombo::shift(KeyCode::Tab));
        let combo = KeyCombo::from_event(&event(KeyCode::BackTab, KeyModifiers::SHIFT));
        assert_eq!(combo, KeyCombo::shift(KeyCode::Tab));
    }

    #[test]
    fn test_plain_capital_keeps_case() {
        let combo = KeyCombo::from_event(&event(KeyCode::Char('G'), KeyModifiers::SHIFT));
        assert_eq!(combo, KeyCombo::plain(KeyCode::Char('G')));
    }

    #[test]
    fn test_letters_fold_case() {
        let combo = KeyCombo::from_event(&event(KeyCode::Char('B'), KeyModifiers::CONTROL | KeyModifiers::SHIFT));
        assert_eq!(combo, KeyCombo::ctrl('b'));
    }

    #[test]
    fn test_combos_for_lists_every_binding() {
        let keymap = Keymap::default();
        let combos = keymap.combos_for(Command::NextMatch);
        assert_eq!(combos.len(), 2);
        assert!(combos.iter().all(|(scope, _)| *scope == Scope::Find));
    }

    #[test]
    fn test_rebinding_returns_previous() {
        let mut keymap = Keymap::empty();
        assert!(keymap.is_empty());
        assert_eq!(keymap.bind(Scope::Global, KeyCombo::ctrl('x'), Command::Quit), None);
        assert_eq!(
            keymap.bind(Scope::Global, KeyCombo::ctrl('x'), Command::Save),
            Some(Command::Quit)
        );
        assert_eq!(keymap.len(), 1);
    }
}
