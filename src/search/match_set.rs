use crate::document::{Edit, Selection, char_to_byte};

use super::{find_matches, replace_all};

/// The current search: pattern, options, and the matches in the buffer.
///
/// Positions are always rebuilt wholesale from `(pattern, text,
/// case_sensitive)`; they are never patched after an edit. Changing the
/// pattern or case option marks the set stale, and [`MatchSet::ensure_fresh`]
/// rescans before any navigation or replacement uses the positions.
#[derive(Debug, Clone, Default)]
pub struct MatchSet {
    pattern: String,
    case_sensitive: bool,
    positions: Vec<usize>,
    current: Option<usize>,
    stale: bool,
}

impl MatchSet {
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            case_sensitive,
            ..Self::default()
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn set_pattern(&mut self, pattern: impl Into<String>) {
        let pattern = pattern.into();
        if pattern != self.pattern {
            self.pattern = pattern;
            self.current = None;
            self.stale = true;
        }
    }

    pub const fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub const fn set_case_sensitive(&mut self, case_sensitive: bool) {
        if case_sensitive != self.case_sensitive {
            self.case_sensitive = case_sensitive;
            self.stale = true;
        }
    }

    /// Flag the positions as out of date, e.g. after a buffer edit.
    pub const fn mark_stale(&mut self) {
        self.stale = true;
    }

    pub const fn is_stale(&self) -> bool {
        self.stale
    }

    /// Rescan `text`.
    ///
    /// The current index survives when it is still in range, otherwise it
    /// resets to the first match.
    pub fn recompute(&mut self, text: &str) {
        let _scope = crate::perf::scope("search.recompute");
        self.positions = find_matches(text, &self.pattern, self.case_sensitive);
        self.stale = false;
        self.current = match self.current {
            _ if self.positions.is_empty() => None,
            Some(idx) if idx < self.positions.len() => Some(idx),
            _ => Some(0),
        };
        tracing::trace!(
            pattern = %self.pattern,
            matches = self.positions.len(),
            "search positions recomputed"
        );
    }

    /// Rescan only if something changed since the last scan.
    pub fn ensure_fresh(&mut self, text: &str) {
        if self.stale {
            self.recompute(text);
        }
    }

    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub const fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_position(&self) -> Option<usize> {
        self.positions.get(self.current?).copied()
    }

    /// Step forward circularly and return the new match start.
    pub fn next_match(&mut self) -> Option<usize> {
        let len = self.positions.len();
        if len == 0 {
            return None;
        }
        self.current = Some(self.current.map_or(0, |idx| (idx + 1) % len));
        self.current_position()
    }

    /// Step backward circularly and return the new match start.
    pub fn previous_match(&mut self) -> Option<usize> {
        let len = self.positions.len();
        if len == 0 {
            return None;
        }
        self.current = Some(self.current.map_or(len - 1, |idx| (idx + len - 1) % len));
        self.current_position()
    }

    /// The span the raw view selects for the current match.
    pub fn target_selection(&self) -> Option<Selection> {
        let start = self.current_position()?;
        Some(Selection::new(start, start + self.pattern.chars().count()))
    }

    /// Substitute the current match.
    ///
    /// The caret lands after the inserted replacement. Later offsets move by
    /// the length difference, so the caller must recompute afterwards.
    pub fn replace_current(&self, text: &str, replacement: &str) -> Option<Edit> {
        let target = self.target_selection()?;
        let start = char_to_byte(text, target.start);
        let end = char_to_byte(text, target.end);

        let mut out = String::with_capacity(text.len() + replacement.len());
        out.push_str(&text[..start]);
        out.push_str(replacement);
        out.push_str(&text[end..]);
        Some(Edit {
            text: out,
            selection: Selection::caret(target.start + replacement.chars().count()),
        })
    }

    /// Substitute every match of the pattern in `text`.
    pub fn replace_all(&self, text: &str, replacement: &str) -> (String, usize) {
        replace_all(text, &self.pattern, replacement, self.case_sensitive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn set(text: &str, pattern: &str) -> MatchSet {
        let mut matches = MatchSet::new(false);
        matches.set_pattern(pattern);
        matches.recompute(text);
        matches
    }

    #[test]
    fn test_new_set_is_empty_and_fresh() {
        let matches = MatchSet::new(false);
        assert!(matches.is_empty());
        assert!(!matches.is_stale());
        assert_eq!(matches.current_index(), None);
    }

    #[test]
    fn test_recompute_selects_first_match() {
        let matches = set("x a x b x", "x");
        assert_eq!(matches.positions(), &[0, 4, 8]);
        assert_eq!(matches.current_index(), Some(0));
    }

    #[test]
    fn test_recompute_preserves_index_in_range() {
        let mut matches = set("x x x", "x");
        matches.next_match();
        matches.recompute("x x x x");
        assert_eq!(matches.current_index(), Some(1));
    }

    #[test]
    fn test_recompute_resets_out_of_range_index() {
        let mut matches = set("x x x", "x");
        matches.previous_match();
        assert_eq!(matches.current_index(), Some(2));
        matches.recompute("x");
        assert_eq!(matches.current_index(), Some(0));
    }

    #[test]
    fn test_recompute_without_matches_clears_index() {
        let mut matches = set("x", "x");
        matches.recompute("none here");
        assert_eq!(matches.current_index(), None);
    }

    #[test]
    fn test_navigation_wraps_both_ways() {
        let mut matches = set("a a", "a");
        assert_eq!(matches.next_match(), Some(2));
        assert_eq!(matches.next_match(), Some(0));
        assert_eq!(matches.previous_match(), Some(2));
    }

    #[test]
    fn test_navigation_on_empty_set_is_noop() {
        let mut matches = set("abc", "zzz");
        assert_eq!(matches.next_match(), None);
        assert_eq!(matches.previous_match(), None);
        assert_eq!(matches.current_index(), None);
    }

    #[test]
    fn test_setters_mark_stale_only_on_change() {
        let mut matches = set("abc", "b");
        matches.set_pattern("b");
        assert!(!matches.is_stale());
        matches.set_case_sensitive(true);
        assert!(matches.is_stale());
        matches.ensure_fresh("abc");
        assert!(!matches.is_stale());
    }

    #[test]
    fn test_new_pattern_restarts_at_first_match() {
        let mut matches = set("ab ab ab", "ab");
        matches.next_match();
        matches.next_match();
        assert_eq!(matches.current_index(), Some(2));
        matches.set_pattern("b");
        matches.ensure_fresh("ab ab ab");
        assert_eq!(matches.current_index(), Some(0));
    }

    #[test]
    fn test_target_selection_spans_pattern() {
        let matches = set("find the needle", "needle");
        assert_eq!(matches.target_selection(), Some(Selection::new(9, 15)));
    }

    #[test]
    fn test_replace_current_places_caret_after_replacement() {
        let mut matches = set("cat cat", "cat");
        matches.next_match();
        let edit = matches.replace_current("cat cat", "dog!").unwrap();
        assert_eq!(edit.text, "cat dog!");
        assert_eq!(edit.selection, Selection::caret(8));
    }

    #[test]
    fn test_replace_current_then_recompute_moves_on() {
        let text = "a-a-a";
        let mut matches = set(text, "a");
        let edit = matches.replace_current(text, "b").unwrap();
        matches.recompute(&edit.text);
        assert_eq!(matches.positions(), &[2, 4]);
        assert_eq!(matches.current_position(), Some(2));
    }

    #[test]
    fn test_replace_current_without_match_is_none() {
        let matches = set("abc", "z");
        assert_eq!(matches.replace_current("abc", "y"), None);
    }

    #[test]
    fn test_replace_all_through_set() {
        let matches = set("aaa", "aa");
        assert_eq!(matches.replace_all("aaa", "b"), ("ba".to_string(), 1));
    }

    proptest! {
        #[test]
        fn prop_next_len_times_returns_to_start(text in "[ab ]{1,40}", steps in 0usize..5) {
            let mut matches = set(&text, "a");
            prop_assume!(!matches.is_empty());
            for _ in 0..steps {
                matches.next_match();
            }
            let start = matches.current_index();
            for _ in 0..matches.len() {
                matches.next_match();
            }
            prop_assert_eq!(matches.current_index(), start);
        }
    }
}
