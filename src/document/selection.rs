use std::ops::Range;

/// A span of the buffer in character offsets, always ordered.
///
/// A selection whose ends coincide is a caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    /// Build a selection from two offsets in any order.
    pub const fn new(a: usize, b: usize) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub const fn caret(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub const fn is_caret(&self) -> bool {
        self.start == self.end
    }

    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    pub const fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Clamp both ends to a buffer of `len` characters.
    #[must_use]
    pub fn clamp(self, len: usize) -> Self {
        Self::new(self.start.min(len), self.end.min(len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_orders_offsets() {
        assert_eq!(Selection::new(5, 2), Selection { start: 2, end: 5 });
    }

    #[test]
    fn test_caret_has_zero_len() {
        let caret = Selection::caret(3);
        assert!(caret.is_caret());
        assert_eq!(caret.len(), 0);
    }

    #[test]
    fn test_clamp_never_points_past_buffer() {
        assert_eq!(Selection::new(4, 12).clamp(6), Selection::new(4, 6));
        assert_eq!(Selection::new(8, 12).clamp(6), Selection::caret(6));
    }
}
