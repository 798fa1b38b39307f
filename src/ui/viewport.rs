//! Scroll position of one pane.
//!
//! A [`Viewport`] counts in rows: the editor pane in source lines, the
//! preview pane in laid-out preview lines. [`Viewport::metrics`] exposes the
//! position in the shape the scroll sync controller works with.

use std::ops::Range;

use crate::sync::ScrollMetrics;

/// The visible window over a pane's rows.
///
/// # Example
///
/// ```
/// use marksync::ui::viewport::Viewport;
///
/// let mut vp = Viewport::new(80, 24, 100);
/// assert_eq!(vp.visible_range(), 0..24);
///
/// vp.scroll_down(10);
/// assert_eq!(vp.visible_range(), 10..34);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Viewport {
    width: u16,
    height: u16,
    offset: usize,
    total_lines: usize,
}

impl Viewport {
    pub const fn new(width: u16, height: u16, total_lines: usize) -> Self {
        Self {
            width,
            height,
            offset: 0,
            total_lines,
        }
    }

    pub const fn offset(&self) -> usize {
        self.offset
    }

    pub const fn width(&self) -> u16 {
        self.width
    }

    pub const fn height(&self) -> u16 {
        self.height
    }

    pub const fn total_lines(&self) -> usize {
        self.total_lines
    }

    /// Rows on screen, clamped to the content.
    pub fn visible_range(&self) -> Range<usize> {
        let start = self.offset;
        let end = (self.offset + self.height as usize).min(self.total_lines);
        start..end
    }

    /// Position through the scrollable travel, 0-100.
    pub fn scroll_percent(&self) -> u8 {
        let max_offset = self.max_offset();
        if max_offset == 0 {
            return 100;
        }

        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        {
            ((self.offset as f64 / max_offset as f64) * 100.0).round() as u8
        }
    }

    pub const fn can_scroll_up(&self) -> bool {
        self.offset > 0
    }

    pub const fn can_scroll_down(&self) -> bool {
        self.offset < self.max_offset()
    }

    pub const fn scroll_up(&mut self, n: usize) {
        self.offset = self.offset.saturating_sub(n);
    }

    pub fn scroll_down(&mut self, n: usize) {
        self.offset = (self.offset + n).min(self.max_offset());
    }

    pub const fn page_up(&mut self) {
        self.scroll_up(self.height as usize);
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.height as usize);
    }

    pub const fn go_to_top(&mut self) {
        self.offset = 0;
    }

    pub const fn go_to_bottom(&mut self) {
        self.offset = self.max_offset();
    }

    /// Put `line` at the top of the pane, as far as the content allows.
    pub fn go_to_line(&mut self, line: usize) {
        self.offset = line.min(self.max_offset());
    }

    /// Scroll the least amount that brings `line` on screen.
    pub fn ensure_visible(&mut self, line: usize) {
        let height = (self.height as usize).max(1);
        if line < self.offset {
            self.offset = line;
        } else if line >= self.offset + height {
            self.offset = (line + 1 - height).min(self.max_offset());
        }
    }

    /// Current position as sync metrics, one unit per row.
    #[allow(clippy::cast_precision_loss)]
    pub fn metrics(&self) -> ScrollMetrics {
        ScrollMetrics::new(
            self.offset as f64,
            self.total_lines as f64,
            f64::from(self.height),
        )
    }

    /// Apply an offset computed by the sync controller.
    pub fn set_offset(&mut self, offset: f64) {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let rows = offset.max(0.0).round() as usize;
        self.offset = rows.min(self.max_offset());
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.offset = self.offset.min(self.max_offset());
    }

    /// Update the content length after an edit or re-layout.
    pub fn set_total_lines(&mut self, total: usize) {
        self.total_lines = total;
        self.offset = self.offset.min(self.max_offset());
    }

    const fn max_offset(&self) -> usize {
        self.total_lines.saturating_sub(self.height as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_range_with_short_content() {
        let vp = Viewport::new(80, 24, 10);
        assert_eq!(vp.visible_range(), 0..10);
        assert!(!vp.can_scroll_down());
    }

    #[test]
    fn test_scroll_down_clamps_to_max() {
        let mut vp = Viewport::new(80, 24, 100);
        vp.scroll_down(500);
        assert_eq!(vp.offset(), 76);
        assert_eq!(vp.scroll_percent(), 100);
    }

    #[test]
    fn test_page_up_and_down() {
        let mut vp = Viewport::new(80, 20, 100);
        vp.page_down();
        assert_eq!(vp.offset(), 20);
        vp.page_up();
        assert_eq!(vp.offset(), 0);
        assert!(!vp.can_scroll_up());
    }

    #[test]
    fn test_go_to_line_and_bottom() {
        let mut vp = Viewport::new(80, 10, 50);
        vp.go_to_line(45);
        assert_eq!(vp.offset(), 40);
        vp.go_to_top();
        vp.go_to_bottom();
        assert_eq!(vp.offset(), 40);
    }

    #[test]
    fn test_ensure_visible_scrolls_minimally() {
        let mut vp = Viewport::new(80, 10, 100);
        vp.ensure_visible(5);
        assert_eq!(vp.offset(), 0);
        vp.ensure_visible(15);
        assert_eq!(vp.offset(), 6);
        vp.ensure_visible(3);
        assert_eq!(vp.offset(), 3);
    }

    #[test]
    fn test_metrics_reflect_rows() {
        let mut vp = Viewport::new(80, 10, 110);
        vp.scroll_down(50);
        let metrics = vp.metrics();
        assert!((metrics.offset - 50.0).abs() < f64::EPSILON);
        assert!((metrics.max_extent() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_set_offset_rounds_and_clamps() {
        let mut vp = Viewport::new(80, 10, 30);
        vp.set_offset(7.6);
        assert_eq!(vp.offset(), 8);
        vp.set_offset(99.0);
        assert_eq!(vp.offset(), 20);
        vp.set_offset(-3.0);
        assert_eq!(vp.offset(), 0);
    }

    #[test]
    fn test_shrinking_content_pulls_offset_back() {
        let mut vp = Viewport::new(80, 24, 100);
        vp.scroll_down(80);
        vp.set_total_lines(50);
        assert_eq!(vp.offset(), 26);
        vp.resize(80, 50);
        assert_eq!(vp.offset(), 0);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn scroll_never_exceeds_bounds(
                total_lines in 1..10000usize,
                height in 1..100u16,
                scroll_amount in 0..10000usize,
            ) {
                let mut vp = Viewport::new(80, height, total_lines);
                vp.scroll_down(scroll_amount);
                prop_assert!(vp.offset() <= total_lines.saturating_sub(height as usize));
            }

            #[test]
            fn ensure_visible_puts_line_on_screen(
                total_lines in 1..5000usize,
                height in 1..100u16,
                line_seed in 0..5000usize,
            ) {
                let line = line_seed % total_lines;
                let mut vp = Viewport::new(80, height, total_lines);
                vp.ensure_visible(line);
                prop_assert!(vp.visible_range().contains(&line));
            }
        }
    }
}
