//! The rendered side of the editor.
//!
//! The buffer is parsed with comrak and laid out into terminal lines for the
//! preview pane ([`Preview::render`]), or rendered to a standalone HTML page
//! ([`html::render_html`]) with link targets resolved, local images passed
//! through an asset bridge, and search hits wrapped in `<mark>`.

pub mod html;
mod lines;

use std::ops::Range;

use comrak::Options;

use crate::links::anchor_slug;

/// Inline styling carried by a preview span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpanStyle {
    pub emphasis: bool,
    pub strong: bool,
    pub code: bool,
    pub strikethrough: bool,
    pub link: bool,
    /// Structural decoration (list markers, quote bars, frames).
    pub decoration: bool,
}

/// A run of uniformly styled text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewSpan {
    pub text: String,
    pub style: SpanStyle,
    /// Link target when the span is part of a link.
    pub target: Option<String>,
}

impl PreviewSpan {
    pub fn new(text: impl Into<String>, style: SpanStyle) -> Self {
        Self {
            text: text.into(),
            style,
            target: None,
        }
    }

    pub fn decoration(text: impl Into<String>) -> Self {
        Self::new(
            text,
            SpanStyle {
                decoration: true,
                ..SpanStyle::default()
            },
        )
    }
}

/// What a preview line shows, used for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Paragraph,
    Heading(u8),
    CodeBlock,
    Quote,
    ListItem(usize),
    Table,
    Rule,
    Image,
    Html,
    Empty,
}

/// One terminal row of the preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewLine {
    pub kind: LineKind,
    pub spans: Vec<PreviewSpan>,
}

impl PreviewLine {
    pub const fn empty() -> Self {
        Self {
            kind: LineKind::Empty,
            spans: Vec::new(),
        }
    }

    /// The plain text of the line.
    pub fn content(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingRef {
    pub level: u8,
    pub text: String,
    pub slug: String,
    pub line: usize,
}

/// A link as laid out: one record per preview line it occupies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRef {
    pub text: String,
    pub url: String,
    pub line: usize,
    /// Display columns the link covers on its line.
    pub columns: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub alt: String,
    pub src: String,
    pub line: usize,
}

/// Laid-out preview of a markdown buffer.
#[derive(Debug, Clone, Default)]
pub struct Preview {
    lines: Vec<PreviewLine>,
    headings: Vec<HeadingRef>,
    links: Vec<LinkRef>,
    images: Vec<ImageRef>,
    width: u16,
}

impl Preview {
    /// Lay out `source` for a pane `width` columns wide.
    pub fn render(source: &str, width: u16) -> Self {
        let _scope = crate::perf::scope("preview.render");
        let laid_out = lines::layout(source, width.max(1) as usize);
        Self {
            lines: laid_out.lines,
            headings: laid_out.headings,
            links: laid_out.links,
            images: laid_out.images,
            width,
        }
    }

    pub const fn width(&self) -> u16 {
        self.width
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn lines(&self) -> &[PreviewLine] {
        &self.lines
    }

    pub fn line(&self, idx: usize) -> Option<&PreviewLine> {
        self.lines.get(idx)
    }

    pub fn headings(&self) -> &[HeadingRef] {
        &self.headings
    }

    pub fn links(&self) -> &[LinkRef] {
        &self.links
    }

    pub fn images(&self) -> &[ImageRef] {
        &self.images
    }

    /// Line of the heading whose slug matches `anchor`.
    pub fn anchor_line(&self, anchor: &str) -> Option<usize> {
        let wanted = anchor_slug(anchor);
        if wanted.is_empty() {
            return None;
        }
        self.headings
            .iter()
            .find(|heading| heading.slug == wanted)
            .map(|heading| heading.line)
    }

    /// Lines with a hit the renderer can highlight, in order.
    ///
    /// Matches are looked for span by span and never in decoration such as
    /// list markers or table rules, the same way hits are highlighted.
    pub fn find_lines(&self, pattern: &str, case_sensitive: bool) -> Vec<usize> {
        let Some(regex) = crate::search::literal_regex(pattern, case_sensitive) else {
            return Vec::new();
        };
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, line)| {
                line.spans
                    .iter()
                    .any(|span| !span.style.decoration && regex.is_match(&span.text))
            })
            .map(|(idx, _)| idx)
            .collect()
    }

    /// The link under a display column, if any.
    pub fn link_at(&self, line: usize, column: usize) -> Option<&LinkRef> {
        self.links
            .iter()
            .find(|link| link.line == line && link.columns.contains(&column))
    }

    /// Links laid out within `range`, in document order.
    pub fn links_in(&self, range: Range<usize>) -> impl Iterator<Item = &LinkRef> {
        self.links
            .iter()
            .filter(move |link| range.contains(&link.line))
    }

    pub fn image_on_line(&self, line: usize) -> Option<&ImageRef> {
        self.images.iter().find(|image| image.line == line)
    }
}

/// Parser options shared by the preview and HTML export.
pub(crate) fn markdown_options() -> Options {
    let mut options = Options::default();

    // GFM extensions
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;
    options.extension.header_ids = Some(String::new());

    options
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_records_headings_with_slugs() {
        let preview = Preview::render("# Getting Started\n\ntext\n\n## API v2", 80);
        let slugs: Vec<_> = preview.headings().iter().map(|h| h.slug.as_str()).collect();
        assert_eq!(slugs, vec!["getting-started", "api-v2"]);
        assert_eq!(preview.anchor_line("API v2"), Some(preview.headings()[1].line));
    }

    #[test]
    fn test_anchor_line_unknown_is_none() {
        let preview = Preview::render("# One", 80);
        assert_eq!(preview.anchor_line("two"), None);
        assert_eq!(preview.anchor_line(""), None);
    }

    #[test]
    fn test_find_lines_matches_rendered_text() {
        let preview = Preview::render("Some **bold** words\n\nother\n\nmore bold", 80);
        let hits = preview.find_lines("BOLD", false);
        assert_eq!(hits.len(), 2);
        assert!(preview.line(hits[0]).unwrap().content().contains("bold"));
        assert!(preview.find_lines("BOLD", true).is_empty());
    }

    #[test]
    fn test_find_lines_agrees_with_span_highlighting() {
        let preview = Preview::render("Some **bold** words", 80);
        // "Some " and "bold" are separate spans, so nothing could be highlighted.
        assert!(preview.find_lines("some bold", false).is_empty());
        let hits = preview.find_lines("bold", false);
        assert_eq!(hits.len(), 1);
        let highlighted = preview
            .line(hits[0])
            .unwrap()
            .spans
            .iter()
            .flat_map(|span| crate::search::highlight_segments(&span.text, "bold", false))
            .filter(|segment| segment.matched)
            .count();
        assert_eq!(highlighted, 1);
    }

    #[test]
    fn test_find_lines_skips_decoration() {
        let preview = Preview::render("- item
- other", 80);
        assert!(preview.find_lines("•", false).is_empty());
        assert_eq!(preview.find_lines("item", false).len(), 1);
    }

    #[test]
    fn test_find_lines_ignores_markdown_syntax() {
        let preview = Preview::render("**x**", 80);
        assert!(preview.find_lines("**", false).is_empty());
    }

    #[test]
    fn test_link_at_column() {
        let preview = Preview::render("see [docs](https://x.org) now", 80);
        let link = preview.links().first().unwrap().clone();
        assert_eq!(link.url, "https://x.org");
        assert_eq!(link.text, "docs");
        assert_eq!(link.columns, 4..8);
        assert_eq!(preview.link_at(link.line, 5), Some(&link));
        assert_eq!(preview.link_at(link.line, 1), None);
    }

    #[test]
    fn test_links_in_range() {
        let preview = Preview::render("[a](a.md)\n\n[b](b.md)", 80);
        let all: Vec<_> = preview.links_in(0..preview.line_count()).collect();
        assert_eq!(all.len(), 2);
        let first_line = all[0].line;
        assert_eq!(preview.links_in(first_line..first_line + 1).count(), 1);
    }

    #[test]
    fn test_images_get_their_own_line() {
        let preview = Preview::render("intro ![logo](img/logo.png)", 80);
        let image = preview.images().first().unwrap();
        assert_eq!(image.src, "img/logo.png");
        assert_eq!(preview.line(image.line).unwrap().kind, LineKind::Image);
        assert_eq!(preview.image_on_line(image.line), Some(image));
    }
}
