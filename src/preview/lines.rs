use comrak::nodes::{AstNode, ListDelimType, ListType, NodeValue, TableAlignment};
use comrak::{Arena, parse_document};
use unicode_width::UnicodeWidthStr;

use super::{
    HeadingRef, ImageRef, LineKind, LinkRef, PreviewLine, PreviewSpan, SpanStyle,
    markdown_options,
};
use crate::links::anchor_slug;

const QUOTE_BAR: &str = "│ ";
const HARD_BREAK: &str = "\n";

pub(super) struct Layout {
    pub lines: Vec<PreviewLine>,
    pub headings: Vec<HeadingRef>,
    pub links: Vec<LinkRef>,
    pub images: Vec<ImageRef>,
}

pub(super) fn layout(source: &str, width: usize) -> Layout {
    let arena = Arena::new();
    let options = markdown_options();
    let root = parse_document(&arena, source, &options);

    let mut builder = Builder::new(width);
    for child in root.children() {
        builder.block(child, "", false);
        builder.separate();
    }
    builder.finish()
}

struct Builder {
    width: usize,
    lines: Vec<PreviewLine>,
    headings: Vec<HeadingRef>,
    links: Vec<LinkRef>,
    images: Vec<ImageRef>,
    /// List marker that replaces the prefix of the next emitted line.
    pending_marker: Option<String>,
}

impl Builder {
    fn new(width: usize) -> Self {
        Self {
            width,
            lines: Vec::new(),
            headings: Vec::new(),
            links: Vec::new(),
            images: Vec::new(),
            pending_marker: None,
        }
    }

    fn finish(mut self) -> Layout {
        while self.lines.last().is_some_and(|line| line.kind == LineKind::Empty) {
            self.lines.pop();
        }
        Layout {
            lines: self.lines,
            headings: self.headings,
            links: self.links,
            images: self.images,
        }
    }

    fn separate(&mut self) {
        if self.lines.last().is_some_and(|line| line.kind != LineKind::Empty) {
            self.lines.push(PreviewLine::empty());
        }
    }

    fn block<'a>(&mut self, node: &'a AstNode<'a>, prefix: &str, quoted: bool) {
        let text_kind = if quoted { LineKind::Quote } else { LineKind::Paragraph };
        match &node.data.borrow().value {
            NodeValue::Paragraph => {
                let mut spans = Vec::new();
                let mut images = Vec::new();
                collect_inline(node, SpanStyle::default(), None, &mut spans, &mut images);
                if spans.iter().any(|span| !span.text.trim().is_empty()) {
                    self.push_wrapped(spans, text_kind, prefix);
                }
                for (alt, src) in images {
                    let line = self.lines.len();
                    let label = if alt.is_empty() { src.clone() } else { alt.clone() };
                    let spans = vec![PreviewSpan::new(
                        format!("[image: {label}]"),
                        SpanStyle::default(),
                    )];
                    self.emit(prefix, spans, LineKind::Image);
                    self.images.push(ImageRef { alt, src, line });
                }
            }
            NodeValue::Heading(heading) => {
                let mut spans = Vec::new();
                let mut images = Vec::new();
                collect_inline(node, SpanStyle::default(), None, &mut spans, &mut images);
                let text: String = spans.iter().map(|span| span.text.as_str()).collect();
                let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
                self.headings.push(HeadingRef {
                    level: heading.level,
                    slug: anchor_slug(&text),
                    text,
                    line: self.lines.len(),
                });
                let marker = format!("{prefix}{} ", "#".repeat(heading.level as usize));
                let rest = format!("{prefix}{}", " ".repeat(heading.level as usize + 1));
                self.wrap_into(spans, LineKind::Heading(heading.level), &marker, &rest);
            }
            NodeValue::CodeBlock(code) => {
                let language = code.info.split_whitespace().next().unwrap_or("code");
                let inner = self.width.saturating_sub(prefix.width() + 2).max(1);
                self.emit(
                    prefix,
                    vec![PreviewSpan::decoration(format!("╭─ {language}"))],
                    LineKind::CodeBlock,
                );
                for raw in code.literal.lines() {
                    let style = SpanStyle {
                        code: true,
                        ..SpanStyle::default()
                    };
                    self.emit(
                        prefix,
                        vec![
                            PreviewSpan::decoration("│ "),
                            PreviewSpan::new(truncate(raw, inner), style),
                        ],
                        LineKind::CodeBlock,
                    );
                }
                self.emit(prefix, vec![PreviewSpan::decoration("╰─")], LineKind::CodeBlock);
            }
            NodeValue::BlockQuote => {
                let inner = format!("{prefix}{QUOTE_BAR}");
                let mut first = true;
                for child in node.children() {
                    if !first {
                        self.emit(&inner, Vec::new(), LineKind::Quote);
                    }
                    self.block(child, &inner, true);
                    first = false;
                }
            }
            NodeValue::List(list) => {
                let start = list.start;
                let delimiter = match list.delimiter {
                    ListDelimType::Paren => ')',
                    ListDelimType::Period => '.',
                };
                for (index, item) in node.children().enumerate() {
                    let marker = match list.list_type {
                        ListType::Bullet => "•".to_string(),
                        ListType::Ordered => format!("{}{delimiter}", start + index),
                    };
                    self.item(item, prefix, &marker, quoted);
                }
            }
            NodeValue::Item(_) | NodeValue::TaskItem(_) => self.item(node, prefix, "•", quoted),
            NodeValue::Table(_) => self.table(node, prefix),
            NodeValue::ThematicBreak => {
                let rule = "─".repeat(self.width.saturating_sub(prefix.width()).max(1));
                self.emit(prefix, vec![PreviewSpan::decoration(rule)], LineKind::Rule);
            }
            NodeValue::HtmlBlock(html) => {
                for raw in html.literal.lines() {
                    self.emit(prefix, vec![PreviewSpan::new(raw, SpanStyle::default())], LineKind::Html);
                }
            }
            NodeValue::FootnoteDefinition(def) => {
                let label = format!("[^{}]: ", def.name);
                self.pending_marker = Some(format!("{prefix}{label}"));
                let rest = format!("{prefix}{}", " ".repeat(label.width()));
                for child in node.children() {
                    self.block(child, &rest, quoted);
                }
            }
            _ => {
                for child in node.children() {
                    self.block(child, prefix, quoted);
                }
            }
        }
    }

    fn item<'a>(&mut self, node: &'a AstNode<'a>, prefix: &str, marker: &str, quoted: bool) {
        let marker = match &node.data.borrow().value {
            NodeValue::TaskItem(Some(_)) => "✓".to_string(),
            NodeValue::TaskItem(None) => "□".to_string(),
            _ => marker.to_string(),
        };
        let first = format!("{prefix}{marker} ");
        let rest = format!("{prefix}{}", " ".repeat(marker.width() + 1));
        self.pending_marker = Some(first.clone());
        let before = self.lines.len();
        for child in node.children() {
            self.block(child, &rest, quoted);
        }
        if self.lines.len() == before {
            // Empty item still shows its marker.
            self.pending_marker = None;
            self.emit(&first, Vec::new(), LineKind::ListItem(0));
        }
        for line in &mut self.lines[before..] {
            if matches!(line.kind, LineKind::Paragraph | LineKind::Quote) {
                line.kind = LineKind::ListItem(rest.width());
            }
        }
    }

    fn table<'a>(&mut self, node: &'a AstNode<'a>, prefix: &str) {
        let alignments = match &node.data.borrow().value {
            NodeValue::Table(table) => table.alignments.clone(),
            _ => Vec::new(),
        };
        let mut rows = Vec::new();
        let mut header = false;
        for row in node.children() {
            let NodeValue::TableRow(is_header) = row.data.borrow().value else {
                continue;
            };
            header |= is_header;
            let cells = row
                .children()
                .map(|cell| plain_text(cell).split_whitespace().collect::<Vec<_>>().join(" "))
                .collect::<Vec<_>>();
            rows.push(cells);
        }

        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut widths = vec![0usize; columns];
        for row in &rows {
            for (col, cell) in row.iter().enumerate() {
                widths[col] = widths[col].max(cell.width());
            }
        }

        for (index, row) in rows.iter().enumerate() {
            let cells = widths
                .iter()
                .enumerate()
                .map(|(col, width)| {
                    let cell = row.get(col).map_or("", String::as_str);
                    let alignment = alignments.get(col).copied().unwrap_or(TableAlignment::None);
                    align(cell, *width, alignment)
                })
                .collect::<Vec<_>>();
            let style = SpanStyle {
                strong: header && index == 0,
                ..SpanStyle::default()
            };
            let mut spans = Vec::new();
            for (col, cell) in cells.into_iter().enumerate() {
                if col > 0 {
                    spans.push(PreviewSpan::decoration(" │ "));
                }
                spans.push(PreviewSpan::new(cell, style));
            }
            self.emit(prefix, spans, LineKind::Table);
            if header && index == 0 {
                let rule = widths
                    .iter()
                    .map(|width| "─".repeat(*width))
                    .collect::<Vec<_>>()
                    .join("─┼─");
                self.emit(prefix, vec![PreviewSpan::decoration(rule)], LineKind::Table);
            }
        }
    }

    fn push_wrapped(&mut self, spans: Vec<PreviewSpan>, kind: LineKind, prefix: &str) {
        self.wrap_into(spans, kind, prefix, prefix);
    }

    fn wrap_into(&mut self, spans: Vec<PreviewSpan>, kind: LineKind, first: &str, rest: &str) {
        let first = self.pending_marker.take().unwrap_or_else(|| first.to_string());
        for line in wrap_spans(spans, self.width, &first, rest) {
            self.record_links(&line);
            self.lines.push(PreviewLine { kind, spans: line });
        }
    }

    /// Push one unwrapped line, honouring a pending list marker.
    fn emit(&mut self, prefix: &str, mut spans: Vec<PreviewSpan>, kind: LineKind) {
        let prefix = self.pending_marker.take().unwrap_or_else(|| prefix.to_string());
        if !prefix.is_empty() {
            spans.insert(0, PreviewSpan::decoration(prefix));
        }
        self.lines.push(PreviewLine { kind, spans });
    }

    fn record_links(&mut self, spans: &[PreviewSpan]) {
        let line = self.lines.len();
        let mut column = 0;
        let mut open: Option<LinkRef> = None;
        for span in spans {
            let width = span.text.width();
            let continues = matches!(
                (&span.target, &open),
                (Some(target), Some(link)) if *target == link.url
            );
            if continues {
                if let Some(link) = open.as_mut() {
                    link.text.push_str(&span.text);
                    link.columns.end = column + width;
                }
            } else {
                if let Some(link) = open.take() {
                    self.links.push(trimmed(link));
                }
                open = span.target.as_ref().map(|url| LinkRef {
                    text: span.text.clone(),
                    url: url.clone(),
                    line,
                    columns: column..column + width,
                });
            }
            column += width;
        }
        if let Some(link) = open {
            self.links.push(trimmed(link));
        }
    }
}

fn trimmed(mut link: LinkRef) -> LinkRef {
    let kept = link.text.trim_end().len();
    link.columns.end -= link.text[kept..].width();
    link.text.truncate(kept);
    link
}

fn collect_inline<'a>(
    node: &'a AstNode<'a>,
    style: SpanStyle,
    target: Option<&str>,
    spans: &mut Vec<PreviewSpan>,
    images: &mut Vec<(String, String)>,
) {
    let push = |spans: &mut Vec<PreviewSpan>, text: String, style: SpanStyle| {
        spans.push(PreviewSpan {
            text,
            style,
            target: target.map(ToString::to_string),
        });
    };

    for child in node.children() {
        match &child.data.borrow().value {
            NodeValue::Text(text) => push(spans, text.clone(), style),
            NodeValue::Code(code) => push(
                spans,
                code.literal.clone(),
                SpanStyle {
                    code: true,
                    ..style
                },
            ),
            NodeValue::HtmlInline(html) => push(spans, html.clone(), style),
            NodeValue::SoftBreak => push(spans, " ".to_string(), style),
            NodeValue::LineBreak => push(spans, HARD_BREAK.to_string(), style),
            NodeValue::FootnoteReference(reference) => {
                push(spans, format!("[^{}]", reference.name), style);
            }
            NodeValue::Emph => {
                let next = SpanStyle {
                    emphasis: true,
                    ..style
                };
                collect_inline(child, next, target, spans, images);
            }
            NodeValue::Strong => {
                let next = SpanStyle {
                    strong: true,
                    ..style
                };
                collect_inline(child, next, target, spans, images);
            }
            NodeValue::Strikethrough => {
                let next = SpanStyle {
                    strikethrough: true,
                    ..style
                };
                collect_inline(child, next, target, spans, images);
            }
            NodeValue::Link(link) => {
                let next = SpanStyle { link: true, ..style };
                collect_inline(child, next, Some(&link.url), spans, images);
            }
            NodeValue::Image(image) => {
                images.push((plain_text(child), image.url.clone()));
            }
            _ => collect_inline(child, style, target, spans, images),
        }
    }
}

fn plain_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut spans = Vec::new();
    let mut images = Vec::new();
    collect_inline(node, SpanStyle::default(), None, &mut spans, &mut images);
    spans
        .iter()
        .map(|span| if span.text == HARD_BREAK { " " } else { span.text.as_str() })
        .collect()
}

/// Greedy word wrap over styled spans, measured in display columns.
fn wrap_spans(
    spans: Vec<PreviewSpan>,
    width: usize,
    prefix_first: &str,
    prefix_next: &str,
) -> Vec<Vec<PreviewSpan>> {
    let start_line = |prefix: &str| -> (Vec<PreviewSpan>, usize) {
        if prefix.is_empty() {
            (Vec::new(), 0)
        } else {
            (vec![PreviewSpan::decoration(prefix)], prefix.width())
        }
    };

    let mut lines = Vec::new();
    let (mut current, mut current_width) = start_line(prefix_first);
    let mut has_word = false;

    for token in spans.iter().flat_map(split_tokens) {
        if token.text == HARD_BREAK {
            lines.push(trim_trailing(std::mem::take(&mut current)));
            (current, current_width) = start_line(prefix_next);
            has_word = false;
            continue;
        }
        let token_width = token.text.width();
        let is_space = token.text.chars().all(char::is_whitespace);

        if has_word && current_width + token_width > width {
            lines.push(trim_trailing(std::mem::take(&mut current)));
            (current, current_width) = start_line(prefix_next);
            has_word = false;
        }
        if is_space && !has_word {
            continue;
        }
        current_width += token_width;
        current.push(token);
        has_word |= !is_space;
    }
    lines.push(trim_trailing(current));
    lines
}

fn trim_trailing(mut line: Vec<PreviewSpan>) -> Vec<PreviewSpan> {
    while line
        .last()
        .is_some_and(|span| !span.style.decoration && span.text.trim().is_empty())
    {
        line.pop();
    }
    line
}

/// Split a span into alternating word and whitespace tokens.
fn split_tokens(span: &PreviewSpan) -> Vec<PreviewSpan> {
    if span.text == HARD_BREAK {
        return vec![span.clone()];
    }
    let mut out = Vec::new();
    let mut buf = String::new();
    let mut in_space: Option<bool> = None;
    for ch in span.text.chars() {
        let is_space = ch.is_whitespace();
        if in_space.is_some_and(|state| state != is_space) {
            out.push(PreviewSpan {
                text: std::mem::take(&mut buf),
                ..span.clone()
            });
        }
        in_space = Some(is_space);
        buf.push(ch);
    }
    if !buf.is_empty() {
        out.push(PreviewSpan { text: buf, ..span.clone() });
    }
    out
}

fn truncate(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

fn align(cell: &str, width: usize, alignment: TableAlignment) -> String {
    let pad = width.saturating_sub(cell.width());
    match alignment {
        TableAlignment::Right => format!("{}{cell}", " ".repeat(pad)),
        TableAlignment::Center => {
            let left = pad / 2;
            format!("{}{cell}{}", " ".repeat(left), " ".repeat(pad - left))
        }
        TableAlignment::Left | TableAlignment::None => format!("{cell}{}", " ".repeat(pad)),
    }
}
