//! Standalone HTML rendering of a buffer.

use std::cell::RefCell;
use std::fmt::Write as _;

use comrak::nodes::{Ast, AstNode, LineColumn, NodeValue};
use comrak::{Arena, format_html, parse_document};

use super::markdown_options;
use crate::links::{AssetBridge, ImageSource, LinkKind, LinkResolver, classify};
use crate::search::highlight_segments;

const STYLE: &str = "body{max-width:48em;margin:2em auto;padding:0 1em;font-family:sans-serif;line-height:1.5}\
pre{background:#f4f4f4;padding:.5em;overflow-x:auto}\
mark{background:#ffe066}\
.broken-image{opacity:.5;border:1px dashed #999;padding:0 .25em}";

/// Inputs to [`render_html`] beyond the source text.
pub struct HtmlOptions<'a> {
    pub title: &'a str,
    pub resolver: &'a LinkResolver,
    pub bridge: &'a dyn AssetBridge,
    /// Whether a resolved local path exists.
    pub image_exists: &'a dyn Fn(&str) -> bool,
    /// Pattern and case sensitivity of the active search.
    pub highlight: Option<(&'a str, bool)>,
}

/// Render `source` to a complete HTML page.
///
/// # Errors
///
/// Returns an error if comrak fails to write its output.
pub fn render_html(source: &str, options: &HtmlOptions<'_>) -> std::io::Result<String> {
    let _scope = crate::perf::scope("preview.render_html");
    let arena = Arena::new();
    let mut comrak_options = markdown_options();
    // Required for the <mark> and placeholder nodes inserted below. Raw
    // HTML from the document itself is turned into text first.
    comrak_options.render.unsafe_ = true;
    let root = parse_document(&arena, source, &comrak_options);

    escape_raw_html(&arena, root);
    rewrite_targets(&arena, root, options);
    if let Some((pattern, case_sensitive)) = options.highlight.filter(|(p, _)| !p.is_empty()) {
        mark_matches(&arena, root, pattern, case_sensitive);
    }

    let mut body = Vec::new();
    format_html(root, &comrak_options, &mut body)?;
    let body = String::from_utf8_lossy(&body);

    let mut page = String::new();
    let _ = write!(
        page,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}</body>\n</html>\n",
        escape_html(options.title)
    );
    Ok(page)
}

/// Show the document's own HTML as literal text in the page.
fn escape_raw_html<'a>(arena: &'a Arena<AstNode<'a>>, root: &'a AstNode<'a>) {
    let nodes: Vec<_> = root.descendants().collect();
    for node in nodes {
        let (value, child) = match &node.data.borrow().value {
            NodeValue::HtmlInline(html) => (NodeValue::Text(html.clone()), None),
            NodeValue::HtmlBlock(block) => (
                NodeValue::Paragraph,
                Some(block.literal.trim_end_matches('\n').to_string()),
            ),
            _ => continue,
        };
        node.data.borrow_mut().value = value;
        if let Some(text) = child {
            node.append(new_node(arena, NodeValue::Text(text)));
        }
    }
}

fn rewrite_targets<'a>(arena: &'a Arena<AstNode<'a>>, root: &'a AstNode<'a>, options: &HtmlOptions<'_>) {
    let nodes: Vec<_> = root.descendants().collect();
    for node in nodes {
        let mut broken = None;
        {
            let mut data = node.data.borrow_mut();
            match &mut data.value {
                NodeValue::Link(link) => {
                    if matches!(classify(&link.url), LinkKind::External | LinkKind::Anchor) {
                        continue;
                    }
                    if options.resolver.document_path().is_some() {
                        // The fragment addresses the target page, not the file.
                        let (path, fragment) = link
                            .url
                            .split_once('#')
                            .map_or((link.url.as_str(), None), |(path, fragment)| {
                                (path, Some(fragment))
                            });
                        let mut url = options.bridge.asset_url(&options.resolver.resolve(path));
                        if let Some(fragment) = fragment {
                            url.push('#');
                            url.push_str(fragment);
                        }
                        link.url = url;
                    }
                }
                NodeValue::Image(image) => {
                    match options.resolver.image_source(
                        &image.url,
                        options.bridge,
                        options.image_exists,
                    ) {
                        ImageSource::Remote(url) | ImageSource::Asset(url) => image.url = url,
                        ImageSource::Broken(target) => broken = Some(target),
                    }
                }
                _ => {}
            }
        }
        if let Some(target) = broken {
            let alt = alt_text(node);
            let placeholder = format!(
                "<span class=\"broken-image\" title=\"{}\">{}</span>",
                escape_html(&target),
                escape_html(if alt.is_empty() { &target } else { &alt })
            );
            node.insert_before(new_node(arena, NodeValue::HtmlInline(placeholder)));
            node.detach();
        }
    }
}

fn mark_matches<'a>(arena: &'a Arena<AstNode<'a>>, root: &'a AstNode<'a>, pattern: &str, case_sensitive: bool) {
    let nodes: Vec<_> = root.descendants().collect();
    for node in nodes {
        let text = match &node.data.borrow().value {
            NodeValue::Text(text) => text.clone(),
            _ => continue,
        };
        let inside_image = node
            .ancestors()
            .any(|ancestor| matches!(ancestor.data.borrow().value, NodeValue::Image(_)));
        if inside_image {
            continue;
        }
        let segments = highlight_segments(&text, pattern, case_sensitive);
        if !segments.iter().any(|segment| segment.matched) {
            continue;
        }
        for segment in segments {
            let value = if segment.matched {
                NodeValue::HtmlInline(format!("<mark>{}</mark>", escape_html(segment.text)))
            } else {
                NodeValue::Text(segment.text.to_string())
            };
            node.insert_before(new_node(arena, value));
        }
        node.detach();
    }
}

fn new_node<'a>(arena: &'a Arena<AstNode<'a>>, value: NodeValue) -> &'a AstNode<'a> {
    arena.alloc(AstNode::new(RefCell::new(Ast::new(
        value,
        LineColumn { line: 0, column: 0 },
    ))))
}

fn alt_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut alt = String::new();
    for descendant in node.descendants() {
        match &descendant.data.borrow().value {
            NodeValue::Text(text) => alt.push_str(text),
            NodeValue::Code(code) => alt.push_str(&code.literal),
            _ => {}
        }
    }
    alt
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
