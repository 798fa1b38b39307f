//! Link and image target resolution.
//!
//! Targets written in the document are classified by shape and, when they
//! point at local files, resolved against the directory of the open
//! document. Paths are handled as strings so that a Windows document path
//! opened elsewhere still resolves with its own separator.

use std::path::Path;

/// File extensions treated as images.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "bmp", "tiff", "tif", "ico", "svg", "avif",
];

const EXTERNAL_SCHEMES: &[&str] = &["http://", "https://", "ftp://", "mailto:"];

/// The shape of a link target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    External,
    Anchor,
    MarkdownDocument,
    Image,
    OtherLocal,
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

pub fn is_external(target: &str) -> bool {
    EXTERNAL_SCHEMES
        .iter()
        .any(|scheme| starts_with_ignore_case(target, scheme))
}

pub fn is_image_target(target: &str) -> bool {
    let lower = target.to_ascii_lowercase();
    lower
        .rsplit_once('.')
        .is_some_and(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext))
}

/// Classify a raw target string. The first matching rule wins.
pub fn classify(target: &str) -> LinkKind {
    if is_external(target) {
        LinkKind::External
    } else if target.starts_with('#') {
        LinkKind::Anchor
    } else if target.to_ascii_lowercase().ends_with(".md") {
        LinkKind::MarkdownDocument
    } else if is_image_target(target) {
        LinkKind::Image
    } else {
        LinkKind::OtherLocal
    }
}

/// Backslash for paths that only use backslashes, forward slash otherwise.
pub fn detect_separator(path: &str) -> char {
    if path.contains('\\') && !path.contains('/') {
        '\\'
    } else {
        '/'
    }
}

fn is_absolute(target: &str) -> bool {
    let bytes = target.as_bytes();
    target.starts_with('/')
        || target.starts_with('\\')
        || (bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':')
}

/// Resolve `target` against the directory of `document_path`.
///
/// External, anchor, and absolute targets come back unchanged, as does
/// everything when there is no document path.
pub fn resolve(target: &str, document_path: Option<&str>) -> String {
    if matches!(classify(target), LinkKind::External | LinkKind::Anchor) || is_absolute(target) {
        return target.to_string();
    }
    let Some(document_path) = document_path else {
        return target.to_string();
    };
    let separator = detect_separator(document_path);
    let directory = document_path
        .rsplit_once(separator)
        .map_or("", |(directory, _file)| directory);
    let target = target
        .strip_prefix("./")
        .or_else(|| target.strip_prefix(".\\"))
        .unwrap_or(target);
    if directory.is_empty() && !document_path.starts_with(separator) {
        return target.to_string();
    }
    format!("{directory}{separator}{target}")
}

/// Converts a resolved local file path into something the renderer can load.
pub trait AssetBridge {
    fn asset_url(&self, absolute_path: &str) -> String;
}

/// Produces `file://` URLs.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileUrlBridge;

impl AssetBridge for FileUrlBridge {
    fn asset_url(&self, absolute_path: &str) -> String {
        let mut url = String::from("file://");
        if !absolute_path.starts_with(['/', '\\']) {
            url.push('/');
        }
        for ch in absolute_path.chars() {
            match ch {
                '\\' => url.push('/'),
                ' ' => url.push_str("%20"),
                '%' => url.push_str("%25"),
                '#' => url.push_str("%23"),
                '?' => url.push_str("%3F"),
                _ => url.push(ch),
            }
        }
        url
    }
}

/// What following a link should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAction {
    OpenExternal(String),
    /// Scroll the preview to the heading with this slug.
    ScrollToAnchor(String),
    OpenDocument(String),
    OpenLocal(String),
    /// The document has no location; ask the user which file they meant.
    PromptForFile(String),
}

/// How an image should be displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Remote(String),
    Asset(String),
    /// Missing or unresolvable; show a placeholder with the original target.
    Broken(String),
}

/// Resolves targets relative to one document.
#[derive(Debug, Clone, Default)]
pub struct LinkResolver {
    document_path: Option<String>,
}

impl LinkResolver {
    pub fn new(document_path: Option<&Path>) -> Self {
        Self {
            document_path: document_path.map(|path| path.to_string_lossy().into_owned()),
        }
    }

    pub fn document_path(&self) -> Option<&str> {
        self.document_path.as_deref()
    }

    pub fn resolve(&self, target: &str) -> String {
        resolve(target, self.document_path.as_deref())
    }

    /// Decide what following `target` does.
    pub fn action(&self, target: &str) -> LinkAction {
        let kind = classify(target);
        match kind {
            LinkKind::External => LinkAction::OpenExternal(target.to_string()),
            LinkKind::Anchor => LinkAction::ScrollToAnchor(anchor_slug(&target[1..])),
            LinkKind::MarkdownDocument | LinkKind::Image | LinkKind::OtherLocal => {
                if self.document_path.is_none() && !is_absolute(target) {
                    return LinkAction::PromptForFile(target.to_string());
                }
                let resolved = self.resolve(target);
                if kind == LinkKind::MarkdownDocument {
                    LinkAction::OpenDocument(resolved)
                } else {
                    LinkAction::OpenLocal(resolved)
                }
            }
        }
    }

    /// Decide how to show an image; `exists` reports whether a resolved
    /// local path is present.
    pub fn image_source(
        &self,
        target: &str,
        bridge: &dyn AssetBridge,
        exists: &dyn Fn(&str) -> bool,
    ) -> ImageSource {
        if is_external(target) || starts_with_ignore_case(target, "data:") {
            return ImageSource::Remote(target.to_string());
        }
        if target.is_empty() || (self.document_path.is_none() && !is_absolute(target)) {
            return ImageSource::Broken(target.to_string());
        }
        let resolved = self.resolve(target);
        if exists(&resolved) {
            ImageSource::Asset(bridge.asset_url(&resolved))
        } else {
            ImageSource::Broken(target.to_string())
        }
    }
}

/// Normalise heading text or an anchor fragment for comparison.
///
/// Lowercases ASCII, keeps alphanumerics and turns every other run of
/// characters into a single dash.
pub fn anchor_slug(text: &str) -> String {
    let mut out = String::new();
    let mut last_dash = false;
    for ch in text.chars() {
        let lower = ch.to_ascii_lowercase();
        if lower.is_alphanumeric() {
            out.push(lower);
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    out.trim_matches('-').to_string()
}

/// Launch the platform opener for an external URL or local file.
///
/// # Errors
///
/// Returns an error if the opener process cannot be spawned.
pub fn open_external(url: &str) -> std::io::Result<()> {
    tracing::info!(url, "opening externally");
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?.wait()?;
        Ok(())
    }
    #[cfg(target_os = "windows")]
    {
        use std::process::Stdio;
        std::process::Command::new("cmd")
            .args(["/C", "start", "", url])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(())
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()?
            .wait()?;
        Ok(())
    }
}
