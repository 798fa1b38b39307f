use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::app::model::PromptKind;
use crate::app::{App, Message, Model, ToastLevel};
use crate::document::{Document, FsStore};
use crate::keymap::Command;
use crate::links::{FileUrlBridge, LinkAction, LinkResolver, open_external};
use crate::preview::html::{HtmlOptions, render_html};
use crate::sync::Side;

impl App {
    pub(super) fn handle_message_side_effects(&self, model: &mut Model, msg: &Message) {
        let _ = self;
        match msg {
            Message::Command(Command::Save) => save(model),
            Message::Command(Command::ConfirmPrompt) => confirm_prompt(model),
            Message::Command(Command::FollowVisibleLink) => follow_visible_link(model),
            Message::ClickPreview { line, column } => {
                let target = model
                    .preview
                    .link_at(*line, *column)
                    .map(|link| link.url.clone())
                    .or_else(|| model.preview.image_on_line(*line).map(|image| image.src.clone()));
                if let Some(target) = target {
                    follow_link(model, &target);
                }
            }
            _ => {}
        }
    }
}

fn save(model: &mut Model) {
    if model.document.path().is_none() {
        model.prompt = Some(crate::app::model::Prompt {
            kind: PromptKind::SaveAs,
            input: String::new(),
        });
        model.reflow();
        return;
    }
    match model.document.save(&FsStore) {
        Ok(()) => {
            let name = model.document.display_name();
            model.show_toast(ToastLevel::Info, format!("Saved {name}"));
        }
        Err(err) => {
            tracing::warn!(error = %err, "save failed");
            model.show_toast(ToastLevel::Error, format!("Save failed: {err}"));
        }
    }
}

fn confirm_prompt(model: &mut Model) {
    let Some(prompt) = model.prompt.take() else {
        return;
    };
    model.reflow();
    let input = prompt.input.trim();
    if input.is_empty() {
        return;
    }
    let path = PathBuf::from(input);
    match prompt.kind {
        PromptKind::Open => open_path(model, &path),
        PromptKind::SaveAs => match model.document.save_as(&FsStore, &path) {
            Ok(()) => {
                // Relative images resolve differently now that the document has a home.
                model.refresh();
                let name = model.document.display_name();
                model.show_toast(ToastLevel::Info, format!("Saved {name}"));
            }
            Err(err) => {
                tracing::warn!(error = %err, "save as failed");
                model.show_toast(ToastLevel::Error, format!("Save failed: {err}"));
            }
        },
    }
}

fn open_path(model: &mut Model, path: &Path) {
    match Document::open(&FsStore, path) {
        Ok(document) => model.load_document(document),
        Err(err) => {
            tracing::warn!(error = %err, "open failed");
            model.show_toast(ToastLevel::Error, format!("Open failed: {err}"));
        }
    }
}

fn follow_visible_link(model: &mut Model) {
    let range = model.preview_view.visible_range();
    let target = model.preview.links_in(range).next().map(|link| link.url.clone());
    match target {
        Some(target) => follow_link(model, &target),
        None => model.show_toast(ToastLevel::Info, "No visible links"),
    }
}

fn follow_link(model: &mut Model, target: &str) {
    let action = LinkResolver::new(model.document.path()).action(target);
    tracing::debug!(link = target, ?action, "following link");
    match action {
        LinkAction::OpenExternal(url) | LinkAction::OpenLocal(url) => match open_external(&url) {
            Ok(()) => model.show_toast(ToastLevel::Info, format!("Opened {url}")),
            Err(err) => {
                tracing::warn!(url, error = %err, "opener failed");
                model.show_toast(ToastLevel::Error, format!("Open failed: {err}"));
            }
        },
        LinkAction::ScrollToAnchor(slug) => match model.preview.anchor_line(&slug) {
            Some(line) => {
                model.preview_view.go_to_line(line);
                model.sync_from(Side::Rendered);
            }
            None => model.show_toast(ToastLevel::Warning, format!("Anchor #{slug} not found")),
        },
        LinkAction::OpenDocument(path) => {
            if model.document.is_dirty() {
                model.show_toast(ToastLevel::Warning, "Save or discard changes before following");
                return;
            }
            open_path(model, Path::new(&path));
        }
        LinkAction::PromptForFile(target) => {
            model.prompt = Some(crate::app::model::Prompt {
                kind: PromptKind::Open,
                input: target,
            });
            model.reflow();
            model.show_toast(ToastLevel::Info, "Document is unsaved; confirm the file to open");
        }
    }
}

/// Render `source` to a standalone HTML page at `out`, resolving links
/// against `document_path`. Text matching `highlight` (pattern and case
/// sensitivity) is wrapped in `<mark>`.
///
/// # Errors
///
/// Returns an error if rendering fails or `out` cannot be written.
pub fn export_html(
    source: &str,
    document_path: Option<&Path>,
    out: &Path,
    highlight: Option<(&str, bool)>,
) -> anyhow::Result<()> {
    let resolver = LinkResolver::new(document_path);
    let title = document_path
        .and_then(Path::file_stem)
        .map_or_else(|| "untitled".to_string(), |stem| stem.to_string_lossy().into_owned());
    let exists = |path: &str| Path::new(path).exists();
    let options = HtmlOptions {
        title: &title,
        resolver: &resolver,
        bridge: &FileUrlBridge,
        image_exists: &exists,
        highlight,
    };
    let html = render_html(source, &options).context("failed to render HTML")?;
    std::fs::write(out, html).with_context(|| format!("failed to write {}", out.display()))?;
    tracing::info!(out = %out.display(), "exported HTML");
    Ok(())
}
