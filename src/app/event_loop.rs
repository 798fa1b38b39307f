use std::io::{Write, stdout};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::execute;
use ratatui::DefaultTerminal;

use crate::app::{App, Message, Model, update};
use crate::document::{Document, FsStore, StoreError};

/// Delays an action until its trigger has been quiet for a while.
pub(super) struct Debouncer<T> {
    delay_ms: u64,
    pending: Option<(T, u64)>,
}

impl<T: Copy> Debouncer<T> {
    pub(super) const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    /// Arm (or re-arm) with `value`.
    pub(super) fn queue(&mut self, value: T, now_ms: u64) {
        self.pending = Some((value, now_ms));
    }

    pub(super) fn take_ready(&mut self, now_ms: u64) -> Option<T> {
        let (value, queued_at) = self.pending?;
        if now_ms.saturating_sub(queued_at) >= self.delay_ms {
            self.pending = None;
            Some(value)
        } else {
            None
        }
    }

    pub(super) const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Coalesces terminal resize bursts.
pub(super) struct ResizeDebouncer(Debouncer<(u16, u16)>);

impl ResizeDebouncer {
    pub(super) const fn new(delay_ms: u64) -> Self {
        Self(Debouncer::new(delay_ms))
    }

    pub(super) fn queue(&mut self, width: u16, height: u16, now_ms: u64) {
        self.0.queue((width, height), now_ms);
    }

    pub(super) fn take_ready(&mut self, now_ms: u64) -> Option<(u16, u16)> {
        self.0.take_ready(now_ms)
    }

    pub(super) const fn is_pending(&self) -> bool {
        self.0.is_pending()
    }
}

/// Defers rescans and preview layout of large buffers until typing pauses.
pub(super) type SearchDebouncer = Debouncer<()>;

const RESIZE_DELAY_MS: u64 = 100;
const SEARCH_DELAY_MS: u64 = 150;

impl App {
    /// Run the main event loop.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal initialization or the event loop hits an
    /// I/O failure. Document errors are reported inside the UI instead.
    pub fn run(&mut self) -> Result<()> {
        let _run_scope = crate::perf::scope("app.run.total");

        let document = self.initial_document();

        let mut terminal = ratatui::try_init()
            .context("Failed to initialize terminal; marksync requires an interactive terminal")?;
        let size = terminal.size()?;

        let mut model = Model::new(document, (size.width, size.height))
            .with_layout(self.layout)
            .with_sync(self.sync_enabled)
            .with_case_sensitive(self.case_sensitive);
        if let Some(warning) = self.startup_warning.take() {
            model.show_toast(crate::app::ToastLevel::Error, warning);
        }

        execute!(stdout(), EnableMouseCapture, EnableBracketedPaste)?;
        set_mouse_motion_tracking(true)?;

        let result = self.event_loop(&mut terminal, &mut model);

        let _ = set_mouse_motion_tracking(false);
        let _ = execute!(stdout(), DisableBracketedPaste, DisableMouseCapture);
        ratatui::restore();

        result
    }

    /// Open the file given on the command line. A path that does not exist
    /// yet becomes an empty document that saves there.
    fn initial_document(&mut self) -> Document {
        let Some(path) = self.file_path.clone() else {
            return Document::new();
        };
        match Document::open(&FsStore, &path) {
            Ok(document) => document,
            Err(StoreError::Read { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                tracing::info!(path = %path.display(), "starting new document");
                Document::from_text("", Some(path))
            }
            Err(err) => {
                tracing::warn!(error = %err, "could not open initial file");
                self.startup_warning = Some(format!("Open failed: {err}"));
                Document::new()
            }
        }
    }

    fn dispatch(&self, model: &mut Model, msg: Message) {
        tracing::trace!(?msg, "message");
        let side_msg = msg.clone();
        *model = update(std::mem::take(model), msg);
        self.handle_message_side_effects(model, &side_msg);
    }

    fn event_loop(&self, terminal: &mut DefaultTerminal, model: &mut Model) -> Result<()> {
        let start = Instant::now();
        let now_ms = || u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        let mut resize_debouncer = ResizeDebouncer::new(RESIZE_DELAY_MS);
        let mut search_debouncer = SearchDebouncer::new(SEARCH_DELAY_MS);
        let mut needs_render = true;

        loop {
            if model.expire_toast(Instant::now()) {
                needs_render = true;
            }

            if let Some((width, height)) = resize_debouncer.take_ready(now_ms()) {
                self.dispatch(model, Message::Resize(width, height));
                needs_render = true;
            }

            if search_debouncer.take_ready(now_ms()).is_some() {
                self.dispatch(model, Message::Refresh);
                needs_render = true;
            }

            let poll_ms = if needs_render {
                0
            } else if resize_debouncer.is_pending() || search_debouncer.is_pending() {
                10
            } else {
                250
            };
            if event::poll(Duration::from_millis(poll_ms))? {
                // Coalesce key repeat bursts into a single render.
                let mut drained = 0_u32;
                loop {
                    let event_ms = now_ms();
                    if let Some(msg) =
                        Self::handle_event(event::read()?, model, event_ms, &mut resize_debouncer)
                    {
                        self.dispatch(model, msg);
                        if model.is_refresh_pending() {
                            search_debouncer.queue((), event_ms);
                        }
                        drained += 1;
                        needs_render = true;
                    }
                    if !event::poll(Duration::from_millis(0))? {
                        break;
                    }
                }
                if drained > 1 {
                    tracing::trace!(drained, "coalesced events");
                }
            }

            if needs_render {
                let _draw_scope = crate::perf::scope("frame.draw");
                terminal.draw(|frame| crate::ui::render(model, frame))?;
                needs_render = false;
            }

            if model.should_quit {
                break;
            }
        }
        Ok(())
    }
}

fn set_mouse_motion_tracking(enable: bool) -> std::io::Result<()> {
    // Any-event motion reporting (1003) with SGR encoding (1006), so hovering
    // a pane marks it active without a click.
    let mut out = stdout();
    if enable {
        out.write_all(b"\x1b[?1003h\x1b[?1006h")?;
    } else {
        out.write_all(b"\x1b[?1003l\x1b[?1006l")?;
    }
    out.flush()
}
