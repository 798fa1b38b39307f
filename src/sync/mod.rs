//! Proportional scroll synchronization between the source and preview panes.
//!
//! The two panes have unrelated heights (a heading is one source line but
//! may be several preview rows), so alignment is by scroll *proportion*:
//! a pane scrolled 40% of its travel puts the other pane at 40% of its own.
//!
//! Only the pane the user is actually driving may push its position. The
//! controller remembers that pane as the active side and ignores scroll
//! events from the other one, which would otherwise bounce the corrective
//! write straight back. While a corrective write is in flight the controller
//! is [`SyncState::Syncing`] and drops every event until the host calls
//! [`ScrollSync::finish`].

/// One of the two panes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The editable markdown source.
    Raw,
    /// The rendered preview.
    Rendered,
}

impl Side {
    pub const fn other(self) -> Self {
        match self {
            Self::Raw => Self::Rendered,
            Self::Rendered => Self::Raw,
        }
    }
}

/// Which panes are on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutMode {
    /// Source only.
    Edit,
    /// Preview only.
    Read,
    /// Source and preview side by side.
    #[default]
    Split,
}

impl LayoutMode {
    /// Parse a layout name as used on the command line.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "edit" => Some(Self::Edit),
            "read" => Some(Self::Read),
            "split" => Some(Self::Split),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Read => "read",
            Self::Split => "split",
        }
    }

    pub const fn shows(self, side: Side) -> bool {
        match (self, side) {
            (Self::Split, _) | (Self::Edit, Side::Raw) | (Self::Read, Side::Rendered) => true,
            (Self::Edit, Side::Rendered) | (Self::Read, Side::Raw) => false,
        }
    }

    pub const fn shows_both(self) -> bool {
        matches!(self, Self::Split)
    }

    /// Edit/read toggle. Leaving split goes to read.
    pub const fn toggled_mode(self) -> Self {
        match self {
            Self::Read => Self::Edit,
            Self::Edit | Self::Split => Self::Read,
        }
    }

    /// Split toggle. Leaving split goes to edit.
    pub const fn toggled_split(self) -> Self {
        match self {
            Self::Split => Self::Edit,
            Self::Edit | Self::Read => Self::Split,
        }
    }
}

/// Scroll geometry of one pane, in any consistent unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub offset: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl ScrollMetrics {
    pub const fn new(offset: f64, scroll_height: f64, client_height: f64) -> Self {
        Self {
            offset,
            scroll_height,
            client_height,
        }
    }

    /// How far the pane can scroll; zero or negative when it cannot.
    pub fn max_extent(&self) -> f64 {
        self.scroll_height - self.client_height
    }
}

/// Where `target` should scroll to so it sits at the same proportion as
/// `source`.
///
/// Returns `None` when the source cannot scroll.
pub fn proportional_offset(source: ScrollMetrics, target: ScrollMetrics) -> Option<f64> {
    let source_max = source.max_extent();
    if source_max <= 0.0 {
        return None;
    }
    let proportion = (source.offset / source_max).clamp(0.0, 1.0);
    Some(proportion * target.max_extent().max(0.0))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    Idle,
    Syncing,
}

/// Active-side guarded scroll synchronization.
#[derive(Debug, Clone)]
pub struct ScrollSync {
    enabled: bool,
    active: Option<Side>,
    state: SyncState,
}

impl Default for ScrollSync {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ScrollSync {
    pub const fn new(enabled: bool) -> Self {
        Self {
            enabled,
            active: None,
            state: SyncState::Idle,
        }
    }

    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        tracing::debug!(enabled, "scroll sync toggled");
    }

    pub const fn active_side(&self) -> Option<Side> {
        self.active
    }

    pub const fn state(&self) -> SyncState {
        self.state
    }

    /// The pointer entered (or keyboard focus moved to) `side`.
    pub const fn pointer_enter(&mut self, side: Side) {
        self.active = Some(side);
    }

    /// React to a scroll of `source`.
    ///
    /// Returns the offset the other pane should be written to, entering
    /// [`SyncState::Syncing`]; the host applies the write and then calls
    /// [`ScrollSync::finish`]. Returns `None` when the event does not
    /// qualify or the source cannot scroll.
    pub fn on_scroll(
        &mut self,
        source: Side,
        layout: LayoutMode,
        source_metrics: ScrollMetrics,
        target_metrics: ScrollMetrics,
    ) -> Option<f64> {
        if !self.enabled
            || !layout.shows_both()
            || self.active != Some(source)
            || self.state == SyncState::Syncing
        {
            return None;
        }
        let offset = proportional_offset(source_metrics, target_metrics)?;
        self.state = SyncState::Syncing;
        tracing::trace!(?source, offset, "scroll sync write");
        Some(offset)
    }

    /// The corrective write has been applied.
    pub const fn finish(&mut self) {
        self.state = SyncState::Idle;
    }
}
