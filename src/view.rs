//! Preview zoom, pane layout, overlay and focus state.

use serde::{Deserialize, Serialize};

pub const MIN_ZOOM: u16 = 10;
pub const MAX_ZOOM: u16 = 500;
pub const DEFAULT_ZOOM: u16 = 100;
/// Zoom change for the zoom in / out actions.
pub const ZOOM_STEP: u16 = 25;
/// Zoom change for one Ctrl+wheel notch.
pub const WHEEL_ZOOM_STEP: u16 = 10;

/// Editor share of the width in the horizontal layout.
pub const EDITOR_WIDTH_PERCENT: u16 = 40;
/// Editor share of the height in the vertical layout.
pub const EDITOR_HEIGHT_PERCENT: u16 = 50;

/// How the editor and preview panes are arranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutOrientation {
    /// Editor left, preview right.
    #[default]
    Horizontal,
    /// Editor on top, preview below.
    Vertical,
}

impl LayoutOrientation {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Horizontal => "side by side",
            Self::Vertical => "stacked",
        }
    }
}

/// Panels drawn over the main panes. At most one is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    History,
    Settings,
    Tutorial,
    Export,
    Help,
}

/// Which pane receives keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Editor,
    Preview,
}

impl Focus {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Editor => Self::Preview,
            Self::Preview => Self::Editor,
        }
    }
}

/// Transient view state. Only `layout` is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    zoom: u16,
    pub layout: LayoutOrientation,
    overlay: Option<Overlay>,
    pub focus: Focus,
    pub pan_x: u16,
    pub pan_y: u16,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            layout: LayoutOrientation::default(),
            overlay: None,
            focus: Focus::default(),
            pan_x: 0,
            pan_y: 0,
        }
    }
}

impl ViewState {
    pub fn new(layout: LayoutOrientation) -> Self {
        Self {
            layout,
            ..Self::default()
        }
    }

    /// Zoom level in percent, always within `MIN_ZOOM..=MAX_ZOOM`.
    pub const fn zoom(&self) -> u16 {
        self.zoom
    }

    /// Zoom as a scene scale factor.
    pub fn scale(&self) -> f32 {
        f32::from(self.zoom) / 100.0
    }

    pub fn set_zoom(&mut self, level: i32) {
        let clamped = level.clamp(i32::from(MIN_ZOOM), i32::from(MAX_ZOOM));
        // Clamped into u16 range above.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            self.zoom = clamped as u16;
        }
    }

    pub fn zoom_by(&mut self, delta: i32) {
        self.set_zoom(i32::from(self.zoom) + delta);
    }

    pub fn zoom_in(&mut self) {
        self.zoom_by(i32::from(ZOOM_STEP));
    }

    pub fn zoom_out(&mut self) {
        self.zoom_by(-i32::from(ZOOM_STEP));
    }

    pub fn reset_zoom(&mut self) {
        self.zoom = DEFAULT_ZOOM;
    }

    pub fn toggle_layout(&mut self) {
        self.layout = self.layout.toggled();
    }

    pub const fn overlay(&self) -> Option<Overlay> {
        self.overlay
    }

    /// Open `overlay`, replacing any other.
    pub const fn open_overlay(&mut self, overlay: Overlay) {
        self.overlay = Some(overlay);
    }

    pub const fn close_overlay(&mut self) {
        self.overlay = None;
    }

    pub fn is_open(&self, overlay: Overlay) -> bool {
        self.overlay == Some(overlay)
    }

    pub fn history_open(&self) -> bool {
        self.is_open(Overlay::History)
    }

    pub fn settings_open(&self) -> bool {
        self.is_open(Overlay::Settings)
    }

    pub fn tutorial_open(&self) -> bool {
        self.is_open(Overlay::Tutorial)
    }

    pub fn export_menu_open(&self) -> bool {
        self.is_open(Overlay::Export)
    }

    pub fn help_open(&self) -> bool {
        self.is_open(Overlay::Help)
    }

    pub const fn reset_pan(&mut self) {
        self.pan_x = 0;
        self.pan_y = 0;
    }

    /// Move the preview viewport, keeping it inside `max`.
    pub fn pan_by(&mut self, dx: i32, dy: i32, max: (u16, u16)) {
        self.pan_x = shift(self.pan_x, dx, max.0);
        self.pan_y = shift(self.pan_y, dy, max.1);
    }
}

fn shift(value: u16, delta: i32, max: u16) -> u16 {
    let next = (i32::from(value) + delta).clamp(0, i32::from(max));
    u16::try_from(next).unwrap_or(max)
}
