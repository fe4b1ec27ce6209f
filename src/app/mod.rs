//! Application state and main event loop.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete application state
//! - [`Message`]: All possible events and actions
//! - [`update`]: Pure function for state transitions
//! - [`App::run`]: Main event loop with rendering

mod effects;
mod event_loop;
mod input;
mod model;
mod update;

pub use model::{HistoryPanel, Model, SettingsField, SettingsPanel, ToastLevel, TutorialPanel};
pub use update::{Message, update};

use std::path::PathBuf;

use crate::chart::ChartType;
use crate::render::DEFAULT_DEBOUNCE_MS;

/// Main application struct that owns the terminal and runs the event loop.
pub struct App {
    source_path: Option<PathBuf>,
    chart_type: Option<ChartType>,
    state_file: Option<PathBuf>,
    export_dir: PathBuf,
    debounce_ms: u64,
    mouse_enabled: bool,
    config_global_path: Option<PathBuf>,
    config_local_path: Option<PathBuf>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    /// Create an application that starts from the last used chart type's template.
    pub fn new() -> Self {
        Self {
            source_path: None,
            chart_type: None,
            state_file: None,
            export_dir: PathBuf::from("."),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            mouse_enabled: true,
            config_global_path: None,
            config_local_path: None,
        }
    }

    /// Open a chart source file instead of the template.
    pub fn with_source_path(mut self, path: Option<PathBuf>) -> Self {
        self.source_path = path;
        self
    }

    /// Force the chart type, overriding the file extension and saved state.
    pub const fn with_chart_type(mut self, chart_type: Option<ChartType>) -> Self {
        self.chart_type = chart_type;
        self
    }

    /// Where history, settings and layout are persisted. `None` keeps them in memory.
    pub fn with_state_file(mut self, path: Option<PathBuf>) -> Self {
        self.state_file = path;
        self
    }

    /// Directory exported charts are written to.
    pub fn with_export_dir(mut self, dir: PathBuf) -> Self {
        self.export_dir = dir;
        self
    }

    /// Quiet period after the last edit before a render fires.
    pub const fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }

    /// Enable or disable mouse capture.
    pub const fn with_mouse(mut self, enabled: bool) -> Self {
        self.mouse_enabled = enabled;
        self
    }

    /// Set config paths to show in help.
    pub fn with_config_paths(
        mut self,
        global_path: Option<PathBuf>,
        local_path: Option<PathBuf>,
    ) -> Self {
        self.config_global_path = global_path;
        self.config_local_path = local_path;
        self
    }
}
