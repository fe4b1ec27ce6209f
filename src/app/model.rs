use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local, Utc};

use crate::chart::{self, ChartType, Visual};
use crate::document::Document;
use crate::editor::EditorBuffer;
use crate::export::ExportFormat;
use crate::history::{HistoryEntry, HistoryIds, HistoryStore, default_title};
use crate::render::{RenderPipeline, RenderRequest};
use crate::settings::{
    COLOR_PRESETS, FONT_OPTIONS, FONT_SIZE_RANGE, SettingsPatch, StyleConfig, ViewSettings,
};
use crate::store::PersistedState;
use crate::tutorial::{self, TutorialSection};
use crate::view::{Overlay, ViewState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// Row of the settings panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SettingsField {
    #[default]
    Theme,
    FontFamily,
    FontSize,
    PrimaryColor,
    Reset,
}

impl SettingsField {
    pub const ALL: [Self; 5] = [
        Self::Theme,
        Self::FontFamily,
        Self::FontSize,
        Self::PrimaryColor,
        Self::Reset,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Theme => "Theme",
            Self::FontFamily => "Font",
            Self::FontSize => "Font size",
            Self::PrimaryColor => "Primary color",
            Self::Reset => "Reset to defaults",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryPanel {
    pub query: String,
    pub selected: usize,
    /// Entry id awaiting a second confirming press before deletion.
    pub pending_delete: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPanel {
    pub field: SettingsField,
    /// Free-form hex input while the colour row is being edited.
    pub color_input: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TutorialPanel {
    pub query: String,
    pub selected: usize,
}

/// The complete application state.
///
/// All state lives here - no global or scattered state.
pub struct Model {
    /// Source text and chart type being edited
    pub document: Document,
    /// Editable copy of the source shown in the code pane
    pub editor: EditorBuffer,
    /// Line index of the first visible editor line
    pub editor_scroll_offset: usize,
    /// Editor revision last copied into `document`
    synced_revision: u64,
    pub history: HistoryStore,
    pub settings: ViewSettings,
    pub view: ViewState,
    pub pipeline: RenderPipeline,
    pub history_panel: HistoryPanel,
    pub settings_panel: SettingsPanel,
    pub tutorial_panel: TutorialPanel,
    /// Highlighted row of the export menu
    pub export_selected: usize,
    /// Directory exported files are written to
    pub export_dir: PathBuf,
    /// State file shown in help
    pub state_path: Option<PathBuf>,
    /// Global config path shown in help
    pub config_global_path: Option<PathBuf>,
    /// Local override path shown in help
    pub config_local_path: Option<PathBuf>,
    pub terminal_size: (u16, u16),
    pub mouse_enabled: bool,
    /// A render has been running for longer than one frame
    pub loading: bool,
    /// Source, type or style changed since the last scheduled render
    pub(super) render_dirty: bool,
    /// Persisted fields changed since the last state write
    pub(super) persist_dirty: bool,
    /// No state write is attempted before this after a failed one
    pub(super) persist_retry_at: Option<Instant>,
    ids: HistoryIds,
    toast: Option<Toast>,
    /// Whether the app should quit
    pub should_quit: bool,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("chart_type", &self.document.chart_type())
            .field("history_len", &self.history.len())
            .field("view", &self.view)
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

impl Model {
    /// Build the model from a document and the state restored at startup.
    pub fn new(document: Document, state: PersistedState, terminal_size: (u16, u16)) -> Self {
        let editor = EditorBuffer::from_text(document.source());
        let synced_revision = editor.revision();
        let mut ids = HistoryIds::new();
        ids.seed_from(&state.history);

        Self {
            document,
            editor,
            editor_scroll_offset: 0,
            synced_revision,
            history: state.history,
            settings: state.settings,
            view: ViewState::new(state.layout_orientation),
            pipeline: RenderPipeline::default(),
            history_panel: HistoryPanel::default(),
            settings_panel: SettingsPanel::default(),
            tutorial_panel: TutorialPanel::default(),
            export_selected: 0,
            export_dir: PathBuf::from("."),
            state_path: None,
            config_global_path: None,
            config_local_path: None,
            terminal_size,
            mouse_enabled: true,
            loading: false,
            render_dirty: true,
            persist_dirty: false,
            persist_retry_at: None,
            ids,
            toast: None,
            should_quit: false,
        }
    }

    pub fn with_pipeline(mut self, pipeline: RenderPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Fields written to the state file.
    pub fn persisted_state(&self) -> PersistedState {
        PersistedState {
            history: self.history.clone(),
            chart_type: self.document.chart_type(),
            layout_orientation: self.view.layout,
            settings: self.settings.clone(),
        }
    }

    pub fn style(&self) -> StyleConfig {
        StyleConfig::from(&self.settings)
    }

    pub fn render_request(&self) -> RenderRequest {
        RenderRequest::new(
            self.document.source(),
            self.document.chart_type(),
            self.style(),
        )
    }

    pub const fn needs_persist(&self) -> bool {
        self.persist_dirty
    }

    pub(super) const fn mark_persisted(&mut self) {
        self.persist_dirty = false;
        self.persist_retry_at = None;
    }

    /// Queue a render if anything it depends on changed. Returns true if queued.
    pub fn schedule_render(&mut self, now_ms: u64) -> bool {
        if !self.render_dirty {
            return false;
        }
        self.render_dirty = false;
        let request = self.render_request();
        self.pipeline.schedule(request, now_ms);
        true
    }

    /// Render the current document on the next tick, without debouncing.
    pub fn schedule_initial_render(&mut self, now_ms: u64) {
        self.render_dirty = false;
        let request = self.render_request();
        self.pipeline.schedule_immediate(request, now_ms);
    }

    /// The displayed visual, if the preview currently shows one.
    pub fn current_visual(&self) -> Option<Arc<Visual>> {
        self.pipeline.current_visual()
    }

    /// Copy editor edits into the document.
    pub(super) fn sync_from_editor(&mut self) {
        if self.editor.revision() == self.synced_revision {
            return;
        }
        self.synced_revision = self.editor.revision();
        self.document.set_source(self.editor.text());
        self.render_dirty = true;
    }

    /// Reload the editor after the document changed from outside the editor.
    fn load_editor_from_document(&mut self) {
        self.editor.set_text(self.document.source());
        self.synced_revision = self.editor.revision();
        self.editor_scroll_offset = 0;
        self.render_dirty = true;
    }

    pub(super) fn replace_source(&mut self, source: impl Into<String>) {
        self.document.set_source(source);
        self.load_editor_from_document();
    }

    /// Switch chart type. A change swaps the source for the new type's template.
    pub(super) fn set_chart_type(&mut self, chart_type: ChartType) {
        if !self.document.set_chart_type(chart_type) {
            return;
        }
        self.load_editor_from_document();
        self.view.reset_pan();
        self.persist_dirty = true;
        self.show_toast(
            ToastLevel::Info,
            format!("Switched to {}", chart_type.label()),
        );
    }

    pub(super) fn toggle_chart_type(&mut self) {
        self.set_chart_type(self.document.chart_type().toggled());
    }

    pub(super) fn clear_source(&mut self) {
        self.document.clear();
        self.load_editor_from_document();
        self.view.reset_pan();
    }

    pub(super) fn toggle_flow_direction(&mut self) {
        if self.document.chart_type() != ChartType::Flowchart {
            self.show_toast(ToastLevel::Info, "Direction applies to flowcharts only");
            return;
        }
        let next = chart::current_direction(self.document.source()).toggled();
        let source = chart::with_direction(self.document.source(), next);
        self.replace_source(source);
        self.show_toast(
            ToastLevel::Info,
            format!("Direction set to {}", next.token()),
        );
    }

    /// Store the current source in history.
    ///
    /// Returns the new entry id, or `None` when the source is blank.
    pub fn save_snapshot(&mut self, title: Option<String>, now: DateTime<Utc>) -> Option<String> {
        if self.document.is_blank() {
            self.show_toast(ToastLevel::Info, "Nothing to save");
            return None;
        }
        let chart_type = self.document.chart_type();
        let now_ms = u64::try_from(now.timestamp_millis()).unwrap_or_default();
        let id = self.ids.next(now_ms);
        let title = title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| default_title(chart_type, now.with_timezone(&Local)));
        let entry = HistoryEntry::new(
            id.clone(),
            title.clone(),
            self.document.source().to_string(),
            chart_type,
            now,
        );
        self.history.add(entry);
        self.persist_dirty = true;
        self.show_toast(ToastLevel::Info, format!("Saved \"{title}\""));
        Some(id)
    }

    /// Replace the source and chart type with a history entry's.
    pub fn load_snapshot(&mut self, id: &str) -> bool {
        let Some(entry) = self.history.get(id).cloned() else {
            self.show_toast(ToastLevel::Warning, "History entry not found");
            return false;
        };
        let type_changed = entry.chart_type != self.document.chart_type();
        self.document = Document::from_source(entry.source, entry.chart_type);
        self.load_editor_from_document();
        self.view.reset_pan();
        self.view.close_overlay();
        if type_changed {
            self.persist_dirty = true;
        }
        self.show_toast(ToastLevel::Info, format!("Loaded \"{}\"", entry.title));
        true
    }

    pub fn delete_snapshot(&mut self, id: &str) -> bool {
        if !self.history.remove(id) {
            return false;
        }
        self.persist_dirty = true;
        let count = self.history_matches().len();
        self.history_panel.selected = self.history_panel.selected.min(count.saturating_sub(1));
        self.show_toast(ToastLevel::Info, "Deleted from history");
        true
    }

    /// History entries matching the panel query, newest first.
    pub fn history_matches(&self) -> Vec<&HistoryEntry> {
        self.history.search(self.history_panel.query.trim())
    }

    pub fn selected_history_id(&self) -> Option<String> {
        self.history_matches()
            .get(self.history_panel.selected)
            .map(|entry| entry.id.clone())
    }

    pub fn tutorial_matches(&self) -> Vec<&'static TutorialSection> {
        tutorial::search_tutorials(&self.tutorial_panel.query)
    }

    pub fn selected_tutorial(&self) -> Option<&'static TutorialSection> {
        self.tutorial_matches()
            .get(self.tutorial_panel.selected)
            .copied()
    }

    /// Replace the source with a tutorial example, switching type if needed.
    pub(super) fn insert_tutorial(&mut self, section: &TutorialSection) {
        let type_changed = section.chart_type != self.document.chart_type();
        self.document.set_chart_type_preserving(section.chart_type);
        self.replace_source(section.code);
        self.view.reset_pan();
        self.view.close_overlay();
        if type_changed {
            self.persist_dirty = true;
        }
        self.show_toast(ToastLevel::Info, format!("Inserted \"{}\"", section.title));
    }

    pub fn selected_export_format(&self) -> ExportFormat {
        ExportFormat::ALL[self.export_selected.min(ExportFormat::ALL.len() - 1)]
    }

    pub(super) fn apply_settings(&mut self, patch: SettingsPatch) {
        self.settings.update(patch);
        self.render_dirty = true;
        self.persist_dirty = true;
    }

    pub(super) fn reset_settings(&mut self) {
        self.settings.reset();
        self.settings_panel.color_input = None;
        self.render_dirty = true;
        self.persist_dirty = true;
        self.show_toast(ToastLevel::Info, "Settings reset");
    }

    /// Step the value of `field` forwards (`delta > 0`) or backwards.
    pub(super) fn adjust_setting(&mut self, field: SettingsField, delta: i32) {
        let forward = delta >= 0;
        let patch = match field {
            SettingsField::Theme => {
                let theme = self.settings.theme;
                SettingsPatch::theme(if forward { theme.next() } else { theme.prev() })
            }
            SettingsField::FontFamily => {
                let current = FONT_OPTIONS
                    .iter()
                    .position(|f| *f == self.settings.font_family);
                SettingsPatch::font_family(cycle(FONT_OPTIONS, current, forward))
            }
            SettingsField::FontSize => {
                let size = i32::from(self.settings.font_size) + delta;
                let min = i32::from(*FONT_SIZE_RANGE.start());
                let max = i32::from(*FONT_SIZE_RANGE.end());
                let clamped = u16::try_from(size.clamp(min, max));
                SettingsPatch::font_size(clamped.unwrap_or(*FONT_SIZE_RANGE.start()))
            }
            SettingsField::PrimaryColor => {
                let current = COLOR_PRESETS
                    .iter()
                    .position(|c| c.eq_ignore_ascii_case(&self.settings.primary_color));
                SettingsPatch::primary_color(cycle(COLOR_PRESETS, current, forward))
            }
            SettingsField::Reset => return,
        };
        self.apply_settings(patch);
    }

    /// Rows available for editor text.
    pub fn editor_visible_rows(&self) -> usize {
        let area = ratatui::layout::Rect::new(0, 0, self.terminal_size.0, self.terminal_size.1);
        let areas = crate::ui::screen_areas(area, self.view.layout, self.toast.is_some());
        crate::ui::pane_inner(areas.editor).height as usize
    }

    /// Furthest the preview can pan before the chart's far edge leaves view.
    pub fn pan_limits(&self) -> (u16, u16) {
        let Some(visual) = self.current_visual() else {
            return (0, 0);
        };
        let (width, height) = visual.scene.canvas_size(self.view.scale());
        let area = ratatui::layout::Rect::new(0, 0, self.terminal_size.0, self.terminal_size.1);
        let areas = crate::ui::screen_areas(area, self.view.layout, self.toast.is_some());
        let inner = crate::ui::pane_inner(areas.preview);
        let max_x = width.saturating_sub(usize::from(inner.width));
        let max_y = height.saturating_sub(usize::from(inner.height));
        (
            u16::try_from(max_x).unwrap_or(u16::MAX),
            u16::try_from(max_y).unwrap_or(u16::MAX),
        )
    }

    pub(super) fn clamp_pan(&mut self) {
        let limits = self.pan_limits();
        self.view.pan_by(0, 0, limits);
    }

    pub(super) fn open_overlay(&mut self, overlay: Overlay) {
        match overlay {
            Overlay::History => self.history_panel = HistoryPanel::default(),
            Overlay::Settings => self.settings_panel = SettingsPanel::default(),
            Overlay::Tutorial => self.tutorial_panel = TutorialPanel::default(),
            Overlay::Export => self.export_selected = 0,
            Overlay::Help => {}
        }
        self.view.open_overlay(overlay);
    }

    pub(super) fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + Duration::from_secs(4),
        });
    }

    pub(super) fn expire_toast(&mut self, now: Instant) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .map(|toast| (toast.message.as_str(), toast.level))
    }
}

fn cycle(options: &[&str], current: Option<usize>, forward: bool) -> String {
    let len = options.len();
    let idx = match (current, forward) {
        (Some(i), true) => (i + 1) % len,
        (Some(i), false) => (i + len - 1) % len,
        (None, _) => 0,
    };
    options[idx].to_string()
}

impl Default for Model {
    fn default() -> Self {
        Self::new(Document::new(), PersistedState::default(), (80, 24))
    }
}
