use crate::app::model::{Model, ToastLevel};
use crate::chart::ChartType;
use crate::editor::Direction;
use crate::export::ExportFormat;
use crate::settings::{SettingsPatch, parse_hex_color};
use crate::view::Overlay;

use super::model::SettingsField;

/// Everything that can change the [`Model`]: key and mouse input mapped by
/// `input.rs`, plus resize and quit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Editor
    EditorInsertChar(char),
    /// Pasted text, possibly several lines
    EditorInsertText(String),
    /// Backspace
    EditorDeleteBack,
    /// Delete
    EditorDeleteForward,
    /// Enter, keeping the line's indentation
    EditorSplitLine,
    EditorMoveCursor(Direction),
    EditorMoveHome,
    EditorMoveEnd,
    EditorMoveWordLeft,
    EditorMoveWordRight,
    EditorMoveToStart,
    EditorMoveToEnd,
    /// Click in the editor pane at (line, col)
    EditorMoveTo(usize, usize),
    /// Wheel or PgUp/PgDn, in lines
    EditorScrollUp(usize),
    EditorScrollDown(usize),

    // Document
    /// Store the current source in history
    SaveSnapshot,
    /// Switch between flowchart and mind map
    ToggleChartType,
    /// Switch to a specific chart type
    SetChartType(ChartType),
    /// Empty the source
    ClearSource,
    /// Cycle the flowchart header direction
    ToggleFlowDirection,

    // History panel
    ToggleHistory,
    /// Replace the history search query
    HistoryQuery(String),
    HistoryUp,
    HistoryDown,
    /// Load the highlighted entry into the editor
    HistoryLoadSelected,
    /// First delete press; asks for confirmation
    HistoryRequestDelete,
    /// Second delete press
    HistoryConfirmDelete,
    HistoryCancelDelete,

    // Settings panel
    ToggleSettings,
    SettingsUp,
    SettingsDown,
    /// Step the highlighted setting forwards or backwards
    SettingsAdjust(i32),
    /// Enter on the highlighted row
    SettingsActivate,
    /// Replace the hex colour being typed
    SettingsColorInput(String),
    SettingsColorCommit,
    SettingsColorCancel,
    SettingsReset,

    // Tutorial panel
    ToggleTutorial,
    /// Replace the tutorial search query
    TutorialQuery(String),
    TutorialUp,
    TutorialDown,
    /// Replace the source with the highlighted example
    TutorialInsert,
    /// Copy the highlighted example to the clipboard
    TutorialCopy,

    // Export
    ToggleExportMenu,
    ExportUp,
    ExportDown,
    /// Write the displayed chart in the given format
    Export(ExportFormat),

    // View
    ZoomIn,
    ZoomOut,
    ZoomReset,
    /// Change zoom by a signed percentage (mouse wheel)
    ZoomBy(i32),
    /// Pan the preview by (columns, rows)
    Pan(i32, i32),
    /// Switch between side-by-side and stacked panes
    ToggleLayout,
    /// Switch focus between editor and preview
    SwitchFocus,
    FocusEditor,
    FocusPreview,
    ToggleHelp,
    /// Close whichever overlay is open
    CloseOverlay,

    // Window
    /// Terminal resized
    Resize(u16, u16),

    Quit,
}

/// Apply one message to the model.
///
/// Pure: clipboard, clock, export and state-file work runs afterwards in
/// `App::handle_message_side_effects`.
pub fn update(mut model: Model, msg: Message) -> Model {
    if !matches!(
        msg,
        Message::HistoryRequestDelete | Message::HistoryConfirmDelete
    ) {
        model.history_panel.pending_delete = None;
    }

    match msg {
        // Editor
        edit @ (Message::EditorInsertChar(_)
        | Message::EditorInsertText(_)
        | Message::EditorDeleteBack
        | Message::EditorDeleteForward
        | Message::EditorSplitLine
        | Message::EditorMoveCursor(_)
        | Message::EditorMoveHome
        | Message::EditorMoveEnd
        | Message::EditorMoveWordLeft
        | Message::EditorMoveWordRight
        | Message::EditorMoveToStart
        | Message::EditorMoveToEnd
        | Message::EditorMoveTo(..)) => {
            edit_buffer(&mut model, edit);
            keep_cursor_in_view(&mut model);
        }
        Message::EditorScrollUp(n) => {
            model.editor_scroll_offset = model.editor_scroll_offset.saturating_sub(n);
        }
        Message::EditorScrollDown(n) => {
            let max = model.editor.line_count().saturating_sub(1);
            model.editor_scroll_offset = (model.editor_scroll_offset + n).min(max);
        }

        // Document
        Message::ToggleChartType => model.toggle_chart_type(),
        Message::SetChartType(chart_type) => model.set_chart_type(chart_type),
        Message::ClearSource => {
            model.clear_source();
            model.show_toast(ToastLevel::Info, "Source cleared");
        }
        Message::ToggleFlowDirection => model.toggle_flow_direction(),

        // History panel
        Message::ToggleHistory => toggle_overlay(&mut model, Overlay::History),
        Message::HistoryQuery(query) => {
            model.history_panel.query = query;
            model.history_panel.selected = 0;
        }
        Message::HistoryUp => {
            model.history_panel.selected = model.history_panel.selected.saturating_sub(1);
        }
        Message::HistoryDown => {
            let count = model.history_matches().len();
            model.history_panel.selected =
                (model.history_panel.selected + 1).min(count.saturating_sub(1));
        }
        Message::HistoryLoadSelected => {
            if let Some(id) = model.selected_history_id() {
                model.load_snapshot(&id);
            }
        }
        Message::HistoryRequestDelete => {
            if let Some(id) = model.selected_history_id() {
                model.history_panel.pending_delete = Some(id);
            }
        }
        Message::HistoryConfirmDelete => {
            if let Some(id) = model.history_panel.pending_delete.take() {
                model.delete_snapshot(&id);
            }
        }
        Message::HistoryCancelDelete => {}

        // Settings panel
        Message::ToggleSettings => toggle_overlay(&mut model, Overlay::Settings),
        Message::SettingsUp => {
            model.settings_panel.color_input = None;
            model.settings_panel.field = model.settings_panel.field.prev();
        }
        Message::SettingsDown => {
            model.settings_panel.color_input = None;
            model.settings_panel.field = model.settings_panel.field.next();
        }
        Message::SettingsAdjust(delta) => {
            let field = model.settings_panel.field;
            model.adjust_setting(field, delta);
        }
        Message::SettingsActivate => match model.settings_panel.field {
            SettingsField::PrimaryColor => {
                model.settings_panel.color_input = Some(model.settings.primary_color.clone());
            }
            SettingsField::Reset => model.reset_settings(),
            field => model.adjust_setting(field, 1),
        },
        Message::SettingsColorInput(input) => {
            model.settings_panel.color_input = Some(input);
        }
        Message::SettingsColorCommit => {
            if let Some(input) = model.settings_panel.color_input.take() {
                let trimmed = input.trim();
                if parse_hex_color(trimmed).is_some() {
                    let color = if trimmed.starts_with('#') {
                        trimmed.to_string()
                    } else {
                        format!("#{trimmed}")
                    };
                    model.apply_settings(SettingsPatch::primary_color(color));
                } else {
                    model.show_toast(
                        ToastLevel::Warning,
                        format!("Not a hex colour: {trimmed}"),
                    );
                }
            }
        }
        Message::SettingsColorCancel => {
            model.settings_panel.color_input = None;
        }
        Message::SettingsReset => model.reset_settings(),

        // Tutorial panel
        Message::ToggleTutorial => toggle_overlay(&mut model, Overlay::Tutorial),
        Message::TutorialQuery(query) => {
            model.tutorial_panel.query = query;
            model.tutorial_panel.selected = 0;
        }
        Message::TutorialUp => {
            model.tutorial_panel.selected = model.tutorial_panel.selected.saturating_sub(1);
        }
        Message::TutorialDown => {
            let count = model.tutorial_matches().len();
            model.tutorial_panel.selected =
                (model.tutorial_panel.selected + 1).min(count.saturating_sub(1));
        }
        Message::TutorialInsert => {
            if let Some(section) = model.selected_tutorial() {
                model.insert_tutorial(section);
            }
        }

        // Export
        Message::ToggleExportMenu => toggle_overlay(&mut model, Overlay::Export),
        Message::ExportUp => {
            model.export_selected = model.export_selected.saturating_sub(1);
        }
        Message::ExportDown => {
            model.export_selected = (model.export_selected + 1).min(ExportFormat::ALL.len() - 1);
        }
        Message::Export(_) => {
            model.view.close_overlay();
        }

        // View
        Message::ZoomIn => {
            model.view.zoom_in();
            model.clamp_pan();
        }
        Message::ZoomOut => {
            model.view.zoom_out();
            model.clamp_pan();
        }
        Message::ZoomReset => {
            model.view.reset_zoom();
            model.view.reset_pan();
        }
        Message::ZoomBy(delta) => {
            model.view.zoom_by(delta);
            model.clamp_pan();
        }
        Message::Pan(dx, dy) => {
            let limits = model.pan_limits();
            model.view.pan_by(dx, dy, limits);
        }
        Message::ToggleLayout => {
            model.view.toggle_layout();
            model.persist_dirty = true;
            model.clamp_pan();
            keep_cursor_in_view(&mut model);
        }
        Message::SwitchFocus => {
            model.view.focus = model.view.focus.toggled();
        }
        Message::FocusEditor => {
            model.view.focus = crate::view::Focus::Editor;
        }
        Message::FocusPreview => {
            model.view.focus = crate::view::Focus::Preview;
        }
        Message::ToggleHelp => toggle_overlay(&mut model, Overlay::Help),
        Message::CloseOverlay => {
            model.settings_panel.color_input = None;
            model.view.close_overlay();
        }

        // Effects only
        Message::SaveSnapshot | Message::TutorialCopy => {}

        // Window
        Message::Resize(width, height) => {
            model.terminal_size = (width, height);
            model.clamp_pan();
            keep_cursor_in_view(&mut model);
        }

        // Application
        Message::Quit => {
            model.should_quit = true;
        }
    }
    model.sync_from_editor();
    model
}

fn toggle_overlay(model: &mut Model, overlay: Overlay) {
    if model.view.is_open(overlay) {
        model.view.close_overlay();
    } else {
        model.open_overlay(overlay);
    }
}

fn edit_buffer(model: &mut Model, msg: Message) {
    let editor = &mut model.editor;
    match msg {
        Message::EditorInsertChar(ch) => editor.insert_char(ch),
        Message::EditorInsertText(text) => editor.insert_str(&text),
        Message::EditorDeleteBack => {
            editor.delete_back();
        }
        Message::EditorDeleteForward => {
            editor.delete_forward();
        }
        Message::EditorSplitLine => editor.split_line(),
        Message::EditorMoveCursor(direction) => editor.move_cursor(direction),
        Message::EditorMoveHome => editor.move_home(),
        Message::EditorMoveEnd => editor.move_end(),
        Message::EditorMoveWordLeft => editor.move_word_left(),
        Message::EditorMoveWordRight => editor.move_word_right(),
        Message::EditorMoveToStart => editor.move_to_start(),
        Message::EditorMoveToEnd => editor.move_to_end(),
        Message::EditorMoveTo(line, col) => {
            editor.move_to(line, col);
            model.view.focus = crate::view::Focus::Editor;
        }
        _ => {}
    }
}

/// Scroll the editor just far enough that the cursor line is on screen.
fn keep_cursor_in_view(model: &mut Model) {
    let line = model.editor.cursor().line;
    let rows = model.editor_visible_rows().max(1);
    model.editor_scroll_offset = model
        .editor_scroll_offset
        .clamp(line.saturating_sub(rows - 1), line);
}
