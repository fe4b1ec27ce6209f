use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::Frame;
use ratatui::layout::Rect;

use crate::app::{App, Message, Model};
use crate::editor::Direction;
use crate::export::ExportFormat;
use crate::view::{Focus, Overlay, WHEEL_ZOOM_STEP};

use super::event_loop::ResizeDebouncer;

/// Columns moved per arrow key when panning the preview.
const PAN_STEP_X: i32 = 4;
const PAN_STEP_Y: i32 = 2;
const WHEEL_LINES: usize = 3;

impl App {
    pub(super) fn handle_event(
        &self,
        event: &Event,
        model: &Model,
        now_ms: u64,
        resize_debouncer: &mut ResizeDebouncer,
    ) -> Option<Message> {
        match event {
            Event::Key(key) => self.handle_key(*key, model),
            Event::Mouse(mouse) => self.handle_mouse(*mouse, model),
            Event::Paste(text) => self.handle_paste(text, model),
            Event::Resize(w, h) => {
                crate::perf::log_event("event.resize.queue", format!("width={w} height={h}"));
                resize_debouncer.queue((*w, *h), now_ms);
                None
            }
            _ => None,
        }
    }

    pub(super) fn handle_key(&self, key: KeyEvent, model: &Model) -> Option<Message> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && matches!(key.code, KeyCode::Char('q' | 'c')) {
            return Some(Message::Quit);
        }

        match model.view.overlay() {
            Some(Overlay::Help) => return Some(Message::ToggleHelp),
            Some(Overlay::History) => return history_key(key, model),
            Some(Overlay::Settings) => return settings_key(key, model),
            Some(Overlay::Tutorial) => return tutorial_key(key, model),
            Some(Overlay::Export) => return export_key(key, model),
            None => {}
        }

        if let Some(msg) = global_key(key) {
            return Some(msg);
        }

        match model.view.focus {
            Focus::Preview => preview_key(key),
            Focus::Editor => editor_key(key, model),
        }
    }

    pub(super) fn handle_mouse(&self, mouse: MouseEvent, model: &Model) -> Option<Message> {
        if model.view.overlay().is_some() {
            return None;
        }

        let area = Rect::new(0, 0, model.terminal_size.0, model.terminal_size.1);
        let areas =
            crate::ui::screen_areas(area, model.view.layout, model.active_toast().is_some());
        let in_editor = point_in_rect(mouse.column, mouse.row, areas.editor);
        let in_preview = point_in_rect(mouse.column, mouse.row, areas.preview);
        let ctrl = mouse.modifiers.contains(KeyModifiers::CONTROL);
        let shift = mouse.modifiers.contains(KeyModifiers::SHIFT);
        let wheel_zoom = i32::from(WHEEL_ZOOM_STEP);

        if in_preview {
            return match mouse.kind {
                MouseEventKind::ScrollUp if ctrl => Some(Message::ZoomBy(wheel_zoom)),
                MouseEventKind::ScrollDown if ctrl => Some(Message::ZoomBy(-wheel_zoom)),
                MouseEventKind::ScrollUp if shift => Some(Message::Pan(-PAN_STEP_X, 0)),
                MouseEventKind::ScrollDown if shift => Some(Message::Pan(PAN_STEP_X, 0)),
                MouseEventKind::ScrollUp => Some(Message::Pan(0, -PAN_STEP_Y)),
                MouseEventKind::ScrollDown => Some(Message::Pan(0, PAN_STEP_Y)),
                MouseEventKind::ScrollLeft => Some(Message::Pan(-PAN_STEP_X, 0)),
                MouseEventKind::ScrollRight => Some(Message::Pan(PAN_STEP_X, 0)),
                MouseEventKind::Down(MouseButton::Left) if model.view.focus != Focus::Preview => {
                    Some(Message::FocusPreview)
                }
                _ => None,
            };
        }

        if in_editor {
            return match mouse.kind {
                MouseEventKind::ScrollUp => Some(Message::EditorScrollUp(WHEEL_LINES)),
                MouseEventKind::ScrollDown => Some(Message::EditorScrollDown(WHEEL_LINES)),
                MouseEventKind::Down(MouseButton::Left) => {
                    editor_position(model, areas.editor, mouse.column, mouse.row)
                        .map(|(line, col)| Message::EditorMoveTo(line, col))
                        .or(Some(Message::FocusEditor))
                }
                _ => None,
            };
        }

        None
    }

    fn handle_paste(&self, text: &str, model: &Model) -> Option<Message> {
        match model.view.overlay() {
            Some(Overlay::History) => Some(Message::HistoryQuery(format!(
                "{}{}",
                model.history_panel.query,
                single_line(text)
            ))),
            Some(Overlay::Tutorial) => Some(Message::TutorialQuery(format!(
                "{}{}",
                model.tutorial_panel.query,
                single_line(text)
            ))),
            Some(Overlay::Settings) => model.settings_panel.color_input.as_ref().map(|input| {
                Message::SettingsColorInput(format!("{input}{}", single_line(text).trim()))
            }),
            Some(_) => None,
            None if model.view.focus == Focus::Editor => {
                Some(Message::EditorInsertText(text.to_string()))
            }
            None => None,
        }
    }

    pub(super) fn view(&self, model: &Model, frame: &mut Frame) {
        crate::ui::render(model, frame);
    }
}

fn plain_char(key: KeyEvent) -> Option<char> {
    match key.code {
        KeyCode::Char(c)
            if !key.modifiers.contains(KeyModifiers::CONTROL)
                && !key.modifiers.contains(KeyModifiers::ALT) =>
        {
            Some(c)
        }
        _ => None,
    }
}

fn single_line(text: &str) -> String {
    text.lines().next().unwrap_or_default().to_string()
}

/// Shortcuts available from either pane while no overlay is open.
fn global_key(key: KeyEvent) -> Option<Message> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('s') if ctrl => Some(Message::SaveSnapshot),
        KeyCode::Char('t') if ctrl => Some(Message::ToggleChartType),
        KeyCode::Char('l') if ctrl => Some(Message::ClearSource),
        KeyCode::Char('d') if ctrl => Some(Message::ToggleFlowDirection),
        KeyCode::Char('h') if ctrl => Some(Message::ToggleHistory),
        KeyCode::Char('g') if ctrl => Some(Message::ToggleSettings),
        KeyCode::Char('o') if ctrl => Some(Message::ToggleTutorial),
        KeyCode::Char('e') if ctrl => Some(Message::ToggleExportMenu),
        KeyCode::Char('w') if ctrl => Some(Message::ToggleLayout),
        KeyCode::Char('=' | '+') if ctrl => Some(Message::ZoomIn),
        KeyCode::Char('-') if ctrl => Some(Message::ZoomOut),
        KeyCode::Char('0') if ctrl => Some(Message::ZoomReset),
        KeyCode::F(1) => Some(Message::ToggleHelp),
        KeyCode::F(2) => Some(Message::ToggleHistory),
        KeyCode::F(3) => Some(Message::ToggleSettings),
        KeyCode::F(4) => Some(Message::ToggleTutorial),
        KeyCode::F(5) => Some(Message::ToggleExportMenu),
        KeyCode::Tab | KeyCode::BackTab => Some(Message::SwitchFocus),
        _ => None,
    }
}

fn editor_key(key: KeyEvent, model: &Model) -> Option<Message> {
    if let Some(c) = plain_char(key) {
        return Some(Message::EditorInsertChar(c));
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let page = model.editor_visible_rows().max(1);
    match key.code {
        KeyCode::Enter => Some(Message::EditorSplitLine),
        KeyCode::Backspace => Some(Message::EditorDeleteBack),
        KeyCode::Delete => Some(Message::EditorDeleteForward),
        KeyCode::Left if ctrl => Some(Message::EditorMoveWordLeft),
        KeyCode::Right if ctrl => Some(Message::EditorMoveWordRight),
        KeyCode::Left => Some(Message::EditorMoveCursor(Direction::Left)),
        KeyCode::Right => Some(Message::EditorMoveCursor(Direction::Right)),
        KeyCode::Up => Some(Message::EditorMoveCursor(Direction::Up)),
        KeyCode::Down => Some(Message::EditorMoveCursor(Direction::Down)),
        KeyCode::Home if ctrl => Some(Message::EditorMoveToStart),
        KeyCode::End if ctrl => Some(Message::EditorMoveToEnd),
        KeyCode::Home => Some(Message::EditorMoveHome),
        KeyCode::End => Some(Message::EditorMoveEnd),
        KeyCode::PageUp => Some(Message::EditorScrollUp(page)),
        KeyCode::PageDown => Some(Message::EditorScrollDown(page)),
        _ => None,
    }
}

fn preview_key(key: KeyEvent) -> Option<Message> {
    match key.code {
        KeyCode::Left | KeyCode::Char('h') => Some(Message::Pan(-PAN_STEP_X, 0)),
        KeyCode::Right | KeyCode::Char('l') => Some(Message::Pan(PAN_STEP_X, 0)),
        KeyCode::Up | KeyCode::Char('k') => Some(Message::Pan(0, -PAN_STEP_Y)),
        KeyCode::Down | KeyCode::Char('j') => Some(Message::Pan(0, PAN_STEP_Y)),
        KeyCode::Char('+' | '=') => Some(Message::ZoomIn),
        KeyCode::Char('-') => Some(Message::ZoomOut),
        KeyCode::Char('0') => Some(Message::ZoomReset),
        KeyCode::Char('?') => Some(Message::ToggleHelp),
        KeyCode::Esc => Some(Message::FocusEditor),
        _ => None,
    }
}

fn history_key(key: KeyEvent, model: &Model) -> Option<Message> {
    if model.history_panel.pending_delete.is_some() {
        return match key.code {
            KeyCode::Char('y' | 'Y') | KeyCode::Enter | KeyCode::Delete => {
                Some(Message::HistoryConfirmDelete)
            }
            _ => Some(Message::HistoryCancelDelete),
        };
    }
    if let Some(c) = plain_char(key) {
        let mut next = model.history_panel.query.clone();
        next.push(c);
        return Some(Message::HistoryQuery(next));
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc | KeyCode::F(2) => Some(Message::CloseOverlay),
        KeyCode::Char('h') if ctrl => Some(Message::CloseOverlay),
        KeyCode::Char('d') if ctrl => Some(Message::HistoryRequestDelete),
        KeyCode::Up => Some(Message::HistoryUp),
        KeyCode::Down => Some(Message::HistoryDown),
        KeyCode::Enter => Some(Message::HistoryLoadSelected),
        KeyCode::Delete => Some(Message::HistoryRequestDelete),
        KeyCode::Backspace => {
            let mut next = model.history_panel.query.clone();
            next.pop();
            Some(Message::HistoryQuery(next))
        }
        _ => None,
    }
}

fn settings_key(key: KeyEvent, model: &Model) -> Option<Message> {
    if let Some(input) = &model.settings_panel.color_input {
        if let Some(c) = plain_char(key) {
            let mut next = input.clone();
            next.push(c);
            return Some(Message::SettingsColorInput(next));
        }
        return match key.code {
            KeyCode::Esc => Some(Message::SettingsColorCancel),
            KeyCode::Enter => Some(Message::SettingsColorCommit),
            KeyCode::Backspace => {
                let mut next = input.clone();
                next.pop();
                Some(Message::SettingsColorInput(next))
            }
            _ => None,
        };
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc | KeyCode::F(3) => Some(Message::CloseOverlay),
        KeyCode::Char('g') if ctrl => Some(Message::CloseOverlay),
        KeyCode::Up | KeyCode::Char('k') => Some(Message::SettingsUp),
        KeyCode::Down | KeyCode::Char('j') => Some(Message::SettingsDown),
        KeyCode::Left | KeyCode::Char('h') => Some(Message::SettingsAdjust(-1)),
        KeyCode::Right | KeyCode::Char('l') => Some(Message::SettingsAdjust(1)),
        KeyCode::Enter | KeyCode::Char(' ') => Some(Message::SettingsActivate),
        KeyCode::Char('r') => Some(Message::SettingsReset),
        _ => None,
    }
}

fn tutorial_key(key: KeyEvent, model: &Model) -> Option<Message> {
    if let Some(c) = plain_char(key) {
        let mut next = model.tutorial_panel.query.clone();
        next.push(c);
        return Some(Message::TutorialQuery(next));
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc | KeyCode::F(4) => Some(Message::CloseOverlay),
        KeyCode::Char('o') if ctrl => Some(Message::CloseOverlay),
        KeyCode::Char('y') if ctrl => Some(Message::TutorialCopy),
        KeyCode::Up => Some(Message::TutorialUp),
        KeyCode::Down => Some(Message::TutorialDown),
        KeyCode::Enter => Some(Message::TutorialInsert),
        KeyCode::Backspace => {
            let mut next = model.tutorial_panel.query.clone();
            next.pop();
            Some(Message::TutorialQuery(next))
        }
        _ => None,
    }
}

fn export_key(key: KeyEvent, model: &Model) -> Option<Message> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc | KeyCode::F(5) => Some(Message::CloseOverlay),
        KeyCode::Char('e') if ctrl => Some(Message::CloseOverlay),
        KeyCode::Up => Some(Message::ExportUp),
        KeyCode::Down => Some(Message::ExportDown),
        KeyCode::Enter => Some(Message::Export(model.selected_export_format())),
        KeyCode::Char('s') => Some(Message::Export(ExportFormat::Svg)),
        KeyCode::Char('p') => Some(Message::Export(ExportFormat::Png)),
        KeyCode::Char('j') => Some(Message::Export(ExportFormat::Jpeg)),
        _ => None,
    }
}

/// Buffer (line, col) under a click in the editor pane, if on a text row.
fn editor_position(model: &Model, pane: Rect, col: u16, row: u16) -> Option<(usize, usize)> {
    let inner = crate::ui::pane_inner(pane);
    if !point_in_rect(col, row, inner) {
        return None;
    }
    let line = model.editor_scroll_offset + usize::from(row - inner.y);
    if line >= model.editor.line_count() {
        return Some((
            model.editor.line_count().saturating_sub(1),
            usize::MAX,
        ));
    }
    let gutter = crate::ui::line_number_width(model.editor.line_count()) + 1;
    let text_col = usize::from(col.saturating_sub(inner.x + gutter));
    Some((line, text_col))
}

fn point_in_rect(col: u16, row: u16, rect: Rect) -> bool {
    col >= rect.x && col < rect.x + rect.width && row >= rect.y && row < rect.y + rect.height
}
