use super::*;
use crate::app::{Message, Model, update};
use crate::chart::ChartType;
use crate::document::Document;
use crate::store::PersistedState;
use crate::view::Overlay;
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use std::time::{Duration, Instant};

fn create_test_terminal() -> Terminal<TestBackend> {
    let backend = TestBackend::new(100, 30);
    Terminal::new(backend).unwrap()
}

fn model_with(source: &str, chart_type: ChartType) -> Model {
    Model::new(
        Document::from_source(source.to_string(), chart_type),
        PersistedState::default(),
        (100, 30),
    )
}

/// Run the first render to completion.
fn settle(model: &mut Model) {
    model.schedule_initial_render(0);
    model.pipeline.tick(0);
    let deadline = Instant::now() + Duration::from_secs(5);
    while model.pipeline.is_rendering() {
        model.pipeline.poll();
        assert!(Instant::now() < deadline, "render did not finish");
        std::thread::sleep(Duration::from_millis(5));
    }
}

/// Text inside the preview pane, row by row.
fn preview_text(model: &Model) -> String {
    let mut terminal = create_test_terminal();
    terminal.draw(|frame| render(model, frame)).unwrap();
    let buffer = terminal.backend().buffer();
    let areas = screen_areas(
        Rect::new(0, 0, 100, 30),
        model.view.layout,
        model.active_toast().is_some(),
    );
    let inner = pane_inner(areas.preview);
    let mut out = String::new();
    for y in inner.y..inner.y + inner.height {
        for x in inner.x..inner.x + inner.width {
            out.push_str(buffer[(x, y)].symbol());
        }
        out.push('\n');
    }
    out
}

fn screen_text(model: &Model) -> String {
    let mut terminal = create_test_terminal();
    terminal.draw(|frame| render(model, frame)).unwrap();
    let buffer = terminal.backend().buffer();
    buffer.content().iter().map(|c| c.symbol()).collect()
}

#[test]
fn test_screen_areas_horizontal_split() {
    let areas = screen_areas(Rect::new(0, 0, 100, 30), LayoutOrientation::Horizontal, false);
    assert_eq!(areas.header, Rect::new(0, 0, 100, 1));
    assert_eq!(areas.status, Rect::new(0, 29, 100, 1));
    assert!(areas.toast.is_none());
    assert_eq!(areas.editor.y, 1);
    assert_eq!(areas.editor.height, 28);
    assert_eq!(areas.editor.width, 40);
    assert_eq!(areas.preview.x, 40);
    assert_eq!(areas.preview.width, 60);
}

#[test]
fn test_screen_areas_vertical_split_with_toast() {
    let areas = screen_areas(Rect::new(0, 0, 100, 30), LayoutOrientation::Vertical, true);
    assert_eq!(areas.toast, Some(Rect::new(0, 28, 100, 1)));
    assert_eq!(areas.editor.width, 100);
    assert_eq!(areas.editor.height + areas.preview.height, 27);
    assert_eq!(areas.preview.y, areas.editor.y + areas.editor.height);
}

#[test]
fn test_pane_inner_strips_border() {
    assert_eq!(pane_inner(Rect::new(2, 3, 10, 6)), Rect::new(3, 4, 8, 4));
    assert_eq!(pane_inner(Rect::new(0, 0, 1, 1)).width, 0);
}

#[test]
fn test_line_number_width() {
    assert_eq!(line_number_width(9), 1);
    assert_eq!(line_number_width(10), 2);
    assert_eq!(line_number_width(12_345), 5);
}

#[test]
fn test_render_shows_editor_source_and_header() {
    let model = model_with("graph TD\nA[Alpha] --> B[Beta]", ChartType::Flowchart);
    let content = screen_text(&model);
    assert!(content.contains("chartpad"));
    assert!(content.contains("A[Alpha] --> B[Beta]"));
    assert!(content.contains("Flowchart source"));
}

#[test]
fn test_render_blank_source_shows_placeholder() {
    let mut model = model_with("   \n", ChartType::MindMap);
    settle(&mut model);
    let content = preview_text(&model);
    assert!(content.contains("Nothing to draw yet (Mind map)"));
}

#[test]
fn test_render_visual_draws_node_labels() {
    let mut model = model_with("graph LR\nA[Alpha] --> B[Beta]", ChartType::Flowchart);
    settle(&mut model);
    assert!(model.current_visual().is_some());
    let content = preview_text(&model);
    assert!(content.contains("Alpha"));
    assert!(content.contains("Beta"));
    assert!(!content.contains("-->"));
}

#[test]
fn test_render_error_panel() {
    let mut model = model_with("graph TD\nA --> B\nB -> C", ChartType::Flowchart);
    settle(&mut model);
    let content = preview_text(&model);
    assert!(content.contains("Syntax error"));
    assert!(content.contains("line 3"));
}

#[test]
fn test_render_toast_row() {
    let model = model_with("graph TD\nA", ChartType::Flowchart);
    let model = update(model, Message::ToggleFlowDirection);
    let content = screen_text(&model);
    assert!(content.contains("[info] Direction set to"));
}

#[test]
fn test_render_history_overlay_lists_entries() {
    let mut model = model_with("graph TD\nA[Saved node]", ChartType::Flowchart);
    model.save_snapshot(Some("Login flow".to_string()), chrono::Utc::now());
    let model = update(model, Message::ToggleHistory);
    assert_eq!(model.view.overlay(), Some(Overlay::History));
    let content = screen_text(&model);
    assert!(content.contains("History (1)"));
    assert!(content.contains("Login flow"));
}

#[test]
fn test_render_history_overlay_empty_hint() {
    let model = update(
        model_with("graph TD\nA", ChartType::Flowchart),
        Message::ToggleHistory,
    );
    let content = screen_text(&model);
    assert!(content.contains("No saved charts yet"));
}

#[test]
fn test_render_settings_overlay_shows_values() {
    let model = update(
        model_with("graph TD\nA", ChartType::Flowchart),
        Message::ToggleSettings,
    );
    let content = screen_text(&model);
    assert!(content.contains("Theme"));
    assert!(content.contains("#3B82F6"));
    assert!(content.contains("14px"));
}

#[test]
fn test_render_tutorial_overlay_shows_selected_code() {
    let model = update(
        model_with("graph TD\nA", ChartType::Flowchart),
        Message::ToggleTutorial,
    );
    let content = screen_text(&model);
    assert!(content.contains("Basic flowchart"));
    assert!(content.contains("A-->B;"));
}

#[test]
fn test_render_export_overlay_without_visual() {
    let model = update(
        model_with("graph TD\nA", ChartType::Flowchart),
        Message::ToggleExportMenu,
    );
    let content = screen_text(&model);
    assert!(content.contains("PNG"));
    assert!(content.contains("Nothing rendered yet"));
}

#[test]
fn test_render_help_overlay() {
    let model = update(
        model_with("graph TD\nA", ChartType::Flowchart),
        Message::ToggleHelp,
    );
    let content = screen_text(&model);
    assert!(content.contains("Switch flowchart / mind map"));
    assert!(content.contains("<in memory>"));
}

#[test]
fn test_render_survives_tiny_terminal() {
    let mut model = model_with("graph TD\nA --> B", ChartType::Flowchart);
    settle(&mut model);
    let mut terminal = Terminal::new(TestBackend::new(3, 2)).unwrap();
    terminal.draw(|frame| render(&model, frame)).unwrap();
}
