use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::Model;
use crate::chart::{Canvas, ChartType, Visual};
use crate::render::Display;
use crate::view::{Focus, Overlay};

use super::style::{canvas_style, cell_style, dim_style, error_style, pane_border};
use super::{overlays, pane_inner, screen_areas, status};

/// Render the complete UI.
pub fn render(model: &Model, frame: &mut Frame) {
    let area = frame.area();
    let areas = screen_areas(area, model.view.layout, model.active_toast().is_some());

    status::render_header(model, frame, areas.header);
    render_editor(model, frame, areas.editor);
    render_preview(model, frame, areas.preview);
    if let Some(toast_area) = areas.toast {
        status::render_toast_bar(model, frame, toast_area);
    }
    status::render_status_bar(model, frame, areas.status);

    match model.view.overlay() {
        Some(Overlay::History) => overlays::render_history_overlay(model, frame, area),
        Some(Overlay::Settings) => overlays::render_settings_overlay(model, frame, area),
        Some(Overlay::Tutorial) => overlays::render_tutorial_overlay(model, frame, area),
        Some(Overlay::Export) => overlays::render_export_overlay(model, frame, area),
        Some(Overlay::Help) => overlays::render_help_overlay(model, frame, area),
        None => {}
    }
}

fn render_editor(model: &Model, frame: &mut Frame, area: Rect) {
    let buf = &model.editor;
    let focused = model.view.focus == Focus::Editor && model.view.overlay().is_none();
    let block = Block::default()
        .title(format!(" {} source ", model.document.chart_type().label()))
        .borders(Borders::ALL)
        .border_style(pane_border(focused));
    let inner = pane_inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    // Line number gutter width
    let total_lines = buf.line_count();
    let gutter_width = line_number_width(total_lines);

    let visible_height = inner.height as usize;
    let start = model.editor_scroll_offset.min(total_lines.saturating_sub(1));
    let end = (start + visible_height).min(total_lines);
    let cursor = buf.cursor();
    let cursor_style = if focused {
        Style::default().bg(Color::White).fg(Color::Black)
    } else {
        Style::default().bg(Color::DarkGray)
    };

    let mut content: Vec<Line> = Vec::new();
    for line_idx in start..end {
        let line_text = buf.line_at(line_idx).unwrap_or_default();
        let line_num = format!("{:>width$} ", line_idx + 1, width = gutter_width as usize);

        let mut spans = vec![Span::styled(line_num, Style::default().fg(Color::DarkGray))];

        if line_idx == cursor.line {
            // Cursor columns count chars, not bytes.
            let chars: Vec<char> = line_text.chars().collect();
            let col = cursor.col.min(chars.len());
            let before: String = chars[..col].iter().collect();
            let cursor_char = chars.get(col).map_or_else(|| " ".to_string(), char::to_string);
            let after: String = chars.get(col + 1..).unwrap_or_default().iter().collect();

            if !before.is_empty() {
                spans.push(Span::raw(before));
            }
            spans.push(Span::styled(cursor_char, cursor_style));
            if !after.is_empty() {
                spans.push(Span::raw(after));
            }
        } else {
            spans.push(Span::raw(line_text));
        }

        content.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(content), inner);
}

fn render_preview(model: &Model, frame: &mut Frame, area: Rect) {
    let focused = model.view.focus == Focus::Preview && model.view.overlay().is_none();
    let mut title = format!(" Preview {}% ", model.view.zoom());
    if model.loading {
        title.push_str("- rendering... ");
    }
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(pane_border(focused));
    let inner = pane_inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    match model.pipeline.display() {
        Display::Empty => {
            let text = Line::styled("Rendering...", dim_style());
            frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), inner);
        }
        Display::Placeholder(chart_type) => render_placeholder(*chart_type, frame, inner),
        Display::Visual(visual) => render_visual(model, visual, frame, inner),
        Display::Error(message) => render_error(message, frame, inner),
    }
}

fn render_placeholder(chart_type: ChartType, frame: &mut Frame, area: Rect) {
    let hint = match chart_type {
        ChartType::Flowchart => "Start with `graph TD` and add nodes like A[Start] --> B[End]",
        ChartType::MindMap => "Start with a `# Heading` and add `## Branches` or `- items`",
    };
    let lines = vec![
        Line::raw(""),
        Line::styled(
            format!("Nothing to draw yet ({})", chart_type.label()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Line::raw(""),
        Line::styled(hint, dim_style()),
        Line::styled("Ctrl+O opens the syntax tutorial", dim_style()),
    ];
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn render_error(message: &str, frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::styled("Syntax error", error_style()),
        Line::raw(""),
        Line::raw(message.to_string()),
        Line::raw(""),
        Line::styled(
            "The preview updates as soon as the source is valid.",
            dim_style(),
        ),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn render_visual(model: &Model, visual: &Visual, frame: &mut Frame, area: Rect) {
    let canvas = visual.to_canvas(model.view.scale());
    let lines = canvas_lines(
        &canvas,
        visual,
        usize::from(model.view.pan_x),
        usize::from(model.view.pan_y),
        area,
    );
    frame.render_widget(
        Paragraph::new(lines).style(canvas_style(&visual.style)),
        area,
    );
}

/// The visible window of `canvas`, starting at (`pan_x`, `pan_y`).
pub(super) fn canvas_lines(
    canvas: &Canvas,
    visual: &Visual,
    pan_x: usize,
    pan_y: usize,
    area: Rect,
) -> Vec<Line<'static>> {
    let width = usize::from(area.width);
    let height = usize::from(area.height);
    let mut lines = Vec::with_capacity(height);

    for y in pan_y..(pan_y + height).min(canvas.height()) {
        let mut spans: Vec<Span<'static>> = Vec::new();
        let mut run = String::new();
        let mut run_style: Option<Style> = None;
        let row = canvas.row(y);
        let end = (pan_x + width).min(row.len());

        for (x, cell) in row.iter().enumerate().take(end).skip(pan_x) {
            let (ch, style) = if cell.continuation {
                if x != pan_x {
                    continue;
                }
                // Left half of a wide char scrolled out of view.
                (' ', cell_style(cell.role, visual.chart_type, &visual.style))
            } else if x + 1 == end && unicode_width::UnicodeWidthChar::width(cell.ch) == Some(2)
            {
                // Wide char cut by the right edge.
                (' ', cell_style(cell.role, visual.chart_type, &visual.style))
            } else {
                (
                    cell.ch,
                    cell_style(cell.role, visual.chart_type, &visual.style),
                )
            };
            if run_style != Some(style) && !run.is_empty() {
                spans.push(Span::styled(
                    std::mem::take(&mut run),
                    run_style.unwrap_or_default(),
                ));
            }
            run_style = Some(style);
            run.push(ch);
        }
        if !run.is_empty() {
            spans.push(Span::styled(run, run_style.unwrap_or_default()));
        }
        lines.push(Line::from(spans));
    }

    lines
}

/// Calculate the width needed for line numbers.
pub const fn line_number_width(total_lines: usize) -> u16 {
    if total_lines < 10 {
        1
    } else if total_lines < 100 {
        2
    } else if total_lines < 1_000 {
        3
    } else if total_lines < 10_000 {
        4
    } else if total_lines < 100_000 {
        5
    } else {
        6
    }
}
