use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::Model;
use crate::chart::ChartType;
use crate::render::RenderPhase;

pub fn render_header(model: &Model, frame: &mut Frame, area: Rect) {
    let active = model.document.chart_type();
    let mut spans = vec![Span::styled(
        " chartpad ",
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];
    for chart_type in ChartType::ALL {
        let style = if chart_type == active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::raw(" "));
        spans.push(Span::styled(format!(" {} ", chart_type.label()), style));
    }
    spans.push(Span::styled(
        "  Ctrl+T switch  Ctrl+S save  Ctrl+H history  Ctrl+O tutorial  Ctrl+E export",
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black)),
        area,
    );
}

pub fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let cursor = model.editor.cursor();
    let phase = match model.pipeline.phase() {
        RenderPhase::Idle | RenderPhase::Settled => "",
        RenderPhase::Debouncing => " [typing]",
        RenderPhase::Rendering => " [rendering]",
        RenderPhase::Failed => " [error]",
    };
    let status = format!(
        " {}  Ln {}, Col {}  Zoom {}%  {}  History {}{}  F1:help",
        model.document.chart_type().label(),
        cursor.line + 1,
        cursor.col + 1,
        model.view.zoom(),
        model.view.layout.label(),
        model.history.len(),
        phase
    );

    let status_bar =
        Paragraph::new(status).style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(status_bar, area);
}

pub fn render_toast_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some((message, level)) = model.active_toast() else {
        return;
    };
    let (prefix, style) = match level {
        crate::app::ToastLevel::Info => (
            "[info]",
            Style::default().bg(Color::DarkGray).fg(Color::White),
        ),
        crate::app::ToastLevel::Warning => (
            "[warn]",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
        crate::app::ToastLevel::Error => {
            ("[error]", Style::default().bg(Color::Red).fg(Color::White))
        }
    };
    let toast = Paragraph::new(format!("{prefix} {message}")).style(style);
    frame.render_widget(toast, area);
}
