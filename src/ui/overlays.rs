use chrono::Local;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph, Wrap};

use crate::app::{Model, SettingsField};
use crate::export::ExportFormat;
use crate::settings::FONT_SIZE_RANGE;

use super::style::{dim_style, hex_to_color, section_style};

fn popup_block(title: impl Into<String>) -> Block<'static> {
    Block::default()
        .title(format!(" {} ", title.into()))
        .borders(Borders::ALL)
        .padding(Padding::horizontal(1))
        .style(Style::default().bg(Color::Black).fg(Color::White))
}

fn selected_style(selected: bool) -> Style {
    if selected {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    }
}

/// Keep `selected` on screen in a list of `visible` rows.
fn scroll_start(selected: usize, visible: usize) -> usize {
    if visible == 0 {
        return selected;
    }
    selected.saturating_sub(visible - 1)
}

pub fn render_history_overlay(model: &Model, frame: &mut Frame, area: Rect) {
    let popup_width = area.width.saturating_sub(12).max(48);
    let popup_height = area.height.saturating_sub(6).max(12);
    let popup = centered_popup_rect(popup_width, popup_height, area);
    let matches = model.history_matches();
    let panel = &model.history_panel;

    let mut lines: Vec<Line> = vec![
        Line::from(vec![
            Span::styled("Search: ", section_style()),
            Span::raw(panel.query.clone()),
            Span::styled("_", dim_style()),
        ]),
        Line::raw(""),
    ];

    if matches.is_empty() {
        let empty = if model.history.is_empty() {
            "No saved charts yet. Ctrl+S saves the current source."
        } else {
            "No matches"
        };
        lines.push(Line::styled(empty, dim_style()));
    }

    // Two rows per entry, plus search, blank and footer rows.
    let visible = usize::from(popup_height.saturating_sub(6)) / 2;
    let start = scroll_start(panel.selected, visible);
    for (idx, entry) in matches.iter().enumerate().skip(start).take(visible) {
        let selected = idx == panel.selected;
        let marker = if selected { ">" } else { " " };
        let updated = entry
            .updated_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M");
        lines.push(Line::from(vec![
            Span::styled(
                format!("{marker} {}", entry.title),
                selected_style(selected).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}  {updated}", entry.chart_type.label()),
                dim_style(),
            ),
        ]));
        lines.push(Line::styled(format!("    {}", entry.preview()), dim_style()));
    }

    let footer = if let Some(id) = &panel.pending_delete {
        let title = model
            .history
            .get(id)
            .map_or("entry", |entry| entry.title.as_str());
        Line::styled(
            format!("Delete \"{title}\"? y/Enter confirms, any other key cancels"),
            Style::default().fg(Color::Yellow),
        )
    } else {
        Line::styled(
            "Enter load \u{2502} Del delete \u{2502} type to search \u{2502} Esc closes",
            dim_style(),
        )
    };

    let block = popup_block(format!("History ({})", model.history.len()));
    render_with_footer(frame, popup, block, lines, footer);
}

pub fn render_settings_overlay(model: &Model, frame: &mut Frame, area: Rect) {
    let popup = centered_popup_rect(52, 13, area);
    let settings = &model.settings;
    let panel = &model.settings_panel;

    let mut lines: Vec<Line> = Vec::new();
    for field in SettingsField::ALL {
        let selected = field == panel.field;
        let marker = if selected { ">" } else { " " };
        let label = Span::styled(
            format!("{marker} {:<16}", field.label()),
            selected_style(selected),
        );
        let value: Vec<Span> = match field {
            SettingsField::Theme => vec![Span::raw(format!("< {} >", settings.theme.name()))],
            SettingsField::FontFamily => vec![Span::raw(format!("< {} >", settings.font_family))],
            SettingsField::FontSize => vec![Span::raw(format!(
                "< {}px >  ({}-{})",
                settings.font_size,
                FONT_SIZE_RANGE.start(),
                FONT_SIZE_RANGE.end()
            ))],
            SettingsField::PrimaryColor => match &panel.color_input {
                Some(input) => vec![
                    Span::styled(format!("{input}_"), Style::default().fg(Color::Yellow)),
                    Span::styled("  Enter applies", dim_style()),
                ],
                None => vec![
                    Span::styled(
                        "\u{2588}\u{2588} ",
                        Style::default().fg(hex_to_color(&settings.primary_color)),
                    ),
                    Span::raw(settings.primary_color.clone()),
                ],
            },
            SettingsField::Reset => Vec::new(),
        };
        let mut spans = vec![label, Span::raw(" ")];
        spans.extend(value);
        lines.push(Line::from(spans));
    }
    lines.push(Line::raw(""));
    lines.push(Line::styled(
        "Changes apply to the preview and exports.",
        dim_style(),
    ));

    let footer = Line::styled(
        "Up/Down select \u{2502} Left/Right change \u{2502} Enter edit \u{2502} r reset",
        dim_style(),
    );
    render_with_footer(frame, popup, popup_block("Settings"), lines, footer);
}

pub fn render_tutorial_overlay(model: &Model, frame: &mut Frame, area: Rect) {
    let popup_width = area.width.saturating_sub(8).max(56);
    let popup_height = area.height.saturating_sub(4).max(16);
    let popup = centered_popup_rect(popup_width, popup_height, area);
    let matches = model.tutorial_matches();
    let panel = &model.tutorial_panel;

    frame.render_widget(Clear, popup);
    let block = popup_block("Tutorial");
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let [search_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(inner);
    let [list_area, detail_area] =
        Layout::horizontal([Constraint::Percentage(35), Constraint::Percentage(65)])
            .areas(body_area);

    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("Search: ", section_style()),
            Span::raw(panel.query.clone()),
            Span::styled("_", dim_style()),
        ])),
        search_area,
    );

    let visible = usize::from(list_area.height);
    let start = scroll_start(panel.selected, visible);
    let list: Vec<Line> = if matches.is_empty() {
        vec![Line::styled("No matches", dim_style())]
    } else {
        matches
            .iter()
            .enumerate()
            .skip(start)
            .take(visible)
            .map(|(idx, section)| {
                let selected = idx == panel.selected;
                let marker = if selected { ">" } else { " " };
                Line::styled(
                    format!("{marker} {} ({})", section.title, section.chart_type.label()),
                    selected_style(selected),
                )
            })
            .collect()
    };
    frame.render_widget(Paragraph::new(list), list_area);

    if let Some(section) = model.selected_tutorial() {
        let mut detail = vec![
            Line::styled(section.title, section_style()),
            Line::raw(section.explanation),
            Line::raw(""),
        ];
        detail.extend(
            section
                .code
                .lines()
                .map(|line| Line::styled(line.to_string(), Style::default().fg(Color::Cyan))),
        );
        frame.render_widget(
            Paragraph::new(detail).wrap(Wrap { trim: false }),
            detail_area,
        );
    }

    frame.render_widget(
        Paragraph::new(Line::styled(
            "Enter insert \u{2502} Ctrl+Y copy \u{2502} type to search \u{2502} Esc closes",
            dim_style(),
        )),
        footer_area,
    );
}

pub fn render_export_overlay(model: &Model, frame: &mut Frame, area: Rect) {
    let popup = centered_popup_rect(52, 11, area);
    let mut lines: Vec<Line> = Vec::new();
    for (idx, format) in ExportFormat::ALL.iter().enumerate() {
        let selected = idx == model.export_selected;
        let marker = if selected { ">" } else { " " };
        let detail = match format {
            ExportFormat::Svg => "vector, current zoom",
            ExportFormat::Png => "2x raster",
            ExportFormat::Jpeg => "2x raster, white background",
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!("{marker} {:<5}", format.label()),
                selected_style(selected),
            ),
            Span::styled(format!("  {detail}"), dim_style()),
        ]));
    }
    lines.push(Line::raw(""));
    lines.push(Line::raw(format!(
        "Directory: {}",
        model.export_dir.display()
    )));
    if model.current_visual().is_none() {
        lines.push(Line::styled(
            "Nothing rendered yet",
            Style::default().fg(Color::Yellow),
        ));
    }

    let footer = Line::styled(
        "Enter export \u{2502} s/p/j pick format \u{2502} Esc closes",
        dim_style(),
    );
    render_with_footer(frame, popup, popup_block("Export"), lines, footer);
}

pub fn render_help_overlay(model: &Model, frame: &mut Frame, area: Rect) {
    let popup_width = area.width.saturating_sub(6).max(48);
    let popup_height = area.height.saturating_sub(4).max(12);
    let popup = centered_popup_rect(popup_width, popup_height, area);

    let path_or = |path: Option<&std::path::PathBuf>, fallback: &str| {
        path.map_or_else(|| fallback.to_string(), |p| p.display().to_string())
    };
    let global_cfg = path_or(model.config_global_path.as_ref(), "<unknown>");
    let local_cfg = path_or(model.config_local_path.as_ref(), "<none>");
    let state = path_or(model.state_path.as_ref(), "<in memory>");

    let mut left: Vec<Line> = Vec::new();
    left.push(Line::styled("Chart", section_style()));
    left.push(Line::raw("  Ctrl+T        Switch flowchart / mind map"));
    left.push(Line::raw("  Ctrl+D        Cycle flowchart direction"));
    left.push(Line::raw("  Ctrl+L        Clear source"));
    left.push(Line::raw("  Ctrl+S        Save to history"));
    left.push(Line::raw(""));

    left.push(Line::styled("Panels", section_style()));
    left.push(Line::raw("  Ctrl+H / F2   History"));
    left.push(Line::raw("  Ctrl+G / F3   Settings"));
    left.push(Line::raw("  Ctrl+O / F4   Tutorial"));
    left.push(Line::raw("  Ctrl+E / F5   Export"));
    left.push(Line::raw("  Esc           Close panel"));
    left.push(Line::raw(""));

    left.push(Line::styled("Editor", section_style()));
    left.push(Line::raw("  Home/End      Line start / end"));
    left.push(Line::raw("  Ctrl+Arrows   Word movement"));
    left.push(Line::raw("  Ctrl+Home/End Buffer start / end"));
    left.push(Line::raw("  PgUp/PgDn     Scroll editor"));

    let mut right: Vec<Line> = Vec::new();
    right.push(Line::styled("Preview", section_style()));
    right.push(Line::raw("  Tab           Switch focus"));
    right.push(Line::raw("  Arrows / hjkl Pan"));
    right.push(Line::raw("  + / - / 0     Zoom in / out / reset"));
    right.push(Line::raw("  Ctrl+wheel    Zoom"));
    right.push(Line::raw("  Ctrl+W        Side by side / stacked"));
    right.push(Line::raw(""));

    right.push(Line::styled("Other", section_style()));
    right.push(Line::raw("  Ctrl+Q/C      Quit"));
    right.push(Line::raw("  F1            Toggle help"));
    right.push(Line::raw(""));

    right.push(Line::styled("Files", section_style()));
    right.push(Line::raw(format!("  State: {state}")));
    right.push(Line::raw(format!("  Global config: {global_cfg}")));
    right.push(Line::raw(format!("  Local override: {local_cfg}")));

    let block = popup_block("Help");
    frame.render_widget(Clear, popup);
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let [body, footer_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);
    let [left_area, right_area] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(body);
    frame.render_widget(Paragraph::new(left), left_area);
    frame.render_widget(Paragraph::new(right), right_area);
    frame.render_widget(
        Paragraph::new(Line::styled("Any key closes", dim_style())),
        footer_area,
    );
}

/// Draw a cleared popup with `lines` above a one-row footer.
fn render_with_footer(
    frame: &mut Frame,
    popup: Rect,
    block: Block<'static>,
    lines: Vec<Line>,
    footer: Line,
) {
    frame.render_widget(Clear, popup);
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let content_height = inner.height.saturating_sub(1);
    let content_area = Rect::new(inner.x, inner.y, inner.width, content_height);
    frame.render_widget(Paragraph::new(lines), content_area);

    let footer_area = Rect::new(inner.x, inner.y + content_height, inner.width, 1);
    frame.render_widget(Paragraph::new(footer), footer_area);
}

fn centered_popup_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(w) / 2);
    let y = area.y + (area.height.saturating_sub(h) / 2);
    Rect::new(x, y, w, h)
}
