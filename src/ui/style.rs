//! Theming and color definitions.
//!
//! Chart cells take their colours from the active [`StyleConfig`], so the
//! preview follows the same theme and primary colour as exported files.
//! Pane chrome uses plain ANSI colours that adapt to the terminal palette.

use ratatui::style::{Color, Modifier, Style};

use crate::chart::{CellRole, ChartType};
use crate::settings::{StyleConfig, parse_hex_color};

/// Convert `#rrggbb` to a terminal colour. Unparseable input maps to `Reset`.
pub fn hex_to_color(hex: &str) -> Color {
    parse_hex_color(hex).map_or(Color::Reset, |(r, g, b)| Color::Rgb(r, g, b))
}

/// Base style of the preview canvas: theme text on theme background.
pub fn canvas_style(style: &StyleConfig) -> Style {
    let palette = style.palette();
    Style::default()
        .fg(hex_to_color(palette.text))
        .bg(hex_to_color(palette.background))
}

/// Style for one canvas cell.
pub fn cell_style(role: CellRole, chart_type: ChartType, style: &StyleConfig) -> Style {
    let palette = style.palette();
    let base = canvas_style(style);
    let depth_color = |depth: usize| match chart_type {
        ChartType::Flowchart => hex_to_color(&style.accent_hex()),
        ChartType::MindMap => hex_to_color(&style.branch_color(depth)),
    };
    match role {
        CellRole::Blank => base,
        CellRole::Edge(depth) => match chart_type {
            ChartType::Flowchart => base.fg(hex_to_color(palette.line)),
            ChartType::MindMap => base.fg(depth_color(depth)),
        },
        CellRole::EdgeLabel => base
            .fg(hex_to_color(palette.text))
            .bg(hex_to_color(palette.surface)),
        CellRole::NodeBorder(depth) => base.fg(depth_color(depth)),
        CellRole::NodeText(depth) if depth == 0 => base
            .fg(hex_to_color(palette.text))
            .add_modifier(Modifier::BOLD),
        CellRole::NodeText(_) => base.fg(hex_to_color(palette.text)),
    }
}

/// Border style of a pane, highlighted when it has focus.
pub fn pane_border(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

pub fn error_style() -> Style {
    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
}

pub fn dim_style() -> Style {
    Style::default().fg(Color::Indexed(245))
}

pub fn section_style() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{ChartTheme, ViewSettings};

    #[test]
    fn test_hex_to_color() {
        assert_eq!(hex_to_color("#3B82F6"), Color::Rgb(0x3B, 0x82, 0xF6));
        assert_eq!(hex_to_color("#fff"), Color::Rgb(255, 255, 255));
        assert_eq!(hex_to_color("blue"), Color::Reset);
    }

    #[test]
    fn test_flowchart_borders_use_primary_color() {
        let style = StyleConfig::default();
        let border = cell_style(CellRole::NodeBorder(0), ChartType::Flowchart, &style);
        assert_eq!(border.fg, Some(Color::Rgb(0x3B, 0x82, 0xF6)));
    }

    #[test]
    fn test_mind_map_branches_cycle_colors() {
        let style = StyleConfig::default();
        let root = cell_style(CellRole::NodeBorder(0), ChartType::MindMap, &style);
        let child = cell_style(CellRole::NodeBorder(1), ChartType::MindMap, &style);
        assert_ne!(root.fg, child.fg);
    }

    #[test]
    fn test_canvas_follows_theme_background() {
        let settings = ViewSettings {
            theme: ChartTheme::Dark,
            ..ViewSettings::default()
        };
        let style = StyleConfig::from(&settings);
        assert_eq!(
            canvas_style(&style).bg,
            Some(hex_to_color(ChartTheme::Dark.palette().background))
        );
    }
}
