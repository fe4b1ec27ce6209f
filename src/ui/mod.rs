//! Terminal UI components.
//!
//! This module contains all UI-related code including:
//! - [`render`]: Header, editor, preview and status bars
//! - [`style`]: Mapping of chart cells and theme colours to terminal styles
//! - overlays for history, settings, tutorials, export and help

pub mod style;

mod overlays;
mod render;
mod status;

pub use render::{line_number_width, render};

use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::view::{EDITOR_HEIGHT_PERCENT, EDITOR_WIDTH_PERCENT, LayoutOrientation};

/// Screen regions for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenAreas {
    pub header: Rect,
    pub editor: Rect,
    pub preview: Rect,
    pub toast: Option<Rect>,
    pub status: Rect,
}

/// Split the terminal into header, panes, optional toast row and status bar.
pub fn screen_areas(area: Rect, layout: LayoutOrientation, toast_active: bool) -> ScreenAreas {
    let footer_rows = 1 + u16::from(toast_active);
    let header = Rect {
        height: area.height.min(1),
        ..area
    };
    let body = Rect {
        y: area.y + header.height,
        height: area.height.saturating_sub(header.height + footer_rows),
        ..area
    };
    let (editor, preview) = split_panes(body, layout);
    let toast = toast_active.then(|| Rect {
        y: area.y + area.height.saturating_sub(2),
        height: 1,
        ..area
    });
    let status = Rect {
        y: area.y + area.height.saturating_sub(1),
        height: area.height.min(1),
        ..area
    };
    ScreenAreas {
        header,
        editor,
        preview,
        toast,
        status,
    }
}

/// Editor and preview rectangles for the given orientation.
pub fn split_panes(area: Rect, layout: LayoutOrientation) -> (Rect, Rect) {
    let (direction, percent) = match layout {
        LayoutOrientation::Horizontal => (Direction::Horizontal, EDITOR_WIDTH_PERCENT),
        LayoutOrientation::Vertical => (Direction::Vertical, EDITOR_HEIGHT_PERCENT),
    };
    let chunks = Layout::default()
        .direction(direction)
        .constraints([
            Constraint::Percentage(percent),
            Constraint::Percentage(100 - percent),
        ])
        .split(area);
    (chunks[0], chunks[1])
}

/// Content area of a bordered pane.
pub const fn pane_inner(pane: Rect) -> Rect {
    Rect {
        x: pane.x.saturating_add(1),
        y: pane.y.saturating_add(1),
        width: pane.width.saturating_sub(2),
        height: pane.height.saturating_sub(2),
    }
}

#[cfg(test)]
mod tests;
