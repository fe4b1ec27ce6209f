//! Laid-out charts in abstract cell units and their character-grid raster.
//!
//! Both renderer adapters produce a [`Scene`]: nodes are axis-aligned boxes,
//! edges are orthogonal polylines. One scene unit is one terminal cell at
//! 100 % zoom, which keeps the preview raster and the SVG export in step.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const UP: u8 = 1;
const DOWN: u8 = 2;
const LEFT: u8 = 4;
const RIGHT: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeShape {
    Rect,
    Round,
    Stadium,
    Circle,
    Diamond,
    Hexagon,
    Subroutine,
    Cylinder,
    Asymmetric,
    Parallelogram,
    /// Bare label with no outline (mind-map topics).
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EdgeStroke {
    #[default]
    Solid,
    Dotted,
    Thick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EdgeHead {
    #[default]
    None,
    Arrow,
    Cross,
    Circle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneNode {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
    pub label: String,
    pub shape: NodeShape,
    /// Tree depth for mind maps, rank for flowcharts.
    pub depth: usize,
}

impl SceneNode {
    pub const fn center_x(&self) -> usize {
        self.x + self.width / 2
    }

    pub const fn center_y(&self) -> usize {
        self.y + self.height / 2
    }

    pub const fn right(&self) -> usize {
        self.x + self.width
    }

    pub const fn bottom(&self) -> usize {
        self.y + self.height
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneEdge {
    /// Orthogonal polyline. The last point is the cell the head is drawn in.
    pub points: Vec<(usize, usize)>,
    pub label: Option<String>,
    /// Centre cell for the label, when there is one.
    pub label_at: Option<(usize, usize)>,
    pub stroke: EdgeStroke,
    pub head: EdgeHead,
    pub depth: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scene {
    pub width: usize,
    pub height: usize,
    pub nodes: Vec<SceneNode>,
    pub edges: Vec<SceneEdge>,
}

impl Scene {
    /// Grow the scene bounds to cover every node, edge point and label.
    pub fn fit_bounds(&mut self, margin: usize) {
        let mut width = 0;
        let mut height = 0;
        for node in &self.nodes {
            width = width.max(node.right());
            height = height.max(node.bottom());
        }
        for edge in &self.edges {
            for &(x, y) in &edge.points {
                width = width.max(x + 1);
                height = height.max(y + 1);
            }
            if let (Some(label), Some((x, y))) = (&edge.label, edge.label_at) {
                width = width.max(x + label.width() / 2 + 2);
                height = height.max(y + 1);
            }
        }
        self.width = width + margin;
        self.height = height + margin;
    }

    /// Size in cells of the grid [`Scene::to_canvas`] produces at `scale`.
    pub fn canvas_size(&self, scale: f32) -> (usize, usize) {
        let scale = scale.clamp(0.1, 5.0);
        (
            scale_coord(self.width, scale).max(1),
            scale_coord(self.height, scale).max(1),
        )
    }

    /// Rasterise at `scale` (1.0 = one scene unit per cell).
    pub fn to_canvas(&self, scale: f32) -> Canvas {
        let scale = scale.clamp(0.1, 5.0);
        let map = |v: usize| scale_coord(v, scale);

        let (width, height) = self.canvas_size(scale);
        let mut canvas = Canvas::new(width, height);

        for edge in &self.edges {
            let points: Vec<(usize, usize)> =
                edge.points.iter().map(|&(x, y)| (map(x), map(y))).collect();
            canvas.draw_polyline(&points, edge.stroke, CellRole::Edge(edge.depth));
        }

        for node in &self.nodes {
            let x0 = map(node.x);
            let y0 = map(node.y);
            let width = map(node.right()).saturating_sub(x0).max(1);
            let height = map(node.bottom()).saturating_sub(y0).max(1);
            canvas.draw_node(node, x0, y0, width, height);
        }

        for edge in &self.edges {
            let points: Vec<(usize, usize)> =
                edge.points.iter().map(|&(x, y)| (map(x), map(y))).collect();
            canvas.draw_head(&points, edge.head, CellRole::Edge(edge.depth));
            if let (Some(label), Some((lx, ly))) = (&edge.label, edge.label_at) {
                let padded = format!(" {label} ");
                let x = map(lx).saturating_sub(padded.width() / 2);
                canvas.put_str(x, map(ly), &padded, usize::MAX, CellRole::EdgeLabel);
            }
        }

        canvas
    }
}

/// What a canvas cell depicts, used by the preview to pick colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellRole {
    #[default]
    Blank,
    Edge(usize),
    EdgeLabel,
    NodeBorder(usize),
    NodeText(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub role: CellRole,
    /// Right half of a double-width character.
    pub continuation: bool,
    links: u8,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            role: CellRole::Blank,
            continuation: false,
            links: 0,
        }
    }
}

/// A character grid rasterised from a [`Scene`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); width * height],
        }
    }

    pub const fn width(&self) -> usize {
        self.width
    }

    pub const fn height(&self) -> usize {
        self.height
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get(y * self.width + x)
    }

    fn cell_mut(&mut self, x: usize, y: usize) -> Option<&mut Cell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get_mut(y * self.width + x)
    }

    /// Cells of row `y`, for styled rendering.
    pub fn row(&self, y: usize) -> &[Cell] {
        if y >= self.height {
            return &[];
        }
        &self.cells[y * self.width..(y + 1) * self.width]
    }

    /// Plain text of row `y` with trailing blanks removed.
    pub fn row_text(&self, y: usize) -> String {
        let text: String = self
            .row(y)
            .iter()
            .filter(|cell| !cell.continuation)
            .map(|cell| cell.ch)
            .collect();
        text.trim_end().to_string()
    }

    pub fn lines(&self) -> Vec<String> {
        (0..self.height).map(|y| self.row_text(y)).collect()
    }

    fn set(&mut self, x: usize, y: usize, ch: char, role: CellRole) {
        if let Some(cell) = self.cell_mut(x, y) {
            *cell = Cell {
                ch,
                role,
                continuation: false,
                links: 0,
            };
        }
    }

    fn link(&mut self, x: usize, y: usize, bits: u8, stroke: EdgeStroke, role: CellRole) {
        if let Some(cell) = self.cell_mut(x, y) {
            let links = if matches!(cell.role, CellRole::Edge(_)) {
                cell.links | bits
            } else {
                bits
            };
            *cell = Cell {
                ch: line_glyph(links, stroke),
                role,
                continuation: false,
                links,
            };
        }
    }

    /// Write `text` from `(x, y)`, at most `max_width` columns. Returns the
    /// number of columns written.
    pub fn put_str(
        &mut self,
        x: usize,
        y: usize,
        text: &str,
        max_width: usize,
        role: CellRole,
    ) -> usize {
        let mut col = 0;
        for ch in text.chars() {
            let w = ch.width().unwrap_or(0);
            if w == 0 {
                continue;
            }
            if col + w > max_width || x + col + w > self.width {
                break;
            }
            self.set(x + col, y, ch, role);
            if w == 2
                && let Some(tail) = self.cell_mut(x + col + 1, y)
            {
                *tail = Cell {
                    ch: ' ',
                    role,
                    continuation: true,
                    links: 0,
                };
            }
            col += w;
        }
        col
    }

    fn draw_polyline(&mut self, points: &[(usize, usize)], stroke: EdgeStroke, role: CellRole) {
        for pair in points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if a.0 != b.0 && a.1 != b.1 {
                let elbow = (b.0, a.1);
                self.draw_segment(a, elbow, stroke, role);
                self.draw_segment(elbow, b, stroke, role);
            } else {
                self.draw_segment(a, b, stroke, role);
            }
        }
        if let [only] = points {
            self.link(only.0, only.1, 0, stroke, role);
        }
    }

    fn draw_segment(
        &mut self,
        a: (usize, usize),
        b: (usize, usize),
        stroke: EdgeStroke,
        role: CellRole,
    ) {
        if a == b {
            return;
        }
        if a.0 == b.0 {
            let (lo, hi) = (a.1.min(b.1), a.1.max(b.1));
            for y in lo..=hi {
                let mut bits = 0;
                if y > lo {
                    bits |= UP;
                }
                if y < hi {
                    bits |= DOWN;
                }
                self.link(a.0, y, bits, stroke, role);
            }
        } else {
            let (lo, hi) = (a.0.min(b.0), a.0.max(b.0));
            for x in lo..=hi {
                let mut bits = 0;
                if x > lo {
                    bits |= LEFT;
                }
                if x < hi {
                    bits |= RIGHT;
                }
                self.link(x, a.1, bits, stroke, role);
            }
        }
    }

    fn draw_head(&mut self, points: &[(usize, usize)], head: EdgeHead, role: CellRole) {
        let [.., prev, last] = points else {
            return;
        };
        let glyph = match head {
            EdgeHead::None => return,
            EdgeHead::Cross => '×',
            EdgeHead::Circle => '○',
            EdgeHead::Arrow => {
                if last.1 > prev.1 {
                    '▼'
                } else if last.1 < prev.1 {
                    '▲'
                } else if last.0 > prev.0 {
                    '▶'
                } else {
                    '◀'
                }
            }
        };
        self.set(last.0, last.1, glyph, role);
    }

    fn draw_node(&mut self, node: &SceneNode, x0: usize, y0: usize, width: usize, height: usize) {
        let border = CellRole::NodeBorder(node.depth);
        let text = CellRole::NodeText(node.depth);

        if node.shape == NodeShape::Text || width < 3 || height < 3 {
            let row = y0 + height / 2;
            let inner = if node.shape == NodeShape::Text {
                width.saturating_sub(2).max(1)
            } else {
                width
            };
            let start = if node.shape == NodeShape::Text && width > 2 {
                x0 + 1
            } else {
                x0
            };
            for x in x0..x0 + width {
                self.set(x, row, ' ', text);
            }
            let label = fit_label(&node.label, inner);
            self.put_str(start, row, &label, inner, text);
            return;
        }

        let g = BoxGlyphs::for_shape(node.shape);
        let x1 = x0 + width - 1;
        let y1 = y0 + height - 1;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let ch = match (x == x0, x == x1, y == y0, y == y1) {
                    (true, _, true, _) => g.top_left,
                    (_, true, true, _) => g.top_right,
                    (true, _, _, true) => g.bottom_left,
                    (_, true, _, true) => g.bottom_right,
                    (_, _, true, _) => g.top,
                    (_, _, _, true) => g.bottom,
                    (true, _, _, _) => g.left,
                    (_, true, _, _) => g.right,
                    _ => ' ',
                };
                let role = if ch == ' ' { text } else { border };
                self.set(x, y, ch, role);
            }
        }

        let inner = width - 2;
        let label = fit_label(&node.label, inner);
        let label_width = label.width();
        let x = x0 + 1 + (inner - label_width.min(inner)) / 2;
        self.put_str(x, y0 + height / 2, &label, inner, text);
    }
}

impl std::fmt::Display for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

struct BoxGlyphs {
    top_left: char,
    top_right: char,
    bottom_left: char,
    bottom_right: char,
    top: char,
    bottom: char,
    left: char,
    right: char,
}

impl BoxGlyphs {
    #[allow(clippy::too_many_arguments)]
    const fn new(corners: [char; 4], top: char, bottom: char, left: char, right: char) -> Self {
        Self {
            top_left: corners[0],
            top_right: corners[1],
            bottom_left: corners[2],
            bottom_right: corners[3],
            top,
            bottom,
            left,
            right,
        }
    }

    const fn for_shape(shape: NodeShape) -> Self {
        const SQUARE: [char; 4] = ['┌', '┐', '└', '┘'];
        const ROUND: [char; 4] = ['╭', '╮', '╰', '╯'];
        const SLANT: [char; 4] = ['╱', '╲', '╲', '╱'];
        match shape {
            NodeShape::Rect | NodeShape::Text => Self::new(SQUARE, '─', '─', '│', '│'),
            NodeShape::Round => Self::new(ROUND, '─', '─', '│', '│'),
            NodeShape::Stadium => Self::new(ROUND, '─', '─', '(', ')'),
            NodeShape::Circle => Self::new(['.', '.', '\'', '\''], '-', '-', '(', ')'),
            NodeShape::Diamond => Self::new(SLANT, '─', '─', '<', '>'),
            NodeShape::Hexagon => Self::new(SLANT, '─', '─', '│', '│'),
            NodeShape::Subroutine => Self::new(SQUARE, '─', '─', '║', '║'),
            NodeShape::Cylinder => Self::new(ROUND, '═', '─', '│', '│'),
            NodeShape::Asymmetric => Self::new(['─', '┐', '─', '┘'], '─', '─', '>', '│'),
            NodeShape::Parallelogram => Self::new(SQUARE, '─', '─', '/', '/'),
        }
    }
}

fn line_glyph(links: u8, stroke: EdgeStroke) -> char {
    let (vertical, horizontal) = match stroke {
        EdgeStroke::Solid => ('│', '─'),
        EdgeStroke::Dotted => ('┆', '┄'),
        EdgeStroke::Thick => ('┃', '━'),
    };
    match links {
        0 => '·',
        l if l & (LEFT | RIGHT) == 0 => vertical,
        l if l & (UP | DOWN) == 0 => horizontal,
        l if l == DOWN | RIGHT => '┌',
        l if l == DOWN | LEFT => '┐',
        l if l == UP | RIGHT => '└',
        l if l == UP | LEFT => '┘',
        l if l == UP | DOWN | RIGHT => '├',
        l if l == UP | DOWN | LEFT => '┤',
        l if l == DOWN | LEFT | RIGHT => '┬',
        l if l == UP | LEFT | RIGHT => '┴',
        _ => '┼',
    }
}

fn scale_coord(v: usize, scale: f32) -> usize {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    // Scene coordinates are small; the product is non-negative.
    let out = (v as f32 * scale).round() as usize;
    out
}

/// Truncate `label` to `max_width` columns, marking the cut with `…`.
pub fn fit_label(label: &str, max_width: usize) -> String {
    if label.width() <= max_width {
        return label.to_string();
    }
    if max_width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in label.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(x: usize, y: usize, width: usize, label: &str) -> SceneNode {
        SceneNode {
            x,
            y,
            width,
            height: 3,
            label: label.to_string(),
            shape: NodeShape::Rect,
            depth: 0,
        }
    }

    #[test]
    fn test_rect_node_rasterises_with_centered_label() {
        let mut scene = Scene {
            nodes: vec![node(0, 0, 7, "abc")],
            ..Scene::default()
        };
        scene.fit_bounds(0);
        let canvas = scene.to_canvas(1.0);
        assert_eq!(canvas.lines(), vec!["┌─────┐", "│ abc │", "└─────┘"]);
    }

    #[test]
    fn test_vertical_edge_with_arrow_head() {
        let mut scene = Scene {
            nodes: vec![node(0, 0, 5, "A"), node(0, 5, 5, "B")],
            edges: vec![SceneEdge {
                points: vec![(2, 3), (2, 4)],
                label: None,
                label_at: None,
                stroke: EdgeStroke::Solid,
                head: EdgeHead::Arrow,
                depth: 0,
            }],
            ..Scene::default()
        };
        scene.fit_bounds(0);
        let canvas = scene.to_canvas(1.0);
        assert_eq!(canvas.row_text(3), "  │");
        assert_eq!(canvas.row_text(4), "  ▼");
    }

    #[test]
    fn test_polyline_bends_use_corner_glyphs() {
        let mut canvas = Canvas::new(5, 3);
        canvas.draw_polyline(
            &[(0, 0), (0, 2), (4, 2)],
            EdgeStroke::Solid,
            CellRole::Edge(0),
        );
        assert_eq!(canvas.row_text(0), "│");
        assert_eq!(canvas.row_text(2), "└────");
        assert_eq!(canvas.cell(4, 2).map(|c| c.ch), Some('─'));
    }

    #[test]
    fn test_crossing_lines_join() {
        let mut canvas = Canvas::new(3, 3);
        canvas.draw_polyline(&[(1, 0), (1, 2)], EdgeStroke::Solid, CellRole::Edge(0));
        canvas.draw_polyline(&[(0, 1), (2, 1)], EdgeStroke::Solid, CellRole::Edge(0));
        assert_eq!(canvas.cell(1, 1).map(|c| c.ch), Some('┼'));
    }

    #[test]
    fn test_dotted_and_thick_strokes() {
        let mut canvas = Canvas::new(3, 2);
        canvas.draw_polyline(&[(0, 0), (2, 0)], EdgeStroke::Dotted, CellRole::Edge(0));
        canvas.draw_polyline(&[(0, 1), (2, 1)], EdgeStroke::Thick, CellRole::Edge(0));
        assert_eq!(canvas.row_text(0), "┄┄┄");
        assert_eq!(canvas.row_text(1), "━━━");
    }

    #[test]
    fn test_wide_characters_take_two_cells() {
        let mut canvas = Canvas::new(6, 1);
        let written = canvas.put_str(0, 0, "开始x", 10, CellRole::NodeText(0));
        assert_eq!(written, 5);
        assert!(canvas.cell(1, 0).is_some_and(|c| c.continuation));
        assert_eq!(canvas.row_text(0), "开始x");
    }

    #[test]
    fn test_fit_label_truncates_with_ellipsis() {
        assert_eq!(fit_label("hello", 10), "hello");
        assert_eq!(fit_label("hello world", 6), "hello…");
        assert_eq!(fit_label("abc", 0), "");
    }

    #[test]
    fn test_zoom_scales_canvas_dimensions() {
        let mut scene = Scene {
            nodes: vec![node(0, 0, 10, "label")],
            ..Scene::default()
        };
        scene.fit_bounds(0);
        assert_eq!(scene.to_canvas(2.0).width(), 20);
        assert_eq!(scene.to_canvas(0.5).width(), 5);
    }

    #[test]
    fn test_small_nodes_fall_back_to_bare_label() {
        let mut scene = Scene {
            nodes: vec![node(0, 0, 10, "label")],
            ..Scene::default()
        };
        scene.fit_bounds(0);
        let canvas = scene.to_canvas(0.5);
        assert!(canvas.lines().iter().any(|l| l.starts_with("labe")));
    }

    #[test]
    fn test_edge_label_is_drawn_over_line() {
        let mut scene = Scene {
            edges: vec![SceneEdge {
                points: vec![(0, 1), (10, 1)],
                label: Some("yes".into()),
                label_at: Some((5, 1)),
                stroke: EdgeStroke::Solid,
                head: EdgeHead::Arrow,
                depth: 0,
            }],
            ..Scene::default()
        };
        scene.fit_bounds(0);
        let canvas = scene.to_canvas(1.0);
        assert_eq!(canvas.row_text(1), "─── yes ──▶");
    }
}
