//! SVG serialisation of a [`Visual`].
//!
//! Scene cells map to a fixed fraction of the font size so exported charts
//! keep the proportions of the terminal preview.

use unicode_width::UnicodeWidthStr;

use super::scene::{EdgeHead, EdgeStroke, NodeShape, SceneEdge, SceneNode};
use super::{ChartType, Visual};
use crate::settings::StyleConfig;

/// Cell width as a fraction of the font size.
const CELL_WIDTH_EM: f32 = 0.62;
/// Cell height as a fraction of the font size.
const CELL_HEIGHT_EM: f32 = 1.3;

struct Metrics {
    cell_w: f32,
    cell_h: f32,
}

impl Metrics {
    #[allow(clippy::cast_precision_loss)]
    fn x(&self, cells: usize) -> f32 {
        cells as f32 * self.cell_w
    }

    #[allow(clippy::cast_precision_loss)]
    fn y(&self, cells: usize) -> f32 {
        cells as f32 * self.cell_h
    }

    fn cx(&self, cell: usize) -> f32 {
        self.x(cell) + self.cell_w / 2.0
    }

    fn cy(&self, cell: usize) -> f32 {
        self.y(cell) + self.cell_h / 2.0
    }
}

pub(super) fn render_svg(visual: &Visual, scale: f32) -> String {
    let style = &visual.style;
    let palette = style.palette();
    let scale = scale.clamp(0.1, 5.0);
    let font_px = style.font_px() * scale;
    let m = Metrics {
        cell_w: font_px * CELL_WIDTH_EM,
        cell_h: font_px * CELL_HEIGHT_EM,
    };
    let width = m.x(visual.scene.width.max(1));
    let height = m.y(visual.scene.height.max(1));
    let accent = style.accent_hex();
    let fonts = escape_xml(&style.font_stack());

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.2}\" height=\"{height:.2}\" viewBox=\"0 0 {width:.2} {height:.2}\">"
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        palette.background
    ));
    svg.push_str("<defs>");
    svg.push_str(&format!(
        "<marker id=\"arrow\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"6\" markerHeight=\"6\" orient=\"auto-start-reverse\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{accent}\"/></marker>"
    ));
    svg.push_str(&format!(
        "<marker id=\"cross\" viewBox=\"0 0 10 10\" refX=\"5\" refY=\"5\" markerWidth=\"7\" markerHeight=\"7\" orient=\"auto\"><path d=\"M 1 1 L 9 9 M 9 1 L 1 9\" stroke=\"{accent}\" stroke-width=\"2\"/></marker>"
    ));
    svg.push_str(&format!(
        "<marker id=\"circle\" viewBox=\"0 0 10 10\" refX=\"5\" refY=\"5\" markerWidth=\"7\" markerHeight=\"7\" orient=\"auto\"><circle cx=\"5\" cy=\"5\" r=\"4\" fill=\"{}\" stroke=\"{accent}\" stroke-width=\"1.5\"/></marker>",
        palette.background
    ));
    svg.push_str("</defs>");

    for edge in &visual.scene.edges {
        let color = edge_color(visual, edge);
        svg.push_str(&edge_svg(edge, &m, &color));
    }

    for node in &visual.scene.nodes {
        svg.push_str(&node_svg(visual, node, &m, &fonts, font_px));
    }

    for edge in &visual.scene.edges {
        if let (Some(label), Some((lx, ly))) = (&edge.label, edge.label_at) {
            let text_w = m.x(label.width());
            let x = m.cx(lx);
            let y = m.cy(ly);
            svg.push_str(&format!(
                "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"4\" ry=\"4\" fill=\"{}\"/>",
                x - text_w / 2.0 - 4.0,
                y - m.cell_h / 2.0,
                text_w + 8.0,
                m.cell_h,
                palette.surface
            ));
            svg.push_str(&text_svg(x, y, "middle", &fonts, font_px, palette.text, label));
        }
    }

    svg.push_str("</svg>");
    svg
}

fn edge_color(visual: &Visual, edge: &SceneEdge) -> String {
    match visual.chart_type {
        ChartType::Flowchart => visual.style.accent_hex(),
        ChartType::MindMap => visual.style.branch_color(edge.depth),
    }
}

fn edge_svg(edge: &SceneEdge, m: &Metrics, color: &str) -> String {
    if edge.points.len() < 2 {
        return String::new();
    }
    let mut points: Vec<(f32, f32)> = edge.points.iter().map(|&(x, y)| (m.cx(x), m.cy(y))).collect();

    // Stretch the final segment by half a cell so heads touch the node outline.
    if edge.head != EdgeHead::None
        && let [.., prev, last] = points.as_mut_slice()
    {
        let dx = (last.0 - prev.0).signum() * m.cell_w / 2.0;
        let dy = (last.1 - prev.1).signum() * m.cell_h / 2.0;
        last.0 += dx;
        last.1 += dy;
    }

    let mut d = String::new();
    for (idx, (x, y)) in points.iter().enumerate() {
        let op = if idx == 0 { "M" } else { " L" };
        d.push_str(&format!("{op} {x:.2} {y:.2}"));
    }

    let (dash, stroke_width) = match edge.stroke {
        EdgeStroke::Solid => ("", 1.5),
        EdgeStroke::Dotted => (" stroke-dasharray=\"3 5\"", 1.5),
        EdgeStroke::Thick => ("", 3.0),
    };
    let marker = match edge.head {
        EdgeHead::None => "",
        EdgeHead::Arrow => " marker-end=\"url(#arrow)\"",
        EdgeHead::Cross => " marker-end=\"url(#cross)\"",
        EdgeHead::Circle => " marker-end=\"url(#circle)\"",
    };
    format!(
        "<path d=\"{d}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"{stroke_width}\" stroke-linejoin=\"round\"{dash}{marker}/>"
    )
}

fn node_svg(visual: &Visual, node: &SceneNode, m: &Metrics, fonts: &str, font_px: f32) -> String {
    let style: &StyleConfig = &visual.style;
    let palette = style.palette();
    let x = m.x(node.x);
    let y = m.y(node.y);
    let w = m.x(node.width);
    let h = m.y(node.height);
    let cx = x + w / 2.0;
    let cy = y + h / 2.0;

    if node.shape == NodeShape::Text {
        let color = style.branch_color(node.depth);
        let mut out = format!(
            "<line x1=\"{x:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{color}\" stroke-width=\"2\"/>",
            y + h,
            x + w,
            y + h
        );
        out.push_str(&text_svg(
            x + m.cell_w,
            cy,
            "start",
            fonts,
            font_px,
            palette.text,
            &node.label,
        ));
        return out;
    }

    let fill = style.accent_hex();
    let paint = format!("fill=\"{fill}\" stroke=\"{fill}\" stroke-width=\"1.5\"");
    let mut out = match node.shape {
        NodeShape::Rect | NodeShape::Text => {
            format!("<rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{w:.2}\" height=\"{h:.2}\" {paint}/>")
        }
        NodeShape::Round => format!(
            "<rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{w:.2}\" height=\"{h:.2}\" rx=\"8\" ry=\"8\" {paint}/>"
        ),
        NodeShape::Stadium => format!(
            "<rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{w:.2}\" height=\"{h:.2}\" rx=\"{:.2}\" ry=\"{:.2}\" {paint}/>",
            h / 2.0,
            h / 2.0
        ),
        NodeShape::Circle => format!(
            "<ellipse cx=\"{cx:.2}\" cy=\"{cy:.2}\" rx=\"{:.2}\" ry=\"{:.2}\" {paint}/>",
            w / 2.0,
            h / 2.0
        ),
        NodeShape::Diamond => polygon(
            &[(cx, y), (x + w, cy), (cx, y + h), (x, cy)],
            &paint,
        ),
        NodeShape::Hexagon => {
            let inset = (h / 2.0).min(w / 4.0);
            polygon(
                &[
                    (x + inset, y),
                    (x + w - inset, y),
                    (x + w, cy),
                    (x + w - inset, y + h),
                    (x + inset, y + h),
                    (x, cy),
                ],
                &paint,
            )
        }
        NodeShape::Parallelogram => {
            let skew = (h / 2.0).min(w / 4.0);
            polygon(
                &[(x + skew, y), (x + w, y), (x + w - skew, y + h), (x, y + h)],
                &paint,
            )
        }
        NodeShape::Asymmetric => {
            let notch = (h / 2.0).min(w / 4.0);
            polygon(
                &[(x, y), (x + w, y), (x + w, y + h), (x, y + h), (x + notch, cy)],
                &paint,
            )
        }
        NodeShape::Subroutine => {
            let inset = m.cell_w / 2.0;
            format!(
                "<rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{w:.2}\" height=\"{h:.2}\" {paint}/><line x1=\"{:.2}\" y1=\"{y:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{}\"/><line x1=\"{:.2}\" y1=\"{y:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{}\"/>",
                x + inset,
                x + inset,
                y + h,
                palette.background,
                x + w - inset,
                x + w - inset,
                y + h,
                palette.background
            )
        }
        NodeShape::Cylinder => {
            let ry = (h / 6.0).max(2.0);
            format!(
                "<path d=\"M {x:.2} {top:.2} A {rx:.2} {ry:.2} 0 0 1 {right:.2} {top:.2} L {right:.2} {bottom:.2} A {rx:.2} {ry:.2} 0 0 1 {x:.2} {bottom:.2} Z\" {paint}/><path d=\"M {x:.2} {top:.2} A {rx:.2} {ry:.2} 0 0 0 {right:.2} {top:.2}\" fill=\"none\" stroke=\"{}\"/>",
                palette.background,
                top = y + ry,
                bottom = y + h - ry,
                right = x + w,
                rx = w / 2.0,
            )
        }
    };
    out.push_str(&text_svg(cx, cy, "middle", fonts, font_px, "#ffffff", &node.label));
    out
}

fn polygon(points: &[(f32, f32)], paint: &str) -> String {
    let pts: Vec<String> = points
        .iter()
        .map(|(x, y)| format!("{x:.2},{y:.2}"))
        .collect();
    format!("<polygon points=\"{}\" {paint}/>", pts.join(" "))
}

fn text_svg(
    x: f32,
    y: f32,
    anchor: &str,
    fonts: &str,
    font_px: f32,
    fill: &str,
    text: &str,
) -> String {
    format!(
        "<text x=\"{x:.2}\" y=\"{y:.2}\" text-anchor=\"{anchor}\" dominant-baseline=\"central\" font-family=\"{fonts}\" font-size=\"{font_px:.1}\" fill=\"{fill}\">{}</text>",
        escape_xml(text)
    )
}

pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
