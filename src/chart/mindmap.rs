//! Mind-map adapter: a Markdown outline drawn as a horizontal tree.
//!
//! The source is parsed with comrak. Headings nest by level, list items nest
//! under the nearest heading, and top-level paragraphs become leaves. A lone
//! top-level node is the root; several top-level nodes hang off an unlabelled
//! root.

use std::collections::VecDeque;

use comrak::nodes::{AstNode, NodeValue};
use comrak::{Arena, Options, parse_document};
use unicode_width::UnicodeWidthStr;

use super::scene::{EdgeHead, EdgeStroke, NodeShape, Scene, SceneEdge, SceneNode};
use super::{ChartRenderer, ChartType, RenderError, Visual};
use crate::settings::StyleConfig;

/// Columns between the widest node of a depth and the next depth.
const DEPTH_GAP: usize = 3;
/// Rows per leaf.
const LEAF_STRIDE: usize = 2;
const MARGIN: usize = 1;
const ROOT_MARKER: &str = "●";
/// Deepest nesting accepted, counting the unlabelled root as depth 0.
pub const MAX_DEPTH: usize = 100;

/// Renders mind-map outlines.
#[derive(Debug, Clone, Copy, Default)]
pub struct MindMapRenderer;

impl ChartRenderer for MindMapRenderer {
    fn render(&self, source: &str, style: &StyleConfig) -> Result<Visual, RenderError> {
        let outline = parse(source)?;
        Ok(Visual {
            chart_type: ChartType::MindMap,
            source: source.to_string(),
            scene: layout(&outline),
            style: style.clone(),
        })
    }
}

/// A parsed outline. Nodes are stored flat and refer to children by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outline {
    nodes: Vec<OutlineNode>,
    root: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineNode {
    pub label: String,
    pub children: Vec<usize>,
    depth: usize,
}

impl Outline {
    fn new() -> Self {
        Self {
            nodes: vec![OutlineNode {
                label: String::new(),
                children: Vec::new(),
                depth: 0,
            }],
            root: 0,
        }
    }

    pub fn root(&self) -> &OutlineNode {
        &self.nodes[self.root]
    }

    pub fn children<'a>(&'a self, node: &'a OutlineNode) -> impl Iterator<Item = &'a OutlineNode> {
        node.children.iter().map(|&idx| &self.nodes[idx])
    }

    /// Number of nodes in the tree, root included.
    pub fn count(&self) -> usize {
        self.preorder().len()
    }

    fn push(&mut self, label: String, parent: usize) -> usize {
        let idx = self.nodes.len();
        let depth = self.nodes[parent].depth + 1;
        self.nodes.push(OutlineNode {
            label,
            children: Vec::new(),
            depth,
        });
        self.nodes[parent].children.push(idx);
        idx
    }

    /// `(index, depth)` pairs, parents before children, siblings in order.
    fn preorder(&self) -> Vec<(usize, usize)> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(self.root, 0)];
        while let Some((idx, depth)) = stack.pop() {
            order.push((idx, depth));
            stack.extend(self.nodes[idx].children.iter().rev().map(|&c| (c, depth + 1)));
        }
        order
    }
}

fn markdown_options() -> Options {
    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.front_matter_delimiter = Some("---".to_string());
    options
}

/// Parse a Markdown outline into a tree.
pub fn parse(source: &str) -> Result<Outline, RenderError> {
    let arena = Arena::new();
    let document = parse_document(&arena, source, &markdown_options());
    let mut outline = Outline::new();
    // open headings as (level, node index)
    let mut headings: Vec<(u8, usize)> = Vec::new();

    for block in document.children() {
        let value = block.data.borrow().value.clone();
        match value {
            NodeValue::Heading(heading) => {
                while headings.last().is_some_and(|&(level, _)| level >= heading.level) {
                    headings.pop();
                }
                let label = inline_text(block);
                if !label.is_empty() {
                    let parent = headings.last().map_or(0, |&(_, idx)| idx);
                    let idx = add(&mut outline, label, parent, block)?;
                    headings.push((heading.level, idx));
                }
            }
            NodeValue::List(_) => {
                let parent = headings.last().map_or(0, |&(_, idx)| idx);
                add_list(&mut outline, block, parent)?;
            }
            NodeValue::Paragraph => {
                let label = inline_text(block);
                if !label.is_empty() {
                    let parent = headings.last().map_or(0, |&(_, idx)| idx);
                    add(&mut outline, label, parent, block)?;
                }
            }
            _ => {}
        }
    }

    let top = &outline.nodes[0].children;
    match top.len() {
        0 => Err(RenderError::Empty(
            "Mind map has no headings or list items".to_string(),
        )),
        1 => {
            outline.root = top[0];
            Ok(outline)
        }
        _ => Ok(outline),
    }
}

fn add<'a>(
    outline: &mut Outline,
    label: String,
    parent: usize,
    block: &'a AstNode<'a>,
) -> Result<usize, RenderError> {
    if outline.nodes[parent].depth >= MAX_DEPTH {
        return Err(RenderError::Parse {
            line: block.data.borrow().sourcepos.start.line,
            message: format!("outline nests deeper than {MAX_DEPTH} levels"),
        });
    }
    Ok(outline.push(label, parent))
}

/// Items of `list` and every list nested in them, breadth first so each
/// item's children keep their order.
fn add_list<'a>(
    outline: &mut Outline,
    list: &'a AstNode<'a>,
    parent: usize,
) -> Result<(), RenderError> {
    let mut pending = VecDeque::from([(list, parent)]);
    while let Some((list, parent)) = pending.pop_front() {
        for item in list.children() {
            let label = item
                .children()
                .find(|child| matches!(child.data.borrow().value, NodeValue::Paragraph))
                .map(inline_text)
                .unwrap_or_default();
            // an empty bullet passes its sublists up to its parent
            let idx = if label.is_empty() {
                parent
            } else {
                add(outline, label, parent, item)?
            };
            for child in item.children() {
                if matches!(child.data.borrow().value, NodeValue::List(_)) {
                    pending.push_back((child, idx));
                }
            }
        }
    }
    Ok(())
}

/// Plain text of a heading or paragraph, markup dropped and whitespace collapsed.
fn inline_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut text = String::new();
    for inline in node.descendants() {
        match &inline.data.borrow().value {
            NodeValue::Text(t) => text.push_str(t),
            NodeValue::Code(code) => text.push_str(&code.literal),
            NodeValue::SoftBreak | NodeValue::LineBreak => text.push(' '),
            _ => {}
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lay the tree out left to right.
pub fn layout(outline: &Outline) -> Scene {
    let order = outline.preorder();

    let mut widths: Vec<usize> = Vec::new();
    for &(idx, depth) in &order {
        if widths.len() <= depth {
            widths.resize(depth + 1, 0);
        }
        widths[depth] = widths[depth].max(node_width(&outline.nodes[idx]));
    }
    let mut columns = Vec::with_capacity(widths.len());
    let mut x = MARGIN;
    for width in &widths {
        columns.push(x);
        x += width + DEPTH_GAP;
    }

    // leaves take rows in reading order, parents centre on their children
    let mut rows = vec![0; outline.nodes.len()];
    let mut next_row = MARGIN;
    for &(idx, _) in &order {
        if outline.nodes[idx].children.is_empty() {
            rows[idx] = next_row;
            next_row += LEAF_STRIDE;
        }
    }
    for &(idx, _) in order.iter().rev() {
        let children = &outline.nodes[idx].children;
        if let (Some(&first), Some(&last)) = (children.first(), children.last()) {
            rows[idx] = (rows[first] + rows[last]) / 2;
        }
    }

    let mut scene = Scene::default();
    let mut scene_index = vec![0; outline.nodes.len()];
    for &(idx, depth) in &order {
        let node = &outline.nodes[idx];
        scene_index[idx] = scene.nodes.len();
        scene.nodes.push(SceneNode {
            x: columns[depth],
            y: rows[idx],
            width: node_width(node),
            height: 1,
            label: display_label(node).to_string(),
            shape: NodeShape::Text,
            depth,
        });
    }

    for &(idx, depth) in &order {
        let parent = &scene.nodes[scene_index[idx]];
        let start = (parent.right(), parent.y);
        // shared trunk just past the widest node of this depth
        let trunk = columns[depth] + widths[depth] + 1;
        for &child in &outline.nodes[idx].children {
            let target = &scene.nodes[scene_index[child]];
            let end = (target.x.saturating_sub(1), target.y);
            let mut points = vec![start, (trunk, start.1), (trunk, end.1), end];
            points.dedup();
            scene.edges.push(SceneEdge {
                points,
                label: None,
                label_at: None,
                stroke: EdgeStroke::Solid,
                head: EdgeHead::None,
                depth: depth + 1,
            });
        }
    }
    scene.fit_bounds(MARGIN);
    scene
}

fn node_width(node: &OutlineNode) -> usize {
    display_label(node).width() + 2
}

fn display_label(node: &OutlineNode) -> &str {
    if node.label.is_empty() {
        ROOT_MARKER
    } else {
        &node.label
    }
}
