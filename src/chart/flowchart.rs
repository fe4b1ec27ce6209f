//! Flowchart adapter for a Mermaid `graph`/`flowchart` subset.
//!
//! Pipeline: [`parse`] builds a [`FlowGraph`], [`layout`] ranks and places
//! it into a [`Scene`]. Layout is layered: back edges are found by DFS and
//! ignored for ranking, nodes take their longest-path rank, a few barycentre
//! sweeps order each rank, then edges are routed orthogonally. Back edges run
//! along a lane beside the chart.

use std::collections::{HashMap, VecDeque};

use unicode_width::UnicodeWidthStr;

use super::scene::{EdgeHead, EdgeStroke, NodeShape, Scene, SceneEdge, SceneNode};
use super::{ChartRenderer, ChartType, FlowDirection, RenderError, Visual};
use crate::settings::StyleConfig;

const NODE_HEIGHT: usize = 3;
const NODE_GAP: usize = 3;
const STACK_GAP: usize = 1;
const RANK_GAP_ROWS: usize = 4;
const MIN_RANK_GAP_COLS: usize = 6;
const MARGIN: usize = 1;
const ORDERING_SWEEPS: usize = 2;

/// Statements that are valid Mermaid but carry nothing this adapter draws.
const IGNORED_KEYWORDS: &[&str] = &[
    "subgraph",
    "end",
    "direction",
    "classDef",
    "class",
    "style",
    "linkStyle",
    "click",
];

/// Node shape delimiters, longest openers first.
const SHAPES: &[(&str, &str, NodeShape)] = &[
    ("(((", ")))", NodeShape::Circle),
    ("((", "))", NodeShape::Circle),
    ("([", "])", NodeShape::Stadium),
    ("[[", "]]", NodeShape::Subroutine),
    ("[(", ")]", NodeShape::Cylinder),
    ("[/", "/]", NodeShape::Parallelogram),
    ("[\\", "\\]", NodeShape::Parallelogram),
    ("{{", "}}", NodeShape::Hexagon),
    ("[", "]", NodeShape::Rect),
    ("(", ")", NodeShape::Round),
    ("{", "}", NodeShape::Diamond),
    (">", "]", NodeShape::Asymmetric),
];

/// Renders flowchart source.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlowchartRenderer;

impl ChartRenderer for FlowchartRenderer {
    fn render(&self, source: &str, style: &StyleConfig) -> Result<Visual, RenderError> {
        let graph = parse(source)?;
        if graph.nodes.is_empty() {
            return Err(RenderError::Empty("Flowchart has no nodes".to_string()));
        }
        Ok(Visual {
            chart_type: ChartType::Flowchart,
            source: source.to_string(),
            scene: layout(&graph),
            style: style.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowGraph {
    pub direction: FlowDirection,
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowNode {
    pub id: String,
    pub label: String,
    pub shape: NodeShape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowEdge {
    pub from: usize,
    pub to: usize,
    pub label: Option<String>,
    pub stroke: EdgeStroke,
    pub head: EdgeHead,
}

/// Parse flowchart source. Line numbers in errors are 1-based.
pub fn parse(source: &str) -> Result<FlowGraph, RenderError> {
    let mut builder = GraphBuilder::default();
    let mut header_seen = false;

    for (idx, raw) in source.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with("%%") {
            continue;
        }
        for statement in split_statements(trimmed) {
            let statement = statement.trim();
            if statement.is_empty() {
                continue;
            }
            if header_seen {
                builder.statement(statement, line)?;
            } else {
                builder.direction = parse_header(statement, line)?;
                header_seen = true;
            }
        }
    }

    if !header_seen {
        return Err(RenderError::Empty(
            "Flowchart source has no `graph` header".to_string(),
        ));
    }
    Ok(builder.finish())
}

fn parse_error(line: usize, message: impl Into<String>) -> RenderError {
    RenderError::Parse {
        line,
        message: message.into(),
    }
}

fn parse_header(statement: &str, line: usize) -> Result<FlowDirection, RenderError> {
    let mut words = statement.split_whitespace();
    if !matches!(words.next(), Some("graph" | "flowchart")) {
        return Err(parse_error(
            line,
            format!("expected `graph` or `flowchart` header, found `{statement}`"),
        ));
    }
    let direction = match words.next() {
        None => FlowDirection::TopDown,
        Some(token) => FlowDirection::parse(token)
            .ok_or_else(|| parse_error(line, format!("unknown direction `{token}`")))?,
    };
    if let Some(extra) = words.next() {
        return Err(parse_error(
            line,
            format!("unexpected `{extra}` after header"),
        ));
    }
    Ok(direction)
}

/// Split a line on `;` outside labels, quotes and pipes.
fn split_statements(line: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut in_pipe = false;
    let mut start = 0;
    for (idx, ch) in line.char_indices() {
        match ch {
            '"' => in_quote = !in_quote,
            '|' if !in_quote => in_pipe = !in_pipe,
            '[' | '(' | '{' if !in_quote && !in_pipe => depth += 1,
            ']' | ')' | '}' if !in_quote && !in_pipe => depth = depth.saturating_sub(1),
            ';' if depth == 0 && !in_quote && !in_pipe => {
                out.push(&line[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    out.push(&line[start..]);
    out
}

#[derive(Default)]
struct GraphBuilder {
    direction: FlowDirection,
    nodes: Vec<FlowNode>,
    edges: Vec<FlowEdge>,
    index: HashMap<String, usize>,
}

struct NodeRef {
    id: String,
    decl: Option<(String, NodeShape)>,
}

struct Link {
    stroke: EdgeStroke,
    head: EdgeHead,
    label: Option<String>,
}

impl GraphBuilder {
    fn statement(&mut self, text: &str, line: usize) -> Result<(), RenderError> {
        if text
            .split_whitespace()
            .next()
            .is_some_and(|word| IGNORED_KEYWORDS.contains(&word))
        {
            return Ok(());
        }

        let mut cursor = Cursor::new(text, line);
        let mut left = self.intern_group(cursor.parse_group()?);
        loop {
            cursor.skip_ws();
            if cursor.at_end() {
                break;
            }
            let Some(link) = cursor.parse_link()? else {
                return Err(cursor.error(format!("unexpected `{}`", cursor.rest())));
            };
            cursor.skip_ws();
            if cursor.at_end() {
                return Err(cursor.error("link has no target node"));
            }
            let right = self.intern_group(cursor.parse_group()?);
            for &from in &left {
                for &to in &right {
                    self.edges.push(FlowEdge {
                        from,
                        to,
                        label: link.label.clone(),
                        stroke: link.stroke,
                        head: link.head,
                    });
                }
            }
            left = right;
        }
        Ok(())
    }

    fn intern_group(&mut self, refs: Vec<NodeRef>) -> Vec<usize> {
        refs.into_iter().map(|node| self.intern(node)).collect()
    }

    fn intern(&mut self, node: NodeRef) -> usize {
        if let Some(&idx) = self.index.get(&node.id) {
            if let Some((label, shape)) = node.decl {
                self.nodes[idx].label = label;
                self.nodes[idx].shape = shape;
            }
            return idx;
        }
        let (label, shape) = node
            .decl
            .unwrap_or_else(|| (node.id.clone(), NodeShape::Rect));
        let idx = self.nodes.len();
        self.index.insert(node.id.clone(), idx);
        self.nodes.push(FlowNode {
            id: node.id,
            label,
            shape,
        });
        idx
    }

    fn finish(self) -> FlowGraph {
        FlowGraph {
            direction: self.direction,
            nodes: self.nodes,
            edges: self.edges,
        }
    }
}

struct Cursor {
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl Cursor {
    fn new(text: &str, line: usize) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            line,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn starts_with(&self, pat: &str) -> bool {
        let pat: Vec<char> = pat.chars().collect();
        self.chars
            .get(self.pos..)
            .is_some_and(|rest| rest.starts_with(&pat))
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, pat: &str) -> bool {
        if self.starts_with(pat) {
            self.pos += pat.chars().count();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    /// Char index of the next occurrence of `pat` at or after the cursor.
    fn find(&self, pat: &str) -> Option<usize> {
        let pat: Vec<char> = pat.chars().collect();
        (self.pos..self.chars.len()).find(|&idx| self.chars[idx..].starts_with(&pat))
    }

    fn slice(&self, start: usize, end: usize) -> String {
        self.chars[start..end].iter().collect()
    }

    fn rest(&self) -> String {
        self.slice(self.pos, self.chars.len())
    }

    fn error(&self, message: impl Into<String>) -> RenderError {
        parse_error(self.line, message)
    }

    fn parse_group(&mut self) -> Result<Vec<NodeRef>, RenderError> {
        let mut group = vec![self.parse_node()?];
        loop {
            self.skip_ws();
            if !self.eat('&') {
                break;
            }
            self.skip_ws();
            group.push(self.parse_node()?);
        }
        Ok(group)
    }

    fn parse_node(&mut self) -> Result<NodeRef, RenderError> {
        self.skip_ws();
        let start = self.pos;
        while let Some(ch) = self.peek() {
            let joins_id = ch == '-' && self.peek_at(1).is_some_and(is_id_char);
            if is_id_char(ch) || (joins_id && self.pos > start) {
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(self.error(format!("expected a node id, found `{}`", self.rest())));
        }
        let id = self.slice(start, self.pos);

        let mut decl = None;
        for (open, close, shape) in SHAPES {
            if self.eat_str(open) {
                let label = self.read_label(close, &id)?;
                decl = Some((label, *shape));
                break;
            }
        }

        if self.eat_str(":::") {
            while self.peek().is_some_and(|c| is_id_char(c) || c == '-') {
                self.pos += 1;
            }
        }
        Ok(NodeRef { id, decl })
    }

    fn read_label(&mut self, close: &str, id: &str) -> Result<String, RenderError> {
        self.skip_ws();
        let label = if self.eat('"') {
            let start = self.pos;
            let Some(end) = self.find("\"") else {
                return Err(self.error(format!("unterminated quoted label for node `{id}`")));
            };
            self.pos = end + 1;
            self.skip_ws();
            let text = self.slice(start, end);
            if !self.starts_with(close) {
                return Err(self.error(format!("expected `{close}` after label of node `{id}`")));
            }
            text
        } else {
            let start = self.pos;
            let Some(end) = self.find(close) else {
                return Err(self.error(format!(
                    "unterminated label for node `{id}`, expected `{close}`"
                )));
            };
            self.pos = end;
            self.slice(start, end)
        };
        self.eat_str(close);
        Ok(normalize_label(&label))
    }

    fn parse_link(&mut self) -> Result<Option<Link>, RenderError> {
        self.skip_ws();
        let start = self.pos;
        self.eat('<');
        let stroke = if self.starts_with("-.") {
            EdgeStroke::Dotted
        } else if self.starts_with("==") {
            EdgeStroke::Thick
        } else if self.starts_with("--") {
            EdgeStroke::Solid
        } else {
            self.pos = start;
            return Ok(None);
        };

        let opener = self.pos;
        self.consume_link_body(stroke);
        let mut head = self.link_head();
        let mut label = None;

        // `-- text -->` form
        if head == EdgeHead::None
            && self.pos - opener == 2
            && self.peek().is_some_and(char::is_whitespace)
        {
            let close = match stroke {
                EdgeStroke::Solid => "--",
                EdgeStroke::Thick => "==",
                EdgeStroke::Dotted => ".-",
            };
            let text_start = self.pos;
            let Some(end) = self.find(close) else {
                return Err(self.error("unterminated link text"));
            };
            label = Some(normalize_label(&self.slice(text_start, end)));
            self.pos = end;
            self.consume_link_body(stroke);
            head = self.link_head();
        }

        self.skip_ws();
        if self.eat('|') {
            let text_start = self.pos;
            let Some(end) = self.find("|") else {
                return Err(self.error("unterminated `|` link label"));
            };
            label = Some(normalize_label(&self.slice(text_start, end)));
            self.pos = end + 1;
        }

        Ok(Some(Link {
            stroke,
            head,
            label: label.filter(|l| !l.is_empty()),
        }))
    }

    fn consume_link_body(&mut self, stroke: EdgeStroke) {
        while let Some(ch) = self.peek() {
            let body = match stroke {
                EdgeStroke::Thick => ch == '=',
                EdgeStroke::Solid => ch == '-',
                EdgeStroke::Dotted => ch == '-' || ch == '.',
            };
            if !body {
                break;
            }
            self.pos += 1;
        }
    }

    fn link_head(&mut self) -> EdgeHead {
        let standalone = !self.peek_at(1).is_some_and(is_id_char);
        let head = match self.peek() {
            Some('>') => EdgeHead::Arrow,
            Some('x') if standalone => EdgeHead::Cross,
            Some('o') if standalone => EdgeHead::Circle,
            _ => return EdgeHead::None,
        };
        self.pos += 1;
        head
    }
}

fn is_id_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn normalize_label(raw: &str) -> String {
    raw.replace("<br/>", " ")
        .replace("<br />", " ")
        .replace("<br>", " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Place a parsed graph.
pub fn layout(graph: &FlowGraph) -> Scene {
    let n = graph.nodes.len();
    if n == 0 {
        return Scene::default();
    }

    let back = find_back_edges(graph);
    let rank = longest_path_ranks(graph, &back);
    let ranks = order_ranks(graph, &rank);

    let mut nodes: Vec<SceneNode> = graph
        .nodes
        .iter()
        .zip(&rank)
        .map(|(node, &r)| SceneNode {
            x: 0,
            y: 0,
            width: node_width(node),
            height: NODE_HEIGHT,
            label: node.label.clone(),
            shape: node.shape,
            depth: r,
        })
        .collect();

    let vertical = graph.direction.is_vertical();
    if vertical {
        place_rows(&mut nodes, &ranks);
    } else {
        let label_width = graph
            .edges
            .iter()
            .filter_map(|e| e.label.as_deref())
            .map(UnicodeWidthStr::width)
            .max()
            .unwrap_or(0);
        place_columns(&mut nodes, &ranks, MIN_RANK_GAP_COLS.max(label_width + 6));
    }

    let content_right = nodes.iter().map(SceneNode::right).max().unwrap_or(0);
    let content_bottom = nodes.iter().map(SceneNode::bottom).max().unwrap_or(0);
    let mut lane = 0;
    let edges = graph
        .edges
        .iter()
        .zip(&back)
        .map(|(edge, &is_back)| {
            let (u, v) = (&nodes[edge.from], &nodes[edge.to]);
            let (points, label_at) = if is_back {
                let self_loop = edge.from == edge.to;
                let route = if vertical {
                    route_back_vertical(u, v, content_right + 2 + 2 * lane, self_loop)
                } else {
                    route_back_horizontal(u, v, content_bottom + 1 + 2 * lane, self_loop)
                };
                lane += 1;
                route
            } else if vertical {
                route_forward_vertical(u, v)
            } else {
                route_forward_horizontal(u, v)
            };
            SceneEdge {
                points,
                label: edge.label.clone(),
                label_at: edge.label.as_ref().map(|_| label_at),
                stroke: edge.stroke,
                head: edge.head,
                depth: rank[edge.to],
            }
        })
        .collect();

    let mut scene = Scene {
        width: 0,
        height: 0,
        nodes,
        edges,
    };
    scene.fit_bounds(0);
    match graph.direction {
        FlowDirection::BottomUp => mirror(&mut scene, false),
        FlowDirection::RightLeft => mirror(&mut scene, true),
        FlowDirection::TopDown | FlowDirection::LeftRight => {}
    }
    translate(&mut scene, MARGIN);
    scene.fit_bounds(MARGIN);
    scene
}

fn node_width(node: &FlowNode) -> usize {
    let text = node.label.width();
    let padding = match node.shape {
        NodeShape::Circle | NodeShape::Diamond | NodeShape::Hexagon => 6,
        _ => 4,
    };
    (text + padding).max(5)
}

/// Edges that close a cycle, found by iterative DFS in declaration order.
/// Self-loops count as back edges.
fn find_back_edges(graph: &FlowGraph) -> Vec<bool> {
    let n = graph.nodes.len();
    let mut adjacency: Vec<Vec<(usize, usize)>> = vec![Vec::new(); n];
    for (idx, edge) in graph.edges.iter().enumerate() {
        adjacency[edge.from].push((idx, edge.to));
    }

    let mut back = vec![false; graph.edges.len()];
    // 0 = unvisited, 1 = on stack, 2 = done
    let mut state = vec![0u8; n];
    for root in 0..n {
        if state[root] != 0 {
            continue;
        }
        state[root] = 1;
        let mut stack = vec![(root, 0usize)];
        while let Some(top) = stack.last_mut() {
            let v = top.0;
            if let Some(&(edge, w)) = adjacency[v].get(top.1) {
                top.1 += 1;
                match state[w] {
                    0 => {
                        state[w] = 1;
                        stack.push((w, 0));
                    }
                    1 => back[edge] = true,
                    _ => {}
                }
            } else {
                state[v] = 2;
                stack.pop();
            }
        }
    }
    back
}

fn longest_path_ranks(graph: &FlowGraph, back: &[bool]) -> Vec<usize> {
    let n = graph.nodes.len();
    let mut indegree = vec![0usize; n];
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (edge, &is_back) in graph.edges.iter().zip(back) {
        if !is_back {
            successors[edge.from].push(edge.to);
            indegree[edge.to] += 1;
        }
    }

    let mut rank = vec![0usize; n];
    let mut queue: VecDeque<usize> = (0..n).filter(|&v| indegree[v] == 0).collect();
    while let Some(v) = queue.pop_front() {
        for &w in &successors[v] {
            rank[w] = rank[w].max(rank[v] + 1);
            indegree[w] -= 1;
            if indegree[w] == 0 {
                queue.push_back(w);
            }
        }
    }
    rank
}

fn order_ranks(graph: &FlowGraph, rank: &[usize]) -> Vec<Vec<usize>> {
    let n = graph.nodes.len();
    let rank_count = rank.iter().max().map_or(0, |r| r + 1);
    let mut ranks: Vec<Vec<usize>> = vec![Vec::new(); rank_count];
    for v in 0..n {
        ranks[rank[v]].push(v);
    }

    let mut neighbours: Vec<Vec<usize>> = vec![Vec::new(); n];
    for edge in &graph.edges {
        if edge.from != edge.to {
            neighbours[edge.from].push(edge.to);
            neighbours[edge.to].push(edge.from);
        }
    }

    let mut position = vec![0usize; n];
    let refresh = |ranks: &[Vec<usize>], position: &mut [usize]| {
        for layer in ranks {
            for (idx, &v) in layer.iter().enumerate() {
                position[v] = idx;
            }
        }
    };
    refresh(&ranks, &mut position);

    #[allow(clippy::cast_precision_loss)]
    let barycentre = |v: usize, target: usize, position: &[usize]| -> f32 {
        let adjacent: Vec<usize> = neighbours[v]
            .iter()
            .copied()
            .filter(|&u| rank[u] == target)
            .collect();
        if adjacent.is_empty() {
            return position[v] as f32;
        }
        adjacent.iter().map(|&u| position[u] as f32).sum::<f32>() / adjacent.len() as f32
    };

    for _ in 0..ORDERING_SWEEPS {
        for r in 1..rank_count {
            let mut layer = std::mem::take(&mut ranks[r]);
            layer.sort_by(|&a, &b| {
                barycentre(a, r - 1, &position).total_cmp(&barycentre(b, r - 1, &position))
            });
            ranks[r] = layer;
            refresh(&ranks, &mut position);
        }
        for r in (0..rank_count.saturating_sub(1)).rev() {
            let mut layer = std::mem::take(&mut ranks[r]);
            layer.sort_by(|&a, &b| {
                barycentre(a, r + 1, &position).total_cmp(&barycentre(b, r + 1, &position))
            });
            ranks[r] = layer;
            refresh(&ranks, &mut position);
        }
    }
    ranks
}

fn place_rows(nodes: &mut [SceneNode], ranks: &[Vec<usize>]) {
    let row_width = |layer: &Vec<usize>| -> usize {
        let widths: usize = layer.iter().map(|&v| nodes[v].width).sum();
        widths + NODE_GAP * layer.len().saturating_sub(1)
    };
    let widths: Vec<usize> = ranks.iter().map(row_width).collect();
    let max_width = widths.iter().copied().max().unwrap_or(0);

    for (r, layer) in ranks.iter().enumerate() {
        let mut x = (max_width - widths[r]) / 2;
        let y = r * (NODE_HEIGHT + RANK_GAP_ROWS);
        for &v in layer {
            nodes[v].x = x;
            nodes[v].y = y;
            x += nodes[v].width + NODE_GAP;
        }
    }
}

fn place_columns(nodes: &mut [SceneNode], ranks: &[Vec<usize>], gap: usize) {
    let column_height =
        |layer: &Vec<usize>| layer.len() * NODE_HEIGHT + STACK_GAP * layer.len().saturating_sub(1);
    let max_height = ranks.iter().map(column_height).max().unwrap_or(0);

    let mut x = 0;
    for layer in ranks {
        let column_width = layer.iter().map(|&v| nodes[v].width).max().unwrap_or(0);
        let mut y = (max_height - column_height(layer)) / 2;
        for &v in layer {
            nodes[v].x = x + (column_width - nodes[v].width) / 2;
            nodes[v].y = y;
            y += NODE_HEIGHT + STACK_GAP;
        }
        x += column_width + gap;
    }
}

type Route = (Vec<(usize, usize)>, (usize, usize));

fn route_forward_vertical(u: &SceneNode, v: &SceneNode) -> Route {
    let (sx, sy) = (u.center_x(), u.bottom());
    let (ex, ey) = (v.center_x(), v.y.saturating_sub(1));
    let mid = ey.saturating_sub(2).max(sy);
    let points = simplify(vec![(sx, sy), (sx, mid), (ex, mid), (ex, ey)]);
    (points, ((sx + ex) / 2, mid))
}

fn route_forward_horizontal(u: &SceneNode, v: &SceneNode) -> Route {
    let (sx, sy) = (u.right(), u.center_y());
    let (ex, ey) = (v.x.saturating_sub(1), v.center_y());
    let mid = (sx + 2).min(ex);
    let points = simplify(vec![(sx, sy), (mid, sy), (mid, ey), (ex, ey)]);
    (points, ((mid + ex) / 2, ey))
}

fn route_back_vertical(u: &SceneNode, v: &SceneNode, lane: usize, self_loop: bool) -> Route {
    let (start_y, end_y) = if self_loop {
        (u.y, u.bottom() - 1)
    } else {
        (u.center_y(), v.center_y())
    };
    let points = simplify(vec![
        (u.right(), start_y),
        (lane, start_y),
        (lane, end_y),
        (v.right(), end_y),
    ]);
    (points, (lane, (start_y + end_y) / 2))
}

fn route_back_horizontal(
    u: &SceneNode,
    v: &SceneNode,
    lane: usize,
    self_loop: bool,
) -> Route {
    let (start_x, end_x) = if self_loop {
        (u.x + 1, u.right() - 2)
    } else {
        (u.center_x(), v.center_x())
    };
    let points = simplify(vec![
        (start_x, u.bottom()),
        (start_x, lane),
        (end_x, lane),
        (end_x, v.bottom()),
    ]);
    (points, ((start_x + end_x) / 2, lane))
}

/// Drop repeated points and interior points on a straight run.
fn simplify(mut points: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
    points.dedup();
    let mut idx = 1;
    while idx + 1 < points.len() {
        let (a, b, c) = (points[idx - 1], points[idx], points[idx + 1]);
        let straight = (a.0 == b.0 && b.0 == c.0) || (a.1 == b.1 && b.1 == c.1);
        if straight {
            points.remove(idx);
        } else {
            idx += 1;
        }
    }
    points
}

fn mirror(scene: &mut Scene, horizontal: bool) {
    let (w, h) = (scene.width, scene.height);
    let flip = |v: usize, extent: usize| extent.saturating_sub(1).saturating_sub(v);
    for node in &mut scene.nodes {
        if horizontal {
            node.x = w.saturating_sub(node.x + node.width);
        } else {
            node.y = h.saturating_sub(node.y + node.height);
        }
    }
    for edge in &mut scene.edges {
        for point in edge.points.iter_mut().chain(edge.label_at.iter_mut()) {
            if horizontal {
                point.0 = flip(point.0, w);
            } else {
                point.1 = flip(point.1, h);
            }
        }
    }
}

fn translate(scene: &mut Scene, offset: usize) {
    for node in &mut scene.nodes {
        node.x += offset;
        node.y += offset;
    }
    for edge in &mut scene.edges {
        for point in edge.points.iter_mut().chain(edge.label_at.iter_mut()) {
            point.0 += offset;
            point.1 += offset;
        }
    }
}
