//! Chart kinds and the renderer adapters that turn chart source into a
//! laid-out [`Visual`].
//!
//! Each [`ChartType`] maps to exactly one [`ChartRenderer`]. Callers hold a
//! [`Renderers`] table and ask it for the adapter of the current type; nothing
//! else in the crate branches on the chart type to pick a renderer.

pub mod flowchart;
pub mod mindmap;
pub mod scene;
mod svg;

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::settings::StyleConfig;

pub use flowchart::FlowchartRenderer;
pub use mindmap::MindMapRenderer;
pub use scene::{Canvas, CellRole, EdgeHead, EdgeStroke, NodeShape, Scene, SceneEdge, SceneNode};

const FLOWCHART_TEMPLATE: &str = "graph TD
    A[Start] --> B{Is the user logged in?}
    B -->|Yes| C[Show dashboard]
    B -->|No| D[Show login page]
    D --> E[Enter credentials]
    E --> F{Credentials valid?}
    F -->|Yes| C
    F -->|No| G[Show error message]
    G --> D
    C --> H[End]
";

const MIND_MAP_TEMPLATE: &str = "# Software Project Plan

## Requirements
- Gather user stories
- Define scope
- Prioritise features

## Design
- Architecture
  - Frontend
  - Backend
  - Storage
- User interface

## Development
- Sprint planning
- Implementation
- Code review

## Testing
- Unit tests
- Integration tests
- User acceptance

## Release
- Deployment
- Monitoring
- Feedback
";

/// The kind of chart being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChartType {
    #[default]
    #[serde(rename = "flowchart", alias = "mermaid")]
    Flowchart,
    #[serde(rename = "mindmap", alias = "markmap")]
    MindMap,
}

impl ChartType {
    pub const ALL: [Self; 2] = [Self::Flowchart, Self::MindMap];

    /// Fixed starter source shown when switching to this type.
    pub const fn default_template(self) -> &'static str {
        match self {
            Self::Flowchart => FLOWCHART_TEMPLATE,
            Self::MindMap => MIND_MAP_TEMPLATE,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Flowchart => "Flowchart",
            Self::MindMap => "Mind map",
        }
    }

    /// Short identifier used in file names and the CLI.
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Flowchart => "flowchart",
            Self::MindMap => "mindmap",
        }
    }

    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Flowchart => Self::MindMap,
            Self::MindMap => Self::Flowchart,
        }
    }

    /// Guess the chart type from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "mmd" | "mermaid" => Some(Self::Flowchart),
            "md" | "markdown" => Some(Self::MindMap),
            _ => None,
        }
    }
}

/// Failure reported by a renderer adapter.
///
/// The display text is what the preview error panel shows.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("{0}")]
    Empty(String),
    #[error("Renderer failed: {0}")]
    Failed(String),
}

/// Turns chart source into a laid-out [`Visual`].
///
/// Implementations must be callable from a worker thread.
pub trait ChartRenderer: Send + Sync {
    fn render(&self, source: &str, style: &StyleConfig) -> Result<Visual, RenderError>;
}

/// A rendered chart: the scene plus the source and style it was laid out with.
#[derive(Debug, Clone, PartialEq)]
pub struct Visual {
    pub chart_type: ChartType,
    pub source: String,
    pub scene: Scene,
    pub style: StyleConfig,
}

impl Visual {
    /// Rasterise to a character grid. `scale` is the zoom factor (1.0 = 100 %).
    pub fn to_canvas(&self, scale: f32) -> Canvas {
        self.scene.to_canvas(scale)
    }

    /// Serialise to a standalone SVG document.
    pub fn to_svg(&self, scale: f32) -> String {
        svg::render_svg(self, scale)
    }
}

/// One adapter per chart type.
#[derive(Clone)]
pub struct Renderers {
    flowchart: Arc<dyn ChartRenderer>,
    mind_map: Arc<dyn ChartRenderer>,
}

impl Renderers {
    pub fn new(flowchart: Arc<dyn ChartRenderer>, mind_map: Arc<dyn ChartRenderer>) -> Self {
        Self {
            flowchart,
            mind_map,
        }
    }

    pub fn for_chart(&self, chart_type: ChartType) -> Arc<dyn ChartRenderer> {
        match chart_type {
            ChartType::Flowchart => Arc::clone(&self.flowchart),
            ChartType::MindMap => Arc::clone(&self.mind_map),
        }
    }
}

impl Default for Renderers {
    fn default() -> Self {
        Self::new(Arc::new(FlowchartRenderer), Arc::new(MindMapRenderer))
    }
}

impl std::fmt::Debug for Renderers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderers").finish_non_exhaustive()
    }
}

/// Flowchart layout direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FlowDirection {
    #[default]
    TopDown,
    BottomUp,
    LeftRight,
    RightLeft,
}

impl FlowDirection {
    /// Parse a Mermaid direction token (`TD`, `TB`, `BT`, `LR`, `RL`).
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "TD" | "TB" => Some(Self::TopDown),
            "BT" => Some(Self::BottomUp),
            "LR" => Some(Self::LeftRight),
            "RL" => Some(Self::RightLeft),
            _ => None,
        }
    }

    pub const fn token(self) -> &'static str {
        match self {
            Self::TopDown => "TD",
            Self::BottomUp => "BT",
            Self::LeftRight => "LR",
            Self::RightLeft => "RL",
        }
    }

    pub const fn is_vertical(self) -> bool {
        matches!(self, Self::TopDown | Self::BottomUp)
    }

    /// Flip between the vertical and horizontal orientation.
    #[must_use]
    pub const fn toggled(self) -> Self {
        if self.is_vertical() {
            Self::LeftRight
        } else {
            Self::TopDown
        }
    }
}

static HEADER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*(?:graph|flowchart)\b)(?:[ \t]+(?:TD|TB|LR|RL|BT)\b)?")
        .expect("header regex is valid")
});

static HEADER_DIRECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:graph|flowchart)[ \t]+(TD|TB|LR|RL|BT)\b")
        .expect("direction regex is valid")
});

/// Direction declared by the first `graph`/`flowchart` header, `TD` if none.
pub fn current_direction(source: &str) -> FlowDirection {
    source
        .lines()
        .find_map(|line| HEADER_DIRECTION.captures(line))
        .and_then(|caps| FlowDirection::parse(&caps[1]))
        .unwrap_or_default()
}

/// Rewrite the header's direction token, or prepend a header when missing.
pub fn with_direction(source: &str, direction: FlowDirection) -> String {
    let mut replaced = false;
    let lines: Vec<String> = source
        .split('\n')
        .map(|line| {
            if replaced || !HEADER_LINE.is_match(line) {
                return line.to_string();
            }
            replaced = true;
            HEADER_LINE
                .replace(line, format!("${{1}} {}", direction.token()))
                .into_owned()
        })
        .collect();
    if replaced {
        lines.join("\n")
    } else {
        format!("graph {}\n{source}", direction.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_are_non_empty_and_distinct() {
        let flow = ChartType::Flowchart.default_template();
        let mind = ChartType::MindMap.default_template();
        assert!(flow.starts_with("graph TD"));
        assert!(mind.starts_with("# "));
        assert_ne!(flow, mind);
    }

    #[test]
    fn test_chart_type_serde_names() {
        assert_eq!(
            serde_json::to_string(&ChartType::MindMap).unwrap(),
            "\"mindmap\""
        );
        let legacy: ChartType = serde_json::from_str("\"markmap\"").unwrap();
        assert_eq!(legacy, ChartType::MindMap);
        let legacy: ChartType = serde_json::from_str("\"mermaid\"").unwrap();
        assert_eq!(legacy, ChartType::Flowchart);
    }

    #[test]
    fn test_renderers_dispatch_by_type() {
        let renderers = Renderers::default();
        let style = StyleConfig::default();
        let visual = renderers
            .for_chart(ChartType::MindMap)
            .render("# Root\n- child", &style)
            .unwrap();
        assert_eq!(visual.chart_type, ChartType::MindMap);
        let visual = renderers
            .for_chart(ChartType::Flowchart)
            .render("graph LR\nA-->B", &style)
            .unwrap();
        assert_eq!(visual.chart_type, ChartType::Flowchart);
    }

    #[test]
    fn test_current_direction_defaults_to_top_down() {
        assert_eq!(current_direction("A-->B"), FlowDirection::TopDown);
        assert_eq!(current_direction("graph LR\nA-->B"), FlowDirection::LeftRight);
        assert_eq!(current_direction("flowchart BT"), FlowDirection::BottomUp);
    }

    #[test]
    fn test_with_direction_replaces_existing_token() {
        let out = with_direction("graph TD\n  A-->B", FlowDirection::LeftRight);
        assert_eq!(out, "graph LR\n  A-->B");
    }

    #[test]
    fn test_with_direction_keeps_inline_statements() {
        let out = with_direction("graph TD;A-->B", FlowDirection::LeftRight);
        assert_eq!(out, "graph LR;A-->B");
    }

    #[test]
    fn test_with_direction_adds_token_to_bare_header() {
        let out = with_direction("%% note\ngraph\nA-->B", FlowDirection::LeftRight);
        assert_eq!(out, "%% note\ngraph LR\nA-->B");
    }

    #[test]
    fn test_with_direction_prepends_missing_header() {
        let out = with_direction("A-->B", FlowDirection::TopDown);
        assert_eq!(out, "graph TD\nA-->B");
    }

    #[test]
    fn test_with_direction_ignores_words_starting_with_graph() {
        let out = with_direction("graphics-->B", FlowDirection::LeftRight);
        assert_eq!(out, "graph LR\ngraphics-->B");
    }

    #[test]
    fn test_direction_toggle() {
        assert_eq!(FlowDirection::TopDown.toggled(), FlowDirection::LeftRight);
        assert_eq!(FlowDirection::RightLeft.toggled(), FlowDirection::TopDown);
    }
}
