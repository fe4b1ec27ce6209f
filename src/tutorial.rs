//! Built-in syntax tutorials shown in the tutorial panel.

use crate::chart::ChartType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TutorialSection {
    pub id: &'static str,
    pub title: &'static str,
    pub explanation: &'static str,
    pub code: &'static str,
    pub chart_type: ChartType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TutorialCategory {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub sections: &'static [TutorialSection],
}

const FLOWCHART_SECTIONS: &[TutorialSection] = &[
    TutorialSection {
        id: "basic-flowchart",
        title: "Basic flowchart",
        explanation: "`graph TD` starts a top-down flowchart. Each `A-->B` draws an arrow from A to B.",
        code: "graph TD;\n    A-->B;\n    A-->C;\n    B-->D;\n    C-->D;",
        chart_type: ChartType::Flowchart,
    },
    TutorialSection {
        id: "flowchart-shapes",
        title: "Node shapes",
        explanation: "Brackets pick the shape: [box] for a step, (round) for soft steps, ((circle)) for start or end, {diamond} for a decision.",
        code: "graph TD;\n    A[Square node]\n    B(Rounded node)\n    C((Circle))\n    D{Decision}\n    E>Flag]\n    F[[Subroutine]]\n    G[(Database)]\n    H{{Hexagon}}",
        chart_type: ChartType::Flowchart,
    },
    TutorialSection {
        id: "flowchart-directions",
        title: "Directions",
        explanation: "LR runs left to right, TD top to bottom, BT bottom to top and RL right to left.",
        code: "graph LR;\n    A-->B-->C-->D;",
        chart_type: ChartType::Flowchart,
    },
    TutorialSection {
        id: "flowchart-links",
        title: "Links and labels",
        explanation: "Text between pipes labels a link. Dotted (-.->) and thick (==>) links show weaker or stronger relations; --x and --o change the arrow head.",
        code: "graph LR\n    A[Client] -->|request| B[Server]\n    B -.->|cache miss| C[(Database)]\n    B ==> D[Response]\n    D --x E[Dropped]\n    D -- retry --> A",
        chart_type: ChartType::Flowchart,
    },
    TutorialSection {
        id: "complex-flowchart",
        title: "Complete process",
        explanation: "A full process with start, input, processing, a decision that loops back, output and end.",
        code: "graph TD;\n    Start([Start])\n    Input[/Read data/]\n    Process[Process data]\n    Decision{Valid?}\n    Output[/Write result/]\n    End([End])\n\n    Start-->Input\n    Input-->Process\n    Process-->Decision\n    Decision-->|Yes|Output\n    Decision-->|No|Input\n    Output-->End",
        chart_type: ChartType::Flowchart,
    },
];

const MIND_MAP_SECTIONS: &[TutorialSection] = &[
    TutorialSection {
        id: "basic-mindmap",
        title: "Headings as branches",
        explanation: "The first heading is the root. Each deeper heading level becomes a branch below the nearest shallower one.",
        code: "# Trip\n## Transport\n### Train\n### Car\n## Lodging\n### Hotel\n### Camping",
        chart_type: ChartType::MindMap,
    },
    TutorialSection {
        id: "mindmap-lists",
        title: "Lists as leaves",
        explanation: "List items hang under the heading above them. Indent a list item by two spaces to nest it.",
        code: "# Groceries\n## Produce\n- Fruit\n  - Apples\n  - Pears\n- Vegetables\n## Dairy\n- Milk\n- Cheese",
        chart_type: ChartType::MindMap,
    },
    TutorialSection {
        id: "mindmap-formatting",
        title: "Inline formatting",
        explanation: "Bold, italics, code and links are shown as plain text in the map.",
        code: "# **Release** plan\n## Build with `cargo`\n## Read the [guide](https://example.com)\n- *Announce* the release",
        chart_type: ChartType::MindMap,
    },
];

static CATEGORIES: &[TutorialCategory] = &[
    TutorialCategory {
        id: "flowchart",
        title: "Flowcharts",
        description: "Program logic, business processes and decisions.",
        sections: FLOWCHART_SECTIONS,
    },
    TutorialCategory {
        id: "mindmap",
        title: "Mind maps",
        description: "Outlines drawn as a branching tree.",
        sections: MIND_MAP_SECTIONS,
    },
];

pub fn categories() -> &'static [TutorialCategory] {
    CATEGORIES
}

/// Every section across all categories, in catalog order.
pub fn all_sections() -> impl Iterator<Item = &'static TutorialSection> {
    CATEGORIES.iter().flat_map(|category| category.sections.iter())
}

pub fn section(id: &str) -> Option<&'static TutorialSection> {
    all_sections().find(|section| section.id == id)
}

/// Case-insensitive match over title, explanation and code.
pub fn search_tutorials(query: &str) -> Vec<&'static TutorialSection> {
    let needle = query.trim().to_lowercase();
    all_sections()
        .filter(|section| {
            needle.is_empty()
                || section.title.to_lowercase().contains(&needle)
                || section.explanation.to_lowercase().contains(&needle)
                || section.code.to_lowercase().contains(&needle)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::Renderers;
    use crate::settings::StyleConfig;
    use std::collections::HashSet;

    #[test]
    fn test_every_section_renders() {
        let renderers = Renderers::default();
        let style = StyleConfig::default();
        for section in all_sections() {
            let result = renderers.for_chart(section.chart_type).render(section.code, &style);
            assert!(result.is_ok(), "{} failed: {:?}", section.id, result.err());
        }
    }

    #[test]
    fn test_section_ids_are_unique() {
        let ids: HashSet<&str> = all_sections().map(|s| s.id).collect();
        assert_eq!(ids.len(), all_sections().count());
    }

    #[test]
    fn test_search_matches_title_explanation_and_code() {
        let by_title: Vec<&str> = search_tutorials("SHAPES").iter().map(|s| s.id).collect();
        assert_eq!(by_title, vec!["flowchart-shapes"]);

        let by_code = search_tutorials("camping");
        assert_eq!(by_code.len(), 1);
        assert_eq!(by_code[0].id, "basic-mindmap");

        assert!(search_tutorials("pipes").iter().any(|s| s.id == "flowchart-links"));
        assert_eq!(search_tutorials("").len(), all_sections().count());
        assert!(search_tutorials("sequenceDiagram").is_empty());
    }

    #[test]
    fn test_section_lookup() {
        assert_eq!(
            section("basic-mindmap").map(|s| s.chart_type),
            Some(ChartType::MindMap)
        );
        assert!(section("missing").is_none());
    }

    #[test]
    fn test_category_types_match_sections() {
        for category in categories() {
            let expected = if category.id == "flowchart" {
                ChartType::Flowchart
            } else {
                ChartType::MindMap
            };
            assert!(category.sections.iter().all(|s| s.chart_type == expected));
        }
    }
}
