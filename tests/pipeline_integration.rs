use std::time::{Duration, Instant};

use chartpad::chart::ChartType;
use chartpad::export::{ExportFormat, export_visual};
use chartpad::render::{Display, RenderPhase, RenderPipeline, RenderRequest};
use chartpad::settings::{StyleConfig, ViewSettings};

fn style() -> StyleConfig {
    StyleConfig::from(&ViewSettings::default())
}

fn request(source: &str, chart_type: ChartType) -> RenderRequest {
    RenderRequest::new(source, chart_type, style())
}

fn wait_until_settled(pipeline: &mut RenderPipeline) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while pipeline.is_rendering() {
        pipeline.poll();
        assert!(Instant::now() < deadline, "render did not finish");
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn test_burst_of_edits_renders_only_the_last() {
    let mut pipeline = RenderPipeline::new(300);
    pipeline.schedule(request("graph TD\nA", ChartType::Flowchart), 0);
    pipeline.schedule(request("graph TD\nA --> B", ChartType::Flowchart), 100);
    pipeline.schedule(
        request("graph TD\nA[Final] --> B", ChartType::Flowchart),
        200,
    );

    assert!(!pipeline.tick(400), "window restarts on every edit");
    assert_eq!(pipeline.phase(), RenderPhase::Debouncing);
    assert!(pipeline.tick(500));
    wait_until_settled(&mut pipeline);

    let visual = pipeline.current_visual().expect("visual");
    assert!(visual.scene.nodes.iter().any(|node| node.label == "Final"));
    assert_eq!(pipeline.phase(), RenderPhase::Settled);
}

#[test]
fn test_error_replaces_visual_until_next_success() {
    let mut pipeline = RenderPipeline::new(0);
    pipeline.schedule_immediate(request("graph TD\nA --> B", ChartType::Flowchart), 0);
    pipeline.tick(0);
    wait_until_settled(&mut pipeline);
    assert!(pipeline.current_visual().is_some());

    pipeline.schedule(request("graph TD\nA --> B\nB -> C", ChartType::Flowchart), 10);
    pipeline.tick(10);
    wait_until_settled(&mut pipeline);
    assert!(matches!(pipeline.display(), Display::Error(msg) if msg.contains("line 3")));
    assert!(pipeline.current_visual().is_none());

    pipeline.schedule(request("graph TD\nA --> C", ChartType::Flowchart), 20);
    pipeline.tick(20);
    wait_until_settled(&mut pipeline);
    assert!(pipeline.current_visual().is_some());
}

#[test]
fn test_mind_map_renders_and_exports() {
    let mut pipeline = RenderPipeline::new(0);
    pipeline.schedule_immediate(
        request("# Launch\n## Design\n- Sketch\n## Build", ChartType::MindMap),
        0,
    );
    pipeline.tick(0);
    wait_until_settled(&mut pipeline);
    let visual = pipeline.current_visual().expect("visual");
    assert_eq!(visual.chart_type, ChartType::MindMap);

    let dir = tempfile::tempdir().unwrap();
    let svg = export_visual(Some(&visual), ExportFormat::Svg, 1.0, dir.path(), 42).unwrap();
    assert_eq!(
        svg.file_name().and_then(|n| n.to_str()),
        Some("chart-mindmap-42.svg")
    );
    let text = std::fs::read_to_string(&svg).unwrap();
    assert!(text.starts_with("<svg"));
    assert!(text.contains("Launch"));

    let png = export_visual(Some(&visual), ExportFormat::Png, 1.0, dir.path(), 43).unwrap();
    let bytes = std::fs::read(&png).unwrap();
    assert_eq!(&bytes[..4], b"\x89PNG");
}

#[test]
fn test_blank_source_shows_placeholder_without_worker() {
    let mut pipeline = RenderPipeline::new(0);
    pipeline.schedule_immediate(request("  \n", ChartType::Flowchart), 0);
    assert!(pipeline.tick(0));
    assert!(!pipeline.is_rendering());
    assert_eq!(
        pipeline.display(),
        &Display::Placeholder(ChartType::Flowchart)
    );
}

#[test]
fn test_deep_outline_settles_as_error_on_worker() {
    let source: String = (0..1000)
        .map(|level| format!("{}- level {level}\n", "  ".repeat(level)))
        .collect();
    let mut pipeline = RenderPipeline::new(0);
    pipeline.schedule_immediate(request(&source, ChartType::MindMap), 0);
    pipeline.tick(0);
    wait_until_settled(&mut pipeline);
    assert_eq!(pipeline.phase(), RenderPhase::Failed);
    assert!(
        matches!(pipeline.display(), Display::Error(msg) if msg.contains("deeper than")),
        "{:?}",
        pipeline.display()
    );
}

#[test]
fn test_flowchart_exports_through_mermaid_renderer() {
    let mut pipeline = RenderPipeline::new(0);
    pipeline.schedule_immediate(
        request("flowchart LR\nA[Write] --> B{Review}\nB -->|ok| C[Ship]", ChartType::Flowchart),
        0,
    );
    pipeline.tick(0);
    wait_until_settled(&mut pipeline);
    let visual = pipeline.current_visual().expect("visual");

    let dir = tempfile::tempdir().unwrap();
    let svg = export_visual(Some(&visual), ExportFormat::Svg, 1.0, dir.path(), 9).unwrap();
    let text = std::fs::read_to_string(&svg).unwrap();
    assert!(text.starts_with("<svg"));
    assert!(text.contains("Review"));
    assert!(text.contains(style().palette().background));

    let jpeg = export_visual(Some(&visual), ExportFormat::Jpeg, 1.0, dir.path(), 10).unwrap();
    assert_eq!(&std::fs::read(&jpeg).unwrap()[..2], &[0xFF, 0xD8]);
}
