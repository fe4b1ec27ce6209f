//! Debounced, superseding chart rendering.
//!
//! Every [`RenderPipeline::schedule`] call bumps a generation counter and
//! restarts the quiet window. When the window elapses the renderer for the
//! request's chart type runs on a worker thread; its outcome is applied only
//! if no newer request was scheduled in the meantime.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Instant;

use crate::chart::{ChartRenderer, ChartType, RenderError, Renderers, Visual};
use crate::settings::StyleConfig;

pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
/// Loading indicator is suppressed for renders faster than one frame.
pub const FRAME_MS: u64 = 16;
/// Worker stack, sized for deep charts.
const WORKER_STACK_BYTES: usize = 16 * 1024 * 1024;

/// Inputs of one render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub source: String,
    pub chart_type: ChartType,
    pub style: StyleConfig,
}

impl RenderRequest {
    pub fn new(source: impl Into<String>, chart_type: ChartType, style: StyleConfig) -> Self {
        Self {
            source: source.into(),
            chart_type,
            style,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPhase {
    Idle,
    Debouncing,
    Rendering,
    Settled,
    Failed,
}

/// What the preview pane shows.
#[derive(Debug, Clone, PartialEq)]
pub enum Display {
    /// Nothing rendered yet.
    Empty,
    /// Blank source; hint text for the given chart type.
    Placeholder(ChartType),
    Visual(Arc<Visual>),
    /// Error panel. Wins over any earlier visual until the next success.
    Error(String),
}

struct Outcome {
    generation: u64,
    result: Result<Visual, RenderError>,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    generation: u64,
    started_ms: u64,
}

pub struct RenderPipeline {
    renderers: Renderers,
    debounce_ms: u64,
    generation: u64,
    pending: Option<(RenderRequest, u64)>,
    in_flight: Option<InFlight>,
    phase: RenderPhase,
    display: Display,
    tx: Sender<Outcome>,
    rx: Receiver<Outcome>,
}

impl std::fmt::Debug for RenderPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderPipeline")
            .field("debounce_ms", &self.debounce_ms)
            .field("generation", &self.generation)
            .field("phase", &self.phase)
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

impl Default for RenderPipeline {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_MS)
    }
}

impl RenderPipeline {
    pub fn new(debounce_ms: u64) -> Self {
        Self::with_renderers(Renderers::default(), debounce_ms)
    }

    pub fn with_renderers(renderers: Renderers, debounce_ms: u64) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            renderers,
            debounce_ms,
            generation: 0,
            pending: None,
            in_flight: None,
            phase: RenderPhase::Idle,
            display: Display::Empty,
            tx,
            rx,
        }
    }

    /// Queue `request`, superseding anything queued or running.
    pub fn schedule(&mut self, request: RenderRequest, now_ms: u64) {
        self.schedule_at(request, now_ms.saturating_add(self.debounce_ms));
    }

    /// Queue `request` to fire on the next tick, skipping the quiet window.
    pub fn schedule_immediate(&mut self, request: RenderRequest, now_ms: u64) {
        self.schedule_at(request, now_ms);
    }

    fn schedule_at(&mut self, request: RenderRequest, due: u64) {
        self.generation += 1;
        crate::perf::log_event(
            "render.schedule",
            format!(
                "generation={} type={} due={due}",
                self.generation,
                request.chart_type.slug()
            ),
        );
        self.pending = Some((request, due));
        self.phase = RenderPhase::Debouncing;
    }

    /// Fire the queued request once its quiet window has elapsed.
    ///
    /// Returns true when something was fired.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        let Some((_, due)) = &self.pending else {
            return false;
        };
        if now_ms < *due {
            return false;
        }
        let Some((request, _)) = self.pending.take() else {
            return false;
        };
        let generation = self.generation;

        if request.source.trim().is_empty() {
            crate::perf::log_event("render.placeholder", format!("generation={generation}"));
            self.in_flight = None;
            self.display = Display::Placeholder(request.chart_type);
            self.phase = RenderPhase::Settled;
            return true;
        }

        crate::perf::log_event(
            "render.fire",
            format!(
                "generation={generation} type={} bytes={}",
                request.chart_type.slug(),
                request.source.len()
            ),
        );
        let renderer = self.renderers.for_chart(request.chart_type);
        let tx = self.tx.clone();
        let spawned = std::thread::Builder::new()
            .name("chartpad-render".to_string())
            .stack_size(WORKER_STACK_BYTES)
            .spawn(move || {
                let result = run_renderer(renderer.as_ref(), &request);
                let _ = tx.send(Outcome { generation, result });
            });
        match spawned {
            Ok(_) => {
                self.in_flight = Some(InFlight {
                    generation,
                    started_ms: now_ms,
                });
                self.phase = RenderPhase::Rendering;
            }
            Err(err) => {
                tracing::warn!(%err, "failed to spawn render worker");
                self.apply_failure(format!("Renderer failed: {err}"));
            }
        }
        true
    }

    /// Apply finished worker outcomes. Returns true when the display changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(outcome) = self.rx.try_recv() {
            if outcome.generation != self.generation {
                crate::perf::log_event(
                    "render.discarded",
                    format!(
                        "generation={} latest={}",
                        outcome.generation, self.generation
                    ),
                );
                continue;
            }
            self.in_flight = None;
            match outcome.result {
                Ok(visual) => {
                    crate::perf::log_event(
                        "render.settled",
                        format!(
                            "generation={} nodes={}",
                            outcome.generation,
                            visual.scene.nodes.len()
                        ),
                    );
                    self.display = Display::Visual(Arc::new(visual));
                    self.phase = RenderPhase::Settled;
                }
                Err(err) => {
                    crate::perf::log_event(
                        "render.failed",
                        format!("generation={} error={err}", outcome.generation),
                    );
                    self.apply_failure(err.to_string());
                }
            }
            changed = true;
        }
        changed
    }

    fn apply_failure(&mut self, message: String) {
        self.in_flight = None;
        self.display = Display::Error(message);
        self.phase = RenderPhase::Failed;
    }

    /// True while the latest render is running and has outlasted one frame.
    pub fn is_loading(&self, now_ms: u64) -> bool {
        self.in_flight.is_some_and(|flight| {
            flight.generation == self.generation
                && now_ms.saturating_sub(flight.started_ms) >= FRAME_MS
        })
    }

    /// True while a worker for the latest generation has not reported back.
    pub fn is_rendering(&self) -> bool {
        self.in_flight
            .is_some_and(|flight| flight.generation == self.generation)
    }

    /// When the queued request becomes due, if any.
    pub fn next_due_ms(&self) -> Option<u64> {
        self.pending.as_ref().map(|(_, due)| *due)
    }

    pub const fn phase(&self) -> RenderPhase {
        self.phase
    }

    pub const fn display(&self) -> &Display {
        &self.display
    }

    pub const fn generation(&self) -> u64 {
        self.generation
    }

    pub const fn debounce_ms(&self) -> u64 {
        self.debounce_ms
    }

    /// The visual on screen. `None` for placeholder, error and empty states.
    pub fn current_visual(&self) -> Option<Arc<Visual>> {
        match &self.display {
            Display::Visual(visual) => Some(Arc::clone(visual)),
            _ => None,
        }
    }
}

fn run_renderer(
    renderer: &dyn ChartRenderer,
    request: &RenderRequest,
) -> Result<Visual, RenderError> {
    let started = Instant::now();
    let result = catch_unwind(AssertUnwindSafe(|| {
        renderer.render(&request.source, &request.style)
    }))
    .unwrap_or_else(|_| Err(RenderError::Failed("renderer panicked".to_string())));
    crate::perf::record_render(request.chart_type.slug(), started.elapsed());
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::Scene;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Condvar, Mutex};
    use std::time::{Duration, Instant};

    /// Counts calls and records the sources it was given.
    #[derive(Default)]
    struct CountingRenderer {
        calls: AtomicUsize,
        sources: Mutex<Vec<String>>,
    }

    impl ChartRenderer for CountingRenderer {
        fn render(&self, source: &str, style: &StyleConfig) -> Result<Visual, RenderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.sources.lock().unwrap().push(source.to_string());
            if source.contains("bad") {
                return Err(RenderError::Parse {
                    line: 1,
                    message: "bad input".to_string(),
                });
            }
            Ok(Visual {
                chart_type: ChartType::Flowchart,
                source: source.to_string(),
                scene: Scene::default(),
                style: style.clone(),
            })
        }
    }

    /// Blocks each call until released.
    #[derive(Default)]
    struct GatedRenderer {
        open: Mutex<bool>,
        cond: Condvar,
    }

    impl GatedRenderer {
        fn release(&self) {
            *self.open.lock().unwrap() = true;
            self.cond.notify_all();
        }
    }

    impl ChartRenderer for GatedRenderer {
        fn render(&self, source: &str, style: &StyleConfig) -> Result<Visual, RenderError> {
            let mut open = self.open.lock().unwrap();
            while !*open {
                open = self.cond.wait(open).unwrap();
            }
            drop(open);
            let mut scene = Scene::default();
            scene.width = source.len();
            Ok(Visual {
                chart_type: ChartType::Flowchart,
                source: source.to_string(),
                scene,
                style: style.clone(),
            })
        }
    }

    struct PanickingRenderer;

    impl ChartRenderer for PanickingRenderer {
        fn render(&self, _: &str, _: &StyleConfig) -> Result<Visual, RenderError> {
            panic!("boom");
        }
    }

    fn request(source: &str) -> RenderRequest {
        RenderRequest::new(source, ChartType::Flowchart, StyleConfig::default())
    }

    fn pipeline_with(renderer: Arc<dyn ChartRenderer>) -> RenderPipeline {
        let renderers = Renderers::new(Arc::clone(&renderer), renderer);
        RenderPipeline::with_renderers(renderers, 300)
    }

    fn settle(pipeline: &mut RenderPipeline) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while pipeline.is_rendering() && Instant::now() < deadline {
            pipeline.poll();
            std::thread::sleep(Duration::from_millis(2));
        }
        pipeline.poll();
    }

    #[test]
    fn test_burst_renders_only_final_input() {
        let renderer = Arc::new(CountingRenderer::default());
        let mut pipeline = pipeline_with(renderer.clone());
        pipeline.schedule(request("graph TD\nA"), 0);
        pipeline.schedule(request("graph TD\nA-->B"), 100);
        pipeline.schedule(request("graph TD\nA-->C"), 250);

        assert!(!pipeline.tick(500));
        assert_eq!(pipeline.phase(), RenderPhase::Debouncing);
        assert!(pipeline.tick(550));
        settle(&mut pipeline);

        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            renderer.sources.lock().unwrap().as_slice(),
            ["graph TD\nA-->C".to_string()]
        );
        assert_eq!(pipeline.phase(), RenderPhase::Settled);
        assert!(pipeline.current_visual().is_some());
    }

    #[test]
    fn test_blank_source_shows_placeholder_without_renderer() {
        let renderer = Arc::new(CountingRenderer::default());
        let mut pipeline = pipeline_with(renderer.clone());
        pipeline.schedule(
            RenderRequest::new("  \n\t", ChartType::MindMap, StyleConfig::default()),
            0,
        );
        assert!(pipeline.tick(300));
        assert_eq!(pipeline.display(), &Display::Placeholder(ChartType::MindMap));
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
        assert!(pipeline.current_visual().is_none());
    }

    #[test]
    fn test_error_wins_until_next_success() {
        let renderer = Arc::new(CountingRenderer::default());
        let mut pipeline = pipeline_with(renderer);
        pipeline.schedule(request("good"), 0);
        pipeline.tick(300);
        settle(&mut pipeline);
        assert!(pipeline.current_visual().is_some());

        pipeline.schedule(request("bad"), 1000);
        pipeline.tick(1300);
        settle(&mut pipeline);
        assert_eq!(pipeline.phase(), RenderPhase::Failed);
        assert_eq!(
            pipeline.display(),
            &Display::Error("Parse error on line 1: bad input".to_string())
        );
        assert!(pipeline.current_visual().is_none());

        pipeline.schedule(request("good again"), 2000);
        pipeline.tick(2300);
        settle(&mut pipeline);
        assert!(matches!(pipeline.display(), Display::Visual(_)));
    }

    #[test]
    fn test_stale_result_is_discarded() {
        let gate = Arc::new(GatedRenderer::default());
        let mut pipeline = pipeline_with(gate.clone());
        pipeline.schedule(request("first"), 0);
        pipeline.tick(300);
        assert!(pipeline.is_rendering());

        // Newer request arrives while the first is still running.
        pipeline.schedule(request("second!"), 310);
        assert!(!pipeline.is_rendering());
        gate.release();

        // Give the first worker time to report; its outcome must be ignored.
        std::thread::sleep(Duration::from_millis(50));
        pipeline.poll();
        assert_eq!(pipeline.display(), &Display::Empty);
        assert_eq!(pipeline.phase(), RenderPhase::Debouncing);

        pipeline.tick(610);
        settle(&mut pipeline);
        let visual = pipeline.current_visual().unwrap();
        assert_eq!(visual.scene.width, "second!".len());
    }

    #[test]
    fn test_loading_only_after_one_frame() {
        let gate = Arc::new(GatedRenderer::default());
        let mut pipeline = pipeline_with(gate.clone());
        pipeline.schedule(request("slow"), 0);
        pipeline.tick(300);
        assert!(!pipeline.is_loading(305));
        assert!(pipeline.is_loading(300 + FRAME_MS));
        gate.release();
        settle(&mut pipeline);
        assert!(!pipeline.is_loading(10_000));
    }

    #[test]
    fn test_panicking_renderer_becomes_error() {
        let mut pipeline = pipeline_with(Arc::new(PanickingRenderer));
        pipeline.schedule(request("anything"), 0);
        pipeline.tick(300);
        settle(&mut pipeline);
        assert_eq!(
            pipeline.display(),
            &Display::Error("Renderer failed: renderer panicked".to_string())
        );
    }

    #[test]
    fn test_schedule_immediate_fires_on_next_tick() {
        let renderer = Arc::new(CountingRenderer::default());
        let mut pipeline = pipeline_with(renderer.clone());
        pipeline.schedule_immediate(request("graph TD\nA"), 40);
        assert_eq!(pipeline.next_due_ms(), Some(40));
        assert!(pipeline.tick(40));
        settle(&mut pipeline);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_next_due_tracks_latest_schedule() {
        let mut pipeline = RenderPipeline::new(120);
        assert_eq!(pipeline.next_due_ms(), None);
        pipeline.schedule(request("a"), 10);
        pipeline.schedule(request("b"), 50);
        assert_eq!(pipeline.next_due_ms(), Some(170));
        assert_eq!(pipeline.generation(), 2);
    }

    #[test]
    fn test_real_renderers_produce_visual() {
        let mut pipeline = RenderPipeline::new(0);
        pipeline.schedule(
            RenderRequest::new(
                ChartType::MindMap.default_template(),
                ChartType::MindMap,
                StyleConfig::default(),
            ),
            0,
        );
        pipeline.tick(0);
        settle(&mut pipeline);
        let visual = pipeline.current_visual().unwrap();
        assert_eq!(visual.chart_type, ChartType::MindMap);
        assert!(!visual.scene.nodes.is_empty());
    }
}
