use std::io::{Write, stdout};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::execute;
use ratatui::DefaultTerminal;

use crate::app::{App, Message, Model, ToastLevel, update};
use crate::document::Document;
use crate::render::{FRAME_MS, RenderPipeline};
use crate::store::{PersistedState, StateStore};

/// Longest idle wait between loop iterations.
const IDLE_POLL_MS: u64 = 250;
const RESIZE_SETTLE_MS: u64 = 100;

/// Holds the latest queued value until `delay_ms` passes without a newer one.
pub(super) struct Debouncer<T> {
    delay_ms: u64,
    pending: Option<(T, u64)>,
}

/// Terminal size, applied once resizing settles.
pub(super) type ResizeDebouncer = Debouncer<(u16, u16)>;

impl<T> Debouncer<T> {
    pub(super) const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    pub(super) fn queue(&mut self, value: T, now_ms: u64) {
        self.pending = Some((value, now_ms));
    }

    pub(super) fn take_ready(&mut self, now_ms: u64) -> Option<T> {
        let (_, queued_at) = self.pending.as_ref()?;
        if now_ms.saturating_sub(*queued_at) < self.delay_ms {
            return None;
        }
        self.pending.take().map(|(value, _)| value)
    }

    pub(super) const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl App {
    /// Run the main event loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the source file cannot be read, the terminal
    /// cannot be initialized, or the event loop hits an I/O failure.
    pub fn run(&mut self) -> Result<()> {
        let _run_scope = crate::perf::scope("app.run.total");

        let store = self.state_file.clone().map(StateStore::new);
        let (state, state_warning) = match store.as_ref().map(StateStore::load) {
            Some(Ok(state)) => (state, None),
            Some(Err(err)) => {
                tracing::warn!(%err, "ignoring unreadable state file");
                (PersistedState::default(), Some(format!("State not restored: {err}")))
            }
            None => (PersistedState::default(), None),
        };

        let read_scope = crate::perf::scope("app.read_source");
        let document = self.initial_document(&state)?;
        drop(read_scope);

        let init_scope = crate::perf::scope("app.ratatui_init");
        let mut terminal = ratatui::try_init()
            .context("Failed to initialize terminal - chartpad requires an interactive terminal")?;
        let size = terminal.size()?;
        drop(init_scope);
        crate::perf::log_event(
            "init.layout",
            format!(
                "terminal={}x{} type={} layout={:?}",
                size.width,
                size.height,
                document.chart_type().slug(),
                state.layout_orientation
            ),
        );

        let persist_type = document.chart_type() != state.chart_type;
        let mut model = Model::new(document, state, (size.width, size.height))
            .with_pipeline(RenderPipeline::new(self.debounce_ms));
        model.export_dir.clone_from(&self.export_dir);
        model.state_path.clone_from(&self.state_file);
        model
            .config_global_path
            .clone_from(&self.config_global_path);
        model.config_local_path.clone_from(&self.config_local_path);
        model.mouse_enabled = self.mouse_enabled;
        model.persist_dirty = persist_type;
        if let Some(warning) = state_warning {
            model.show_toast(ToastLevel::Warning, warning);
        }

        execute!(stdout(), EnableBracketedPaste)?;
        let result = self.event_loop(&mut terminal, &mut model, store.as_ref());

        let _ = execute!(stdout(), DisableBracketedPaste, DisableMouseCapture);
        ratatui::restore();

        model.persist_retry_at = None;
        Self::persist_state(&mut model, store.as_ref(), Instant::now());
        crate::perf::report_render_stats();
        result
    }

    /// File contents when a path was given, otherwise the template of the
    /// requested or last used chart type.
    fn initial_document(&self, state: &PersistedState) -> Result<Document> {
        let Some(path) = &self.source_path else {
            return Ok(Document::with_type(self.chart_type.unwrap_or(state.chart_type)));
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(match self.chart_type {
            Some(chart_type) => Document::from_source(content, chart_type),
            None => Document::from_file(path, content, state.chart_type),
        })
    }

    fn event_loop(
        &self,
        terminal: &mut DefaultTerminal,
        model: &mut Model,
        store: Option<&StateStore>,
    ) -> Result<()> {
        let start = Instant::now();
        let mut resize_debouncer = ResizeDebouncer::new(RESIZE_SETTLE_MS);
        let mut frames: u64 = 0;
        let mut dirty = true;
        let mut mouse_captured = false;

        model.schedule_initial_render(0);

        loop {
            if model.mouse_enabled != mouse_captured {
                set_mouse_capture(model.mouse_enabled)?;
                mouse_captured = model.mouse_enabled;
            }

            let now_ms = elapsed_ms(start);
            dirty |= model.expire_toast(Instant::now());
            if let Some((width, height)) = resize_debouncer.take_ready(now_ms) {
                crate::perf::log_event("resize.settled", format!("{width}x{height}"));
                dispatch(model, Message::Resize(width, height));
                dirty = true;
            }

            model.schedule_render(now_ms);
            dirty |= model.pipeline.tick(now_ms);
            if model.pipeline.poll() {
                model.clamp_pan();
                dirty = true;
            }
            let loading = model.pipeline.is_loading(now_ms);
            dirty |= loading != model.loading;
            model.loading = loading;

            Self::persist_state(model, store, Instant::now());

            if dirty {
                frames += 1;
                let drawn_at = Instant::now();
                terminal.draw(|frame| self.view(model, frame))?;
                crate::perf::log_event(
                    "frame.draw",
                    format!("#{frames} {:.3} ms", drawn_at.elapsed().as_secs_f64() * 1000.0),
                );
                dirty = false;
            }
            if model.should_quit {
                break;
            }

            let wait_ms = match model.pipeline.next_due_ms() {
                Some(due) => due.saturating_sub(now_ms).min(IDLE_POLL_MS),
                None if model.pipeline.is_rendering() || resize_debouncer.is_pending() => FRAME_MS,
                None => IDLE_POLL_MS,
            };

            // Everything already queued is applied before the next draw.
            let mut wait = Duration::from_millis(wait_ms);
            let mut handled = 0_u32;
            while event::poll(wait)? {
                wait = Duration::ZERO;
                let event = event::read()?;
                if let Some(msg) =
                    self.handle_event(&event, model, elapsed_ms(start), &mut resize_debouncer)
                {
                    crate::perf::log_event("event.message", format!("{msg:?}"));
                    dispatch(model, msg);
                    handled += 1;
                }
            }
            if handled > 0 {
                crate::perf::log_event("event.batch", format!("#{frames} messages={handled}"));
                dirty = true;
            }
        }
        if mouse_captured {
            let _ = set_mouse_capture(false);
        }
        Ok(())
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Apply `msg` to the model, then run its side effects.
fn dispatch(model: &mut Model, msg: Message) {
    let effect = msg.clone();
    *model = update(std::mem::take(model), msg);
    App::handle_message_side_effects(model, &effect);
}

/// Toggle crossterm mouse capture together with SGR (1006) button-event
/// tracking (1002).
fn set_mouse_capture(enabled: bool) -> std::io::Result<()> {
    let mut out = stdout();
    if enabled {
        execute!(out, EnableMouseCapture)?;
        out.write_all(b"\x1b[?1002h\x1b[?1006h")?;
    } else {
        out.write_all(b"\x1b[?1002l\x1b[?1006l")?;
        execute!(out, DisableMouseCapture)?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::{Debouncer, ResizeDebouncer};

    #[test]
    fn test_resize_debouncer_waits_for_quiet_period() {
        let mut debouncer = ResizeDebouncer::new(100);
        debouncer.queue((80, 24), 0);
        debouncer.queue((100, 30), 50);
        assert!(debouncer.is_pending());
        assert_eq!(debouncer.take_ready(120), None);
        assert_eq!(debouncer.take_ready(150), Some((100, 30)));
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_zero_delay_releases_immediately() {
        let mut debouncer: Debouncer<&str> = Debouncer::new(0);
        assert_eq!(debouncer.take_ready(0), None);
        debouncer.queue("now", 7);
        assert_eq!(debouncer.take_ready(7), Some("now"));
    }
}
