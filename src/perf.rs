//! Scope timings, render statistics and the opt-in render debug log.
//!
//! Every event is also emitted through `tracing` at debug level, so
//! `RUST_LOG=chartpad=debug` shows the same stream without a log file.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Environment variable naming a debug log path when no flag is given.
pub const DEBUG_LOG_ENV: &str = "CHARTPAD_RENDER_DEBUG_LOG";

static TIMINGS_ENABLED: AtomicBool = AtomicBool::new(false);
static DEBUG_LOG: LazyLock<Mutex<DebugLog>> = LazyLock::new(|| Mutex::new(DebugLog::default()));
static RENDER_STATS: LazyLock<Mutex<BTreeMap<&'static str, RenderTiming>>> =
    LazyLock::new(|| Mutex::new(BTreeMap::new()));

struct DebugLog {
    opened_at: Instant,
    writer: Option<BufWriter<File>>,
}

impl Default for DebugLog {
    fn default() -> Self {
        Self {
            opened_at: Instant::now(),
            writer: None,
        }
    }
}

impl DebugLog {
    fn write_line(&mut self, name: &str, detail: &str) {
        let elapsed_ms = self.opened_at.elapsed().as_secs_f64() * 1000.0;
        if let Some(writer) = self.writer.as_mut() {
            let _ = writeln!(writer, "[{elapsed_ms:>10.3} ms] {name}: {detail}");
            let _ = writer.flush();
        }
    }
}

// Lock poisoning from a panicked render worker is ignored.
fn debug_log() -> MutexGuard<'static, DebugLog> {
    DEBUG_LOG.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Times a named section until dropped.
#[derive(Debug)]
pub struct Scope {
    name: &'static str,
    start: Instant,
}

impl Drop for Scope {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        if is_enabled() {
            eprintln!("[perf] {}: {:.2} ms", self.name, elapsed_ms);
        }
        log_event("scope", format!("{} ms={elapsed_ms:.3}", self.name));
    }
}

pub fn scope(name: &'static str) -> Scope {
    Scope {
        name,
        start: Instant::now(),
    }
}

/// Turn stderr scope timings (`--perf`) on or off.
pub fn set_enabled(enabled: bool) {
    TIMINGS_ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn is_enabled() -> bool {
    TIMINGS_ENABLED.load(Ordering::Relaxed)
}

/// Start writing debug events to `path`, or stop when `None`.
pub fn set_debug_log_path(path: Option<&Path>) -> std::io::Result<()> {
    let mut log = debug_log();
    log.writer = None;
    let Some(path) = path else {
        return Ok(());
    };
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "chartpad render debug log start")?;
    writer.flush()?;
    log.opened_at = Instant::now();
    log.writer = Some(writer);
    Ok(())
}

pub fn is_debug_log_enabled() -> bool {
    debug_log().writer.is_some()
}

/// Debug log path from the environment, if set and non-empty.
pub fn debug_log_path_from_env() -> Option<PathBuf> {
    std::env::var_os(DEBUG_LOG_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

pub fn log_event(name: &str, detail: impl AsRef<str>) {
    let detail = detail.as_ref();
    tracing::debug!(event = name, detail);
    debug_log().write_line(name, detail);
}

/// Accumulated worker time for one renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderTiming {
    pub renders: u32,
    pub total: Duration,
    pub slowest: Duration,
}

impl RenderTiming {
    pub fn mean(&self) -> Duration {
        if self.renders == 0 {
            Duration::ZERO
        } else {
            self.total / self.renders
        }
    }
}

/// Record one finished render of the `renderer` adapter (a chart type slug).
pub fn record_render(renderer: &'static str, elapsed: Duration) {
    let mut stats = RENDER_STATS.lock().unwrap_or_else(PoisonError::into_inner);
    let timing = stats.entry(renderer).or_default();
    timing.renders += 1;
    timing.total += elapsed;
    timing.slowest = timing.slowest.max(elapsed);
}

pub fn render_stats() -> Vec<(&'static str, RenderTiming)> {
    RENDER_STATS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .map(|(name, timing)| (*name, *timing))
        .collect()
}

/// Print per-renderer timings to stderr when `--perf` is on.
pub fn report_render_stats() {
    if !is_enabled() {
        return;
    }
    for (name, timing) in render_stats() {
        eprintln!(
            "[perf] render.{name}: {} renders, mean {:.2} ms, slowest {:.2} ms",
            timing.renders,
            timing.mean().as_secs_f64() * 1000.0,
            timing.slowest.as_secs_f64() * 1000.0
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_set_enabled_toggles_runtime_flag() {
        set_enabled(true);
        assert!(is_enabled());

        set_enabled(false);
        assert!(!is_enabled());
    }

    #[test]
    fn test_debug_log_path_enables_logging_and_writes() {
        let temp_file = NamedTempFile::new().unwrap();
        set_debug_log_path(Some(temp_file.path())).unwrap();
        assert!(is_debug_log_enabled());
        log_event("render.fire", "generation=3");
        set_debug_log_path(None).unwrap();
        assert!(!is_debug_log_enabled());

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("chartpad render debug log start"));
        assert!(content.contains("render.fire: generation=3"));
    }

    #[test]
    fn test_record_render_tracks_mean_and_slowest() {
        record_render("perf-test", Duration::from_millis(10));
        record_render("perf-test", Duration::from_millis(30));
        let (_, timing) = render_stats()
            .into_iter()
            .find(|(name, _)| *name == "perf-test")
            .unwrap();
        assert_eq!(timing.renders, 2);
        assert_eq!(timing.mean(), Duration::from_millis(20));
        assert_eq!(timing.slowest, Duration::from_millis(30));
    }

    #[test]
    fn test_mean_of_empty_timing_is_zero() {
        assert_eq!(RenderTiming::default().mean(), Duration::ZERO);
    }
}
