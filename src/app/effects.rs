use std::io::{Write, stdout};
use std::time::{Duration, Instant};

use base64::Engine;
use chrono::Utc;

use crate::app::{App, Message, Model, ToastLevel};
use crate::export::{ExportError, ExportFormat, export_visual};
use crate::store::StateStore;

/// Wait before retrying a failed state write.
const PERSIST_RETRY: Duration = Duration::from_secs(5);

impl App {
    pub(super) fn handle_message_side_effects(model: &mut Model, msg: &Message) {
        match msg {
            Message::SaveSnapshot => {
                model.save_snapshot(None, Utc::now());
            }
            Message::Export(format) => Self::export_current(model, *format),
            Message::TutorialCopy => {
                let Some(section) = model.selected_tutorial() else {
                    return;
                };
                match copy_to_clipboard(section.code) {
                    Ok(()) => model.show_toast(
                        ToastLevel::Info,
                        format!("Copied \"{}\" to clipboard", section.title),
                    ),
                    Err(err) => {
                        model.show_toast(ToastLevel::Error, format!("Copy failed: {err}"));
                    }
                }
            }
            _ => {}
        }
    }

    fn export_current(model: &mut Model, format: ExportFormat) {
        let visual = model.current_visual();
        let now_ms = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        let result = export_visual(
            visual.as_deref(),
            format,
            model.view.scale(),
            &model.export_dir,
            now_ms,
        );
        match result {
            Ok(path) => {
                model.show_toast(ToastLevel::Info, format!("Exported {}", path.display()));
            }
            Err(ExportError::MissingVisual) => {
                model.show_toast(ToastLevel::Warning, "Nothing to export yet");
            }
            Err(err) => {
                model.show_toast(ToastLevel::Error, format!("Export failed: {err}"));
                crate::perf::log_event(
                    "export.error",
                    format!("format={} err={err}", format.label()),
                );
            }
        }
    }

    /// Write persisted fields if they changed. A failed write keeps them
    /// pending and is retried after `PERSIST_RETRY`.
    pub(super) fn persist_state(model: &mut Model, store: Option<&StateStore>, now: Instant) {
        if !model.needs_persist() || model.persist_retry_at.is_some_and(|at| now < at) {
            return;
        }
        let Some(store) = store else {
            model.mark_persisted();
            return;
        };
        match store.save(&model.persisted_state()) {
            Ok(()) => model.mark_persisted(),
            Err(err) => {
                tracing::warn!(%err, "failed to write state file");
                model.persist_retry_at = Some(now + PERSIST_RETRY);
                model.show_toast(ToastLevel::Warning, format!("Could not save state: {err}"));
            }
        }
    }
}

fn copy_to_clipboard(text: &str) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    {
        if copy_to_pbcopy(text).is_ok() {
            return Ok(());
        }
    }
    copy_to_clipboard_osc52(text)
}

#[cfg(target_os = "macos")]
fn copy_to_pbcopy(text: &str) -> std::io::Result<()> {
    use std::process::{Command, Stdio};

    let mut child = Command::new("pbcopy").stdin(Stdio::piped()).spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes())?;
    }
    let status = child.wait()?;
    if status.success() {
        Ok(())
    } else {
        Err(std::io::Error::other("pbcopy failed"))
    }
}

fn copy_to_clipboard_osc52(text: &str) -> std::io::Result<()> {
    let osc = osc52_sequence(text);
    let mut out = stdout();
    out.write_all(osc.as_bytes())?;
    out.flush()
}

fn osc52_sequence(text: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());
    format!("\x1b]52;c;{encoded}\x07")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::store::PersistedState;
    use tempfile::tempdir;

    #[test]
    fn test_osc52_sequence_encodes_tutorial_code() {
        let seq = osc52_sequence("graph TD;\n    A-->B;");
        assert_eq!(seq, "\x1b]52;c;Z3JhcGggVEQ7CiAgICBBLS0+Qjs=\x07");
    }

    #[test]
    fn test_export_without_visual_warns() {
        let dir = tempdir().unwrap();
        let mut model = Model::new(Document::new(), PersistedState::default(), (80, 24));
        model.export_dir = dir.path().to_path_buf();
        App::handle_message_side_effects(&mut model, &Message::Export(ExportFormat::Svg));
        assert_eq!(
            model.active_toast(),
            Some(("Nothing to export yet", ToastLevel::Warning))
        );
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_save_snapshot_effect_adds_history() {
        let mut model = Model::new(Document::new(), PersistedState::default(), (80, 24));
        App::handle_message_side_effects(&mut model, &Message::SaveSnapshot);
        assert_eq!(model.history.len(), 1);
        assert!(model.needs_persist());
    }

    #[test]
    fn test_persist_state_writes_and_clears_flag() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        let mut model = Model::new(Document::new(), PersistedState::default(), (80, 24));
        model.save_snapshot(Some("first".to_string()), Utc::now());
        App::persist_state(&mut model, Some(&store), Instant::now());
        assert!(!model.needs_persist());
        let restored = store.load().unwrap();
        assert_eq!(restored.history.len(), 1);
        assert_eq!(restored.history.entries()[0].title, "first");
    }

    #[test]
    fn test_persist_failure_keeps_memory_state() {
        let dir = tempdir().unwrap();
        // A directory where the file should be makes the rename fail.
        let blocked = dir.path().join("state.json");
        std::fs::create_dir(&blocked).unwrap();
        std::fs::write(blocked.join("occupant"), "x").unwrap();
        let store = StateStore::new(&blocked);
        let mut model = Model::new(Document::new(), PersistedState::default(), (80, 24));
        model.save_snapshot(None, Utc::now());
        App::persist_state(&mut model, Some(&store), Instant::now());
        assert_eq!(model.history.len(), 1);
        assert_eq!(model.active_toast().map(|(_, level)| level), Some(ToastLevel::Warning));
        assert!(model.needs_persist());
    }

    #[test]
    fn test_failed_persist_is_retried_after_backoff() {
        let dir = tempdir().unwrap();
        let blocked = dir.path().join("state.json");
        std::fs::create_dir(&blocked).unwrap();
        std::fs::write(blocked.join("occupant"), "x").unwrap();
        let store = StateStore::new(&blocked);
        let mut model = Model::new(Document::new(), PersistedState::default(), (80, 24));
        model.save_snapshot(Some("kept".to_string()), Utc::now());

        let failed_at = Instant::now();
        App::persist_state(&mut model, Some(&store), failed_at);
        assert!(model.needs_persist());

        std::fs::remove_dir_all(&blocked).unwrap();
        App::persist_state(&mut model, Some(&store), failed_at + Duration::from_secs(1));
        assert!(model.needs_persist());
        assert!(!blocked.exists());

        App::persist_state(&mut model, Some(&store), failed_at + PERSIST_RETRY);
        assert!(!model.needs_persist());
        let restored = store.load().unwrap();
        assert_eq!(restored.history.entries()[0].title, "kept");
    }
}
