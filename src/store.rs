//! JSON persistence for history, chart type, layout and settings.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::chart::ChartType;
use crate::history::HistoryStore;
use crate::settings::ViewSettings;
use crate::view::LayoutOrientation;

/// Everything that survives a restart. Source text, zoom and open panels do not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedState {
    pub history: HistoryStore,
    pub chart_type: ChartType,
    #[serde(alias = "layout")]
    pub layout_orientation: LayoutOrientation,
    pub settings: ViewSettings,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt state file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads and writes [`PersistedState`] at a fixed path.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the state. A missing file yields defaults.
    pub fn load(&self) -> Result<PersistedState, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(PersistedState::default());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if content.trim().is_empty() {
            return Ok(PersistedState::default());
        }
        serde_json::from_str(&content).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })
    }

    /// Write the state through a temporary sibling and rename it into place.
    pub fn save(&self, state: &PersistedState) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(state).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        crate::perf::log_event("store.write", format!("path={}", self.path.display()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryEntry;
    use crate::settings::ChartTheme;
    use chrono::Utc;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        assert_eq!(store.load().unwrap(), PersistedState::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("nested").join("state.json"));
        let mut state = PersistedState {
            chart_type: ChartType::MindMap,
            layout_orientation: LayoutOrientation::Vertical,
            ..PersistedState::default()
        };
        state.settings.theme = ChartTheme::Forest;
        state.history.add(HistoryEntry::new(
            "1".to_string(),
            "t".to_string(),
            "# Plan".to_string(),
            ChartType::MindMap,
            Utc::now(),
        ));

        store.save(&state).unwrap();
        assert!(!store.path().with_extension("json.tmp").exists());
        assert_eq!(store.load().unwrap(), state);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();
        let err = StateStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Json { .. }));
    }

    #[test]
    fn test_partial_record_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, r#"{"chartType":"markmap","layout":"vertical"}"#).unwrap();
        let state = StateStore::new(&path).load().unwrap();
        assert_eq!(state.chart_type, ChartType::MindMap);
        assert_eq!(state.layout_orientation, LayoutOrientation::Vertical);
        assert_eq!(state.settings, ViewSettings::default());
        assert!(state.history.is_empty());
    }

    #[test]
    fn test_serialized_keys_are_camel_case() {
        let json = serde_json::to_value(PersistedState::default()).unwrap();
        assert!(json.get("chartType").is_some());
        assert!(json.get("layoutOrientation").is_some());
        assert!(json["settings"].get("primaryColor").is_some());
    }
}
