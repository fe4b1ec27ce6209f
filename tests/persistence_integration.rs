use chrono::{Duration, TimeZone, Utc};

use chartpad::chart::ChartType;
use chartpad::history::{HistoryEntry, HistoryStore, MAX_HISTORY_ENTRIES};
use chartpad::settings::{ChartTheme, SettingsPatch};
use chartpad::store::{PersistedState, StateStore};
use chartpad::view::LayoutOrientation;

fn entry(n: i64) -> HistoryEntry {
    let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(n);
    HistoryEntry::new(
        format!("id-{n}"),
        format!("Chart {n}"),
        format!("graph TD\nA{n} --> B{n}"),
        ChartType::Flowchart,
        at,
    )
}

#[test]
fn test_state_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path().join("nested").join("state.json"));

    let mut state = PersistedState::default();
    state.history.add(entry(1));
    state.history.add(entry(2));
    state.chart_type = ChartType::MindMap;
    state.layout_orientation = LayoutOrientation::Vertical;
    state.settings.update(SettingsPatch::theme(ChartTheme::Forest));
    store.save(&state).unwrap();

    let reopened = StateStore::new(store.path().to_path_buf());
    let loaded = reopened.load().unwrap();
    assert_eq!(loaded, state);
    assert_eq!(loaded.history.entries()[0].title, "Chart 2");
}

#[test]
fn test_history_cap_applies_to_loaded_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let entries: Vec<HistoryEntry> = (0..(MAX_HISTORY_ENTRIES as i64 + 10)).map(entry).collect();
    let json = serde_json::json!({ "history": entries });
    std::fs::write(&path, json.to_string()).unwrap();

    let loaded = StateStore::new(&path).load().unwrap();
    assert_eq!(loaded.history.len(), MAX_HISTORY_ENTRIES);
    assert_eq!(loaded.history.entries()[0].id, "id-0");
}

#[test]
fn test_corrupt_state_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = StateStore::new(&path).load().unwrap_err();
    assert!(err.to_string().contains("state.json"));
}

#[test]
fn test_adding_past_cap_drops_oldest() {
    let mut store = HistoryStore::new();
    for n in 0..(MAX_HISTORY_ENTRIES as i64 + 3) {
        store.add(entry(n));
    }
    assert_eq!(store.len(), MAX_HISTORY_ENTRIES);
    assert!(store.get("id-0").is_none());
    assert!(store.get(&format!("id-{}", MAX_HISTORY_ENTRIES + 2)).is_some());
}
