//! Saved document snapshots, most recent first.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::chart::ChartType;

/// Oldest entries beyond this count are dropped on insert.
pub const MAX_HISTORY_ENTRIES: usize = 50;

/// An immutable saved snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub title: String,
    #[serde(alias = "code")]
    pub source: String,
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(
        id: String,
        title: String,
        source: String,
        chart_type: ChartType,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            source,
            chart_type,
            created_at: now,
            updated_at: now,
        }
    }

    /// First non-blank source line, for list previews.
    pub fn preview(&self) -> &str {
        self.source
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("")
    }

    fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle) || self.source.to_lowercase().contains(needle)
    }
}

/// Title used when the caller does not supply one.
pub fn default_title(chart_type: ChartType, now: DateTime<Local>) -> String {
    format!("{} - {}", chart_type.label(), now.format("%Y-%m-%d %H:%M:%S"))
}

/// Bounded snapshot list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<HistoryEntry>", into = "Vec<HistoryEntry>")]
pub struct HistoryStore {
    entries: Vec<HistoryEntry>,
}

impl From<Vec<HistoryEntry>> for HistoryStore {
    fn from(mut entries: Vec<HistoryEntry>) -> Self {
        entries.truncate(MAX_HISTORY_ENTRIES);
        Self { entries }
    }
}

impl From<HistoryStore> for Vec<HistoryEntry> {
    fn from(store: HistoryStore) -> Self {
        store.entries
    }
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend `entry`, dropping the oldest entries past the cap.
    pub fn add(&mut self, entry: HistoryEntry) {
        self.entries.insert(0, entry);
        self.entries.truncate(MAX_HISTORY_ENTRIES);
    }

    /// Remove the entry with `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Case-insensitive substring match over title and source, in store order.
    pub fn search(&self, query: &str) -> Vec<&HistoryEntry> {
        let needle = query.to_lowercase();
        self.entries
            .iter()
            .filter(|entry| needle.is_empty() || entry.matches(&needle))
            .collect()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Time-based ids that never repeat within a session.
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryIds {
    last: u64,
}

impl HistoryIds {
    pub const fn new() -> Self {
        Self { last: 0 }
    }

    /// Next id: `now_ms`, or one past the previous id if the clock has not moved.
    pub fn next(&mut self, now_ms: u64) -> String {
        self.last = now_ms.max(self.last + 1);
        self.last.to_string()
    }

    /// Continue after the highest numeric id already stored.
    pub fn seed_from(&mut self, store: &HistoryStore) {
        let highest = store
            .iter()
            .filter_map(|entry| entry.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        self.last = self.last.max(highest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn entry(id: &str, title: &str, source: &str) -> HistoryEntry {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        HistoryEntry::new(
            id.to_string(),
            title.to_string(),
            source.to_string(),
            ChartType::Flowchart,
            now,
        )
    }

    #[test]
    fn test_add_prepends() {
        let mut store = HistoryStore::new();
        store.add(entry("1", "first", "a"));
        store.add(entry("2", "second", "b"));
        let ids: Vec<&str> = store.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
    }

    #[test]
    fn test_add_drops_oldest_past_cap() {
        let mut store = HistoryStore::new();
        for i in 0..=MAX_HISTORY_ENTRIES {
            store.add(entry(&i.to_string(), "t", "s"));
        }
        assert_eq!(store.len(), MAX_HISTORY_ENTRIES);
        assert_eq!(store.entries()[0].id, MAX_HISTORY_ENTRIES.to_string());
        assert!(store.get("0").is_none());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut store = HistoryStore::new();
        store.add(entry("1", "t", "s"));
        assert!(store.remove("1"));
        assert!(!store.remove("1"));
        assert!(!store.remove("missing"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_search_is_case_insensitive_over_title_and_source() {
        let mut store = HistoryStore::new();
        store.add(entry("1", "Login flow", "graph TD\nA-->B"));
        store.add(entry("2", "Plan", "# Roadmap"));
        store.add(entry("3", "Other", "graph LR\nLOGIN-->X"));
        let hits: Vec<&str> = store.search("login").iter().map(|e| e.id.as_str()).collect();
        assert_eq!(hits, vec!["3", "1"]);
        assert_eq!(store.search("ROADMAP").len(), 1);
        assert_eq!(store.search("").len(), 3);
        assert!(store.search("nothing").is_empty());
    }

    #[test]
    fn test_search_matches_spaces_literally() {
        let mut store = HistoryStore::new();
        store.add(entry("1", "Login flow", "graph TD"));
        store.add(entry("2", "Loginflow", "graph TD"));
        let hits: Vec<&str> = store.search("n f").iter().map(|e| e.id.as_str()).collect();
        assert_eq!(hits, vec!["1"]);
        assert!(store.search(" login").is_empty());
    }

    #[test]
    fn test_default_title_format() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(
            default_title(ChartType::MindMap, now),
            "Mind map - 2024-03-09 07:05:01"
        );
    }

    #[test]
    fn test_ids_are_strictly_increasing() {
        let mut ids = HistoryIds::new();
        assert_eq!(ids.next(1000), "1000");
        assert_eq!(ids.next(1000), "1001");
        assert_eq!(ids.next(999), "1002");
        assert_eq!(ids.next(5000), "5000");
    }

    #[test]
    fn test_ids_seed_from_store() {
        let mut store = HistoryStore::new();
        store.add(entry("4000", "t", "s"));
        let mut ids = HistoryIds::new();
        ids.seed_from(&store);
        assert_eq!(ids.next(10), "4001");
    }

    #[test]
    fn test_deserialize_truncates_and_accepts_legacy_code_field() {
        let json = serde_json::json!([{
            "id": "1",
            "title": "t",
            "code": "graph TD",
            "type": "mermaid",
            "createdAt": "2024-05-01T12:00:00Z",
            "updatedAt": "2024-05-01T12:00:00Z"
        }]);
        let store: HistoryStore = serde_json::from_value(json).unwrap();
        assert_eq!(store.entries()[0].source, "graph TD");
        assert_eq!(store.entries()[0].chart_type, ChartType::Flowchart);

        let many: Vec<HistoryEntry> = (0..60).map(|i| entry(&i.to_string(), "t", "s")).collect();
        let value = serde_json::to_value(&many).unwrap();
        let store: HistoryStore = serde_json::from_value(value).unwrap();
        assert_eq!(store.len(), MAX_HISTORY_ENTRIES);
    }

    #[test]
    fn test_preview_skips_blank_lines() {
        assert_eq!(entry("1", "t", "\n\n  graph TD\nA").preview(), "graph TD");
    }

    proptest! {
        #[test]
        fn history_never_exceeds_cap(count in 0usize..150) {
            let mut store = HistoryStore::new();
            for i in 0..count {
                store.add(entry(&i.to_string(), "t", "s"));
            }
            prop_assert_eq!(store.len(), count.min(MAX_HISTORY_ENTRIES));
            if count > 0 {
                let newest = (count - 1).to_string();
                prop_assert_eq!(store.entries()[0].id.as_str(), newest.as_str());
            }
        }
    }
}
