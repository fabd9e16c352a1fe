//! Tests for the recent-history ring: cap, ordering and persistence across stores.

use proptest::prelude::*;
use tempfile::TempDir;

use reel_widgets::history::{self, HISTORY_KEY};
use reel_widgets::*;

fn kind_strategy() -> impl Strategy<Value = RecentKind> {
    prop_oneof![Just(RecentKind::Search), Just(RecentKind::Similar)]
}

// ---------------------------------------------------------------------------
// Cap and ordering
// ---------------------------------------------------------------------------

#[test]
fn test_eleventh_entry_evicts_oldest() {
    let store = MemoryStore::new();
    for i in 0..11u64 {
        history::record(&store, RecentKind::Search, &format!("film {i}"), i, 10).unwrap();
    }
    let entries = history::load(&store);
    assert_eq!(entries.len(), 10);
    assert_eq!(entries[0].value, "film 10");
    assert_eq!(entries[9].value, "film 1");
}

#[test]
fn test_duplicates_are_kept() {
    let store = MemoryStore::new();
    history::record(&store, RecentKind::Search, "Heat", 1, 10).unwrap();
    history::record(&store, RecentKind::Search, "Heat", 2, 10).unwrap();
    assert_eq!(history::load(&store).len(), 2);
}

#[test]
fn test_mixed_kinds_share_one_list() {
    let store = MemoryStore::new();
    history::record(&store, RecentKind::Search, "dog", 1, 10).unwrap();
    history::record(&store, RecentKind::Similar, "Heat", 2, 10).unwrap();
    assert_eq!(
        RecentList::snapshot(&store).lines(),
        vec!["similar Heat", "search dog"]
    );
}

#[test]
fn test_non_array_value_reads_empty() {
    let store = MemoryStore::new();
    store.set(HISTORY_KEY, r#"{"type":"search"}"#).unwrap();
    assert!(RecentList::snapshot(&store).is_empty());
}

fn nine_valid_entries() -> Vec<serde_json::Value> {
    (0..9u64)
        .rev()
        .map(|i| serde_json::json!({"type": "search", "value": format!("film {i}"), "ts": 100 + i}))
        .collect()
}

#[test]
fn test_fractional_timestamp_entry_does_not_wipe_list() {
    let store = MemoryStore::new();
    let mut stored = nine_valid_entries();
    stored.push(serde_json::json!({"type": "search", "value": "odd", "ts": 1.5}));
    store.set(HISTORY_KEY, &serde_json::to_string(&stored).unwrap()).unwrap();

    assert_eq!(history::load(&store).len(), 10);
    history::record(&store, RecentKind::Search, "new", 200, 10).unwrap();

    let values: Vec<String> = history::load(&store).into_iter().map(|e| e.value).collect();
    assert_eq!(values.len(), 10);
    assert_eq!(values[0], "new");
    assert_eq!(values[1], "film 8");
    assert_eq!(values[9], "film 0");
}

#[test]
fn test_unknown_kind_entry_dropped_alone() {
    let store = MemoryStore::new();
    let mut stored = nine_valid_entries();
    stored.insert(4, serde_json::json!({"type": "movie", "value": "odd", "ts": 5}));
    store.set(HISTORY_KEY, &serde_json::to_string(&stored).unwrap()).unwrap();

    history::record(&store, RecentKind::Similar, "new", 200, 10).unwrap();
    let entries = history::load(&store);
    assert_eq!(entries.len(), 10);
    assert!(entries.iter().all(|e| e.value != "odd"));
    assert_eq!(entries[0].kind, RecentKind::Similar);
}

proptest! {
    #[test]
    fn prop_list_holds_newest_first_up_to_cap(
        submissions in prop::collection::vec(("[a-z]{1,8}", kind_strategy()), 0..40),
    ) {
        let store = MemoryStore::new();
        for (i, (value, kind)) in submissions.iter().enumerate() {
            prop_assert!(history::record(&store, *kind, value, i as u64, 10).unwrap());
        }

        let entries = history::load(&store);
        prop_assert_eq!(entries.len(), submissions.len().min(10));

        let expected: Vec<(String, RecentKind)> =
            submissions.iter().rev().take(10).cloned().collect();
        let got: Vec<(String, RecentKind)> =
            entries.iter().map(|e| (e.value.clone(), e.kind)).collect();
        prop_assert_eq!(got, expected);

        prop_assert!(entries.windows(2).all(|w| w[0].timestamp > w[1].timestamp));
    }
}

// ---------------------------------------------------------------------------
// FileStore persistence
// ---------------------------------------------------------------------------

#[test]
fn test_history_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.json");
    {
        let store = FileStore::new(&path);
        history::record(&store, RecentKind::Similar, "Alien", 7, 10).unwrap();
    }
    let reopened = FileStore::new(&path);
    let snap = RecentList::snapshot(&reopened);
    assert_eq!(snap.entries().len(), 1);
    assert_eq!(snap.entries()[0].timestamp, 7);
    assert_eq!(snap.entries()[0].to_string(), "similar Alien");
}

#[test]
fn test_history_and_theme_coexist_in_one_file() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path().join("state.json"));
    store.set("theme", "light").unwrap();
    history::record(&store, RecentKind::Search, "up", 1, 10).unwrap();
    assert_eq!(store.get("theme").as_deref(), Some("light"));
    assert_eq!(history::load(&store).len(), 1);
}
