//! Tests for the suggestion dropdown: debounce, rendering, selection, dismissal,
//! failure handling, stale responses, and the search box composite.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use futures_util::future::LocalBoxFuture;
use futures_util::FutureExt;
use tokio::sync::oneshot;
use tokio_test::{assert_pending, assert_ready};

use reel_widgets::history::{self, RecentKind};
use reel_widgets::suggest::autocomplete_path;
use reel_widgets::*;

const DEBOUNCE: Duration = Duration::from_millis(150);

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// Answers from a fixed table and records every requested path.
#[derive(Default)]
struct TableSource {
    table: HashMap<String, Vec<String>>,
    requests: RefCell<Vec<String>>,
}

impl TableSource {
    fn with(entries: &[(&str, &[&str])]) -> Rc<Self> {
        let table = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
            .collect();
        Rc::new(Self {
            table,
            requests: RefCell::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl SuggestionSource for TableSource {
    fn fetch(&self, prefix: &str) -> LocalBoxFuture<'static, Result<Vec<String>>> {
        self.requests.borrow_mut().push(autocomplete_path(prefix));
        let rows = self.table.get(prefix).cloned().unwrap_or_default();
        async move { Ok(rows) }.boxed_local()
    }
}

/// Every request fails after succeeding `ok_first` times.
struct FlakySource {
    ok_first: RefCell<usize>,
}

impl SuggestionSource for FlakySource {
    fn fetch(&self, prefix: &str) -> LocalBoxFuture<'static, Result<Vec<String>>> {
        let mut left = self.ok_first.borrow_mut();
        let result = if *left > 0 {
            *left -= 1;
            Ok(vec![format!("{prefix} (1999)")])
        } else {
            Err(WidgetError::decode("autocomplete response", "expected value at line 1"))
        };
        async move { result }.boxed_local()
    }
}

/// Each request waits until the test answers it.
#[derive(Default)]
struct DeferredSource {
    pending: RefCell<Vec<(String, oneshot::Sender<Result<Vec<String>>>)>>,
}

impl DeferredSource {
    fn answer(&self, prefix: &str, rows: &[&str]) {
        let mut pending = self.pending.borrow_mut();
        let pos = pending.iter().position(|(p, _)| p == prefix).unwrap();
        let (_, tx) = pending.remove(pos);
        let _ = tx.send(Ok(rows.iter().map(|s| s.to_string()).collect()));
    }
}

impl SuggestionSource for DeferredSource {
    fn fetch(&self, prefix: &str) -> LocalBoxFuture<'static, Result<Vec<String>>> {
        let (tx, rx) = oneshot::channel();
        self.pending.borrow_mut().push((prefix.to_string(), tx));
        async move {
            rx.await
                .unwrap_or_else(|_| Err(WidgetError::Storage("request dropped".into())))
        }
        .boxed_local()
    }
}

fn widget(source: Rc<dyn SuggestionSource>) -> (Autocomplete, ManualScheduler) {
    let s = ManualScheduler::new();
    let ac = Autocomplete::new(source, Rc::new(s.clone()), DEBOUNCE);
    (ac, s)
}

// ---------------------------------------------------------------------------
// Fetch and render
// ---------------------------------------------------------------------------

#[test]
fn test_dog_example_end_to_end() {
    let source = TableSource::with(&[("dog", &["dogma", "dogs"])]);
    let (ac, s) = widget(source.clone());

    ac.on_input("dog");
    s.advance(DEBOUNCE);

    assert_eq!(source.requests(), vec!["/api/autocomplete?prefix=dog"]);
    assert_eq!(
        ac.panel(),
        PanelState {
            rows: vec!["dogma".into(), "dogs".into()],
            visible: true
        }
    );

    assert_eq!(ac.select(1).as_deref(), Some("dogs"));
    assert_eq!(ac.input_value(), "dogs");
    assert!(!ac.panel().visible);
}

#[test]
fn test_rows_keep_response_order() {
    let rows = ["Up", "Upgrade", "Upside Down", "Uptown Girls"];
    let source = TableSource::with(&[("up", &rows)]);
    let (ac, s) = widget(source);
    ac.on_input("up");
    s.advance(DEBOUNCE);
    assert_eq!(ac.panel().rows, rows);
    assert!(ac.panel().visible);
}

#[test]
fn test_zero_results_hides_panel() {
    let source = TableSource::with(&[("dog", &["dogma"])]);
    let (ac, s) = widget(source);
    ac.on_input("dog");
    s.advance(DEBOUNCE);
    assert!(ac.panel().visible);

    ac.on_input("dogzz");
    s.advance(DEBOUNCE);
    assert_eq!(ac.panel(), PanelState::default());
}

#[test]
fn test_query_is_url_encoded() {
    let source = TableSource::with(&[]);
    let (ac, s) = widget(source.clone());
    ac.on_input("  amélie & co ");
    s.advance(DEBOUNCE);
    assert_eq!(
        source.requests(),
        vec!["/api/autocomplete?prefix=am%C3%A9lie%20%26%20co"]
    );
}

// ---------------------------------------------------------------------------
// Debounce
// ---------------------------------------------------------------------------

#[test]
fn test_rapid_keystrokes_send_one_request() {
    let source = TableSource::with(&[("heat", &["Heat"])]);
    let (ac, s) = widget(source.clone());
    for prefix in ["h", "he", "hea", "heat"] {
        ac.on_input(prefix);
        s.advance(Duration::from_millis(100));
    }
    assert!(source.requests().is_empty());
    s.advance(Duration::from_millis(50));
    assert_eq!(source.requests(), vec!["/api/autocomplete?prefix=heat"]);
    assert_eq!(ac.panel().rows, vec!["Heat"]);
}

#[test]
fn test_blank_input_clears_without_request() {
    let source = TableSource::with(&[("dog", &["dogma", "dogs"])]);
    let (ac, s) = widget(source.clone());
    ac.on_input("dog");
    s.advance(DEBOUNCE);
    assert!(ac.panel().visible);

    for blank in ["", "   ", "\t\n"] {
        ac.on_input(blank);
        assert_eq!(ac.panel(), PanelState::default());
    }
    s.advance(Duration::from_secs(1));
    assert_eq!(source.requests().len(), 1);
}

#[test]
fn test_blank_input_cancels_pending_request() {
    let source = TableSource::with(&[("dog", &["dogma"])]);
    let (ac, s) = widget(source.clone());
    ac.on_input("dog");
    s.advance(Duration::from_millis(100));
    ac.on_input("");
    s.advance(Duration::from_secs(1));
    assert!(source.requests().is_empty());
    assert_eq!(s.pending_timers(), 0);
}

// ---------------------------------------------------------------------------
// Failures and ordering
// ---------------------------------------------------------------------------

#[test]
fn test_failure_keeps_previous_panel() {
    let (ac, s) = widget(Rc::new(FlakySource {
        ok_first: RefCell::new(1),
    }));
    ac.on_input("alien");
    s.advance(DEBOUNCE);
    let before = ac.panel();
    assert_eq!(before.rows, vec!["alien (1999)"]);

    ac.on_input("aliens");
    s.advance(DEBOUNCE);
    assert_eq!(ac.panel(), before);
}

#[test]
fn test_deferred_source_waits_for_answer() {
    let source = DeferredSource::default();
    let mut fetch = tokio_test::task::spawn(source.fetch("ma"));
    assert_pending!(fetch.poll());

    source.answer("ma", &["Mad Max"]);
    assert!(fetch.is_woken());
    let rows = assert_ready!(fetch.poll()).unwrap();
    assert_eq!(rows, vec!["Mad Max"]);
}

#[test]
fn test_settled_only_once_request_returns() {
    let source = Rc::new(DeferredSource::default());
    let (ac, s) = widget(source.clone());
    ac.on_input("ma");
    assert!(!ac.is_settled());

    s.advance(DEBOUNCE);
    assert!(!ac.is_settled());

    source.answer("ma", &["Mad Max"]);
    s.run_until_stalled();
    assert!(ac.is_settled());
}

#[test]
fn test_stale_response_is_discarded() {
    let source = Rc::new(DeferredSource::default());
    let (ac, s) = widget(source.clone());

    ac.on_input("ma");
    s.advance(DEBOUNCE);
    ac.on_input("mat");
    s.advance(DEBOUNCE);

    source.answer("mat", &["Matrix"]);
    s.run_until_stalled();
    assert_eq!(ac.panel().rows, vec!["Matrix"]);

    source.answer("ma", &["Mad Max", "Magnolia"]);
    s.run_until_stalled();
    assert_eq!(ac.panel().rows, vec!["Matrix"]);
    assert_eq!(s.pending_tasks(), 0);
}

#[test]
fn test_late_response_cannot_reopen_cleared_panel() {
    let source = Rc::new(DeferredSource::default());
    let (ac, s) = widget(source.clone());
    ac.on_input("ma");
    s.advance(DEBOUNCE);
    ac.on_input(" ");
    source.answer("ma", &["Mad Max"]);
    s.run_until_stalled();
    assert_eq!(ac.panel(), PanelState::default());
}

#[test]
fn test_in_flight_response_ignored_after_select() {
    let source = Rc::new(DeferredSource::default());
    let (ac, s) = widget(source.clone());
    ac.on_input("ma");
    s.advance(DEBOUNCE);
    source.answer("ma", &["Mad Max", "Magnolia"]);
    s.run_until_stalled();

    ac.on_input("mag");
    s.advance(DEBOUNCE);
    ac.select(1);
    source.answer("mag", &["Magnolia", "Magic Mike"]);
    s.run_until_stalled();
    assert_eq!(ac.input_value(), "Magnolia");
    assert!(!ac.panel().visible);
}

// ---------------------------------------------------------------------------
// Dismissal and keys
// ---------------------------------------------------------------------------

#[test]
fn test_outside_click_hides_but_keeps_rows() {
    let source = TableSource::with(&[("dog", &["dogma", "dogs"])]);
    let (ac, s) = widget(source);
    ac.on_input("dog");
    s.advance(DEBOUNCE);
    ac.on_document_click(ClickTarget::Outside);
    assert!(!ac.panel().visible);
    assert_eq!(ac.panel().rows.len(), 2);
}

#[test]
fn test_arrow_down_needs_rows() {
    let source = TableSource::with(&[("dog", &["dogma"])]);
    let (ac, s) = widget(source);
    let keys = KeyBinder::new(ac.clone());

    assert_eq!(keys.on_key(&Key::ArrowDown), KeyAction::None);
    ac.on_input("dog");
    s.advance(DEBOUNCE);
    assert_eq!(keys.on_key(&Key::ArrowDown), KeyAction::FocusFirstSuggestion);
    assert_eq!(keys.on_key(&Key::Enter), KeyAction::Submit);
    assert_eq!(keys.on_key(&Key::from_dom("Escape")), KeyAction::None);
}

// ---------------------------------------------------------------------------
// SearchBox
// ---------------------------------------------------------------------------

#[test]
fn test_search_box_submit_records_history() {
    let store = MemoryStore::new();
    let s = ManualScheduler::new();
    let config = WidgetConfig::default();
    let similar = SearchBox::new(
        RecentKind::Similar,
        TableSource::with(&[]),
        Rc::new(s.clone()),
        Rc::new(store.clone()),
        &config,
    );

    assert!(similar.on_submit(" Heat ", 10));
    assert!(!similar.on_submit("  ", 11));
    let entries = history::load(&store);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, RecentKind::Similar);
    assert_eq!(entries[0].value, "Heat");
    assert_eq!(entries[0].timestamp, 10);
}

#[test]
fn test_search_box_enter_and_arrow() {
    let s = ManualScheduler::new();
    let search = SearchBox::new(
        RecentKind::Search,
        TableSource::with(&[("up", &["Up"])]),
        Rc::new(s.clone()),
        Rc::new(MemoryStore::new()),
        &WidgetConfig::default(),
    );
    assert_eq!(search.on_key(&Key::Enter), KeyAction::Submit);
    search.autocomplete().on_input("up");
    s.advance(DEBOUNCE);
    assert_eq!(search.on_key(&Key::ArrowDown), KeyAction::FocusFirstSuggestion);
}
