//! Debounced suggestion dropdown bound to one text input.
//!
//! ## Cycle
//! 1. `on_input` cancels the pending debounce timer.
//! 2. Blank input clears and hides the panel right away, no request.
//! 3. Otherwise a one-shot timer is armed; when it fires the trimmed value is
//!    sent to the [`SuggestionSource`].
//! 4. A successful response replaces the rows; the panel is visible iff there is
//!    at least one row. Failures leave the panel exactly as it was.
//!
//! Every input event bumps a generation counter and each request remembers the
//! generation it was armed under, so a slow response never overwrites the
//! panel for a newer value.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

use futures_util::FutureExt;
use tracing::debug;

use crate::scheduler::{Scheduler, TimerSlot};
use crate::suggest::SuggestionSource;

/// What the dropdown shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelState {
    pub rows: Vec<String>,
    pub visible: bool,
}

/// Where a document-level click landed relative to this widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    Input,
    Panel,
    Outside,
}

type PanelListener = Rc<dyn Fn(&PanelState)>;

struct State {
    input: String,
    panel: PanelState,
    generation: u64,
}

struct Shared {
    state: RefCell<State>,
    listeners: RefCell<Vec<PanelListener>>,
    timer: TimerSlot,
    debounce_pending: Cell<bool>,
    in_flight: Cell<usize>,
    debounce: Duration,
    scheduler: Rc<dyn Scheduler>,
    source: Rc<dyn SuggestionSource>,
}

/// Handle to one autocomplete widget. Clones refer to the same widget.
#[derive(Clone)]
pub struct Autocomplete {
    shared: Rc<Shared>,
}

impl Autocomplete {
    pub fn new(
        source: Rc<dyn SuggestionSource>,
        scheduler: Rc<dyn Scheduler>,
        debounce: Duration,
    ) -> Self {
        Self {
            shared: Rc::new(Shared {
                state: RefCell::new(State {
                    input: String::new(),
                    panel: PanelState::default(),
                    generation: 0,
                }),
                listeners: RefCell::new(Vec::new()),
                timer: TimerSlot::new(),
                debounce_pending: Cell::new(false),
                in_flight: Cell::new(0),
                debounce,
                scheduler,
                source,
            }),
        }
    }

    /// Called after every panel change, e.g. to re-render the DOM.
    pub fn subscribe(&self, listener: impl Fn(&PanelState) + 'static) {
        self.shared.listeners.borrow_mut().push(Rc::new(listener));
    }

    pub fn panel(&self) -> PanelState {
        self.shared.state.borrow().panel.clone()
    }

    pub fn input_value(&self) -> String {
        self.shared.state.borrow().input.clone()
    }

    pub fn has_rows(&self) -> bool {
        !self.shared.state.borrow().panel.rows.is_empty()
    }

    /// No debounce timer armed and no request awaiting its response.
    pub fn is_settled(&self) -> bool {
        !self.shared.debounce_pending.get() && self.shared.in_flight.get() == 0
    }

    /// Input-change event with the field's full current value.
    pub fn on_input(&self, value: &str) {
        let generation = {
            let mut st = self.shared.state.borrow_mut();
            st.input = value.to_string();
            st.generation += 1;
            st.generation
        };
        let scheduler = Rc::clone(&self.shared.scheduler);
        self.shared.timer.clear(scheduler.as_ref());
        self.shared.debounce_pending.set(false);

        let prefix = value.trim().to_string();
        if prefix.is_empty() {
            self.shared.set_panel(PanelState::default());
            return;
        }

        let weak = Rc::downgrade(&self.shared);
        self.shared.debounce_pending.set(true);
        self.shared.timer.arm_after(
            scheduler.as_ref(),
            self.shared.debounce,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.debounce_pending.set(false);
                    Shared::request(&shared, prefix, generation);
                }
            }),
        );
    }

    /// Click on row `index`: copy its text into the input and hide the panel.
    /// Returns the chosen text, or `None` for an index past the last row.
    pub fn select(&self, index: usize) -> Option<String> {
        let chosen = {
            let mut st = self.shared.state.borrow_mut();
            let chosen = st.panel.rows.get(index)?.clone();
            st.input = chosen.clone();
            // A request still in flight belongs to the text before the pick.
            st.generation += 1;
            chosen
        };
        self.shared.timer.clear(self.shared.scheduler.as_ref());
        self.shared.debounce_pending.set(false);
        self.shared.hide();
        Some(chosen)
    }

    /// Document-wide click: anything outside the input/panel pair dismisses.
    pub fn on_document_click(&self, target: ClickTarget) {
        if target == ClickTarget::Outside {
            self.shared.hide();
        }
    }
}

impl Shared {
    fn request(shared: &Rc<Shared>, prefix: String, generation: u64) {
        debug!(%prefix, generation, "requesting suggestions");
        let pending = shared.source.fetch(&prefix);
        shared.in_flight.set(shared.in_flight.get() + 1);
        let weak: Weak<Shared> = Rc::downgrade(shared);
        shared.scheduler.spawn(
            async move {
                let result = pending.await;
                let Some(shared) = weak.upgrade() else {
                    return;
                };
                shared.in_flight.set(shared.in_flight.get().saturating_sub(1));
                match result {
                    Ok(rows) => shared.apply(generation, rows),
                    Err(e) => debug!(%prefix, error = %e, "suggestion fetch failed; keeping panel"),
                }
            }
            .boxed_local(),
        );
    }

    fn apply(&self, generation: u64, rows: Vec<String>) {
        if self.state.borrow().generation != generation {
            debug!(generation, "discarding stale suggestions");
            return;
        }
        let visible = !rows.is_empty();
        self.set_panel(PanelState { rows, visible });
    }

    fn hide(&self) {
        let changed = {
            let mut st = self.state.borrow_mut();
            std::mem::replace(&mut st.panel.visible, false)
        };
        if changed {
            self.notify();
        }
    }

    fn set_panel(&self, panel: PanelState) {
        self.state.borrow_mut().panel = panel;
        self.notify();
    }

    fn notify(&self) {
        let panel = self.state.borrow().panel.clone();
        let listeners: Vec<PanelListener> = self.listeners.borrow().clone();
        for listener in listeners {
            listener(&panel);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::scheduler::ManualScheduler;
    use futures_util::future::LocalBoxFuture;

    struct Echo;

    impl SuggestionSource for Echo {
        fn fetch(&self, prefix: &str) -> LocalBoxFuture<'static, Result<Vec<String>>> {
            let rows = vec![format!("{prefix}1"), format!("{prefix}2")];
            async move { Ok(rows) }.boxed_local()
        }
    }

    fn widget() -> (Autocomplete, ManualScheduler) {
        let s = ManualScheduler::new();
        let ac = Autocomplete::new(Rc::new(Echo), Rc::new(s.clone()), Duration::from_millis(150));
        (ac, s)
    }

    #[test]
    fn test_nothing_happens_before_debounce() {
        let (ac, s) = widget();
        ac.on_input("up");
        s.advance(Duration::from_millis(149));
        assert_eq!(ac.panel(), PanelState::default());
        s.advance(Duration::from_millis(1));
        assert_eq!(ac.panel().rows, vec!["up1", "up2"]);
        assert!(ac.panel().visible);
    }

    #[test]
    fn test_request_uses_trimmed_value() {
        let (ac, s) = widget();
        ac.on_input("  up ");
        s.advance(Duration::from_millis(150));
        assert_eq!(ac.panel().rows[0], "up1");
        assert_eq!(ac.input_value(), "  up ");
    }

    #[test]
    fn test_select_out_of_range_is_none() {
        let (ac, s) = widget();
        ac.on_input("a");
        s.advance(Duration::from_millis(150));
        assert_eq!(ac.select(5), None);
        assert!(ac.panel().visible);
    }

    #[test]
    fn test_click_on_input_or_panel_keeps_open() {
        let (ac, s) = widget();
        ac.on_input("a");
        s.advance(Duration::from_millis(150));
        ac.on_document_click(ClickTarget::Input);
        ac.on_document_click(ClickTarget::Panel);
        assert!(ac.panel().visible);
        ac.on_document_click(ClickTarget::Outside);
        assert!(!ac.panel().visible);
        assert_eq!(ac.panel().rows.len(), 2);
    }

    #[test]
    fn test_settled_after_response() {
        let (ac, s) = widget();
        assert!(ac.is_settled());
        ac.on_input("a");
        assert!(!ac.is_settled());
        s.advance(Duration::from_millis(150));
        assert!(ac.is_settled());
        ac.on_input("ab");
        ac.on_input("");
        assert!(ac.is_settled());
    }

    #[test]
    fn test_listener_sees_every_change() {
        let (ac, s) = widget();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        ac.subscribe(move |p| sink.borrow_mut().push(p.visible));
        ac.on_input("a");
        s.advance(Duration::from_millis(150));
        ac.on_document_click(ClickTarget::Outside);
        ac.on_document_click(ClickTarget::Outside);
        assert_eq!(*seen.borrow(), vec![true, false]);
    }
}
