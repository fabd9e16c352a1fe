//! The page contract (element IDs and classes) and the search box composite
//! that ties one input to its dropdown, keyboard shortcuts and history.

use std::rc::Rc;

use tracing::debug;

use crate::autocomplete::Autocomplete;
use crate::config::WidgetConfig;
use crate::history::{self, RecentKind};
use crate::keys::{Key, KeyAction, KeyBinder};
use crate::scheduler::Scheduler;
use crate::store::KeyValueStore;
use crate::suggest::SuggestionSource;

/// Element IDs rendered by the server templates.
pub mod ids {
    pub const THEME_TOGGLE: &str = "theme-toggle";
    pub const SEARCH_INPUT: &str = "q";
    pub const SEARCH_PANEL: &str = "ac";
    pub const SEARCH_FORM: &str = "search-form";
    pub const SIMILAR_INPUT: &str = "title";
    pub const SIMILAR_PANEL: &str = "ac-title";
    pub const SIMILAR_FORM: &str = "similar-form";
    pub const RECENT_LIST: &str = "recent-list";
    pub const COPY_LINK: &str = "copy-link";
    pub const CAROUSEL_TRACK: &str = "t-items";
}

/// Class names and attributes the widgets read or write.
pub mod classes {
    pub const SUGGESTION_ROW: &str = "ac-item";
    pub const RECENT_ROW: &str = "list-item";
    pub const MUTED: &str = "muted";
    pub const CAROUSEL_DOT: &str = "t-dot";
    pub const ACTIVE: &str = "active";
    pub const DOT_INDEX_ATTR: &str = "data-i";
    pub const THEME_ATTR: &str = "data-theme";
}

/// Which input, panel and form make up one search box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBinding {
    pub input_id: &'static str,
    pub panel_id: &'static str,
    pub form_id: &'static str,
    pub kind: RecentKind,
}

pub const SEARCH_BINDINGS: [SearchBinding; 2] = [
    SearchBinding {
        input_id: ids::SEARCH_INPUT,
        panel_id: ids::SEARCH_PANEL,
        form_id: ids::SEARCH_FORM,
        kind: RecentKind::Search,
    },
    SearchBinding {
        input_id: ids::SIMILAR_INPUT,
        panel_id: ids::SIMILAR_PANEL,
        form_id: ids::SIMILAR_FORM,
        kind: RecentKind::Similar,
    },
];

/// One search input with its suggestion dropdown, key bindings and history hook.
#[derive(Clone)]
pub struct SearchBox {
    kind: RecentKind,
    autocomplete: Autocomplete,
    keys: KeyBinder,
    store: Rc<dyn KeyValueStore>,
    history_cap: usize,
}

impl SearchBox {
    pub fn new(
        kind: RecentKind,
        source: Rc<dyn SuggestionSource>,
        scheduler: Rc<dyn Scheduler>,
        store: Rc<dyn KeyValueStore>,
        config: &WidgetConfig,
    ) -> Self {
        let autocomplete = Autocomplete::new(source, scheduler, config.debounce());
        Self {
            kind,
            keys: KeyBinder::new(autocomplete.clone()),
            autocomplete,
            store,
            history_cap: config.history_cap,
        }
    }

    pub fn kind(&self) -> RecentKind {
        self.kind
    }

    pub fn autocomplete(&self) -> &Autocomplete {
        &self.autocomplete
    }

    pub fn on_key(&self, key: &Key) -> KeyAction {
        self.keys.on_key(key)
    }

    /// Form submission with the input's current value. Storage failures are
    /// logged and otherwise ignored; the submission itself proceeds.
    pub fn on_submit(&self, value: &str, now_ms: u64) -> bool {
        match history::record(self.store.as_ref(), self.kind, value, now_ms, self.history_cap) {
            Ok(recorded) => recorded,
            Err(e) => {
                debug!(kind = %self.kind, error = %e, "could not record recent entry");
                false
            }
        }
    }
}
