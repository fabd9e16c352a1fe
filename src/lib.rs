//! Presentation widgets for the movie recommender pages.
//!
//! Each widget is a small single-threaded state machine driven by handler
//! calls (`on_input`, `on_click`, `on_submit`, ...) and parameterized over
//! injected capabilities: a [`store::KeyValueStore`], a [`scheduler::Scheduler`],
//! a [`suggest::SuggestionSource`] and a [`clipboard::Clipboard`]. The `wasm`
//! feature binds them to the real page DOM; the CLI and tests drive them natively.

pub mod autocomplete;
pub mod carousel;
pub mod cli;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod history;
pub mod keys;
pub mod page;
pub mod scheduler;
pub mod store;
pub mod suggest;
pub mod theme;

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub mod browser;

pub use autocomplete::{Autocomplete, ClickTarget, PanelState};
pub use carousel::{Carousel, CarouselSurface};
pub use clipboard::{Clipboard, CopyLinkButton};
pub use config::WidgetConfig;
pub use error::{Result, WidgetError};
pub use history::{RecentEntry, RecentKind, RecentList};
pub use keys::{Key, KeyAction, KeyBinder};
pub use page::SearchBox;
pub use scheduler::{ManualScheduler, Scheduler, TimerId, TimerSlot};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use suggest::{HttpSuggestionSource, SuggestionSource};
pub use theme::{Theme, ThemeSurface, ThemeToggle};

#[cfg(not(target_arch = "wasm32"))]
pub use scheduler::TokioScheduler;

/// Current Unix epoch in milliseconds.
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Current Unix epoch in milliseconds.
#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub fn now_ms() -> u64 {
    js_sys::Date::now() as u64
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn test_now_ms_is_reasonable() {
        // After 2023-11-01
        assert!(now_ms() > 1_700_000_000_000);
    }
}
