//! Keyboard shortcuts on a search input.

use crate::autocomplete::Autocomplete;

/// Keys the binder cares about, from a DOM `KeyboardEvent.key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Enter,
    ArrowDown,
    Other(String),
}

impl Key {
    pub fn from_dom(key: &str) -> Self {
        match key {
            "Enter" => Key::Enter,
            "ArrowDown" => Key::ArrowDown,
            other => Key::Other(other.to_string()),
        }
    }
}

/// What the page binding should do in response to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Submit the owning form programmatically.
    Submit,
    /// Move focus to the first suggestion row.
    FocusFirstSuggestion,
    None,
}

/// Maps keydown events on an input to actions, consulting its suggestion panel.
#[derive(Clone)]
pub struct KeyBinder {
    autocomplete: Autocomplete,
}

impl KeyBinder {
    pub fn new(autocomplete: Autocomplete) -> Self {
        Self { autocomplete }
    }

    pub fn on_key(&self, key: &Key) -> KeyAction {
        match key {
            Key::Enter => KeyAction::Submit,
            Key::ArrowDown if self.autocomplete.has_rows() => KeyAction::FocusFirstSuggestion,
            _ => KeyAction::None,
        }
    }
}
