//! Dark/light theme preference.
//!
//! The active theme lives in two places: the document-level `data-theme`
//! attribute (behind [`ThemeSurface`]) and the `theme` store key. Toggling
//! updates both.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use tracing::debug;

use crate::error::Result;
use crate::store::KeyValueStore;

pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(format!("unknown theme: {other}")),
        }
    }
}

/// Where the applied theme is reflected (the `<html data-theme>` attribute in a page).
pub trait ThemeSurface {
    fn apply(&self, theme: Theme);

    /// Theme the surface shows right now, when it can be read back
    /// (e.g. a server-rendered `data-theme`). `None` means unknown.
    fn current(&self) -> Option<Theme> {
        None
    }
}

/// Saved preference, if any. Unrecognized values count as unset.
pub fn saved_theme(store: &dyn KeyValueStore) -> Option<Theme> {
    let raw = store.get(THEME_KEY)?;
    match raw.parse() {
        Ok(t) => Some(t),
        Err(e) => {
            debug!(error = %e, "ignoring stored theme");
            None
        }
    }
}

/// The toggle button's controller.
pub struct ThemeToggle {
    store: Rc<dyn KeyValueStore>,
    surface: Rc<dyn ThemeSurface>,
    current: Cell<Theme>,
    applied: Cell<Option<Theme>>,
}

impl ThemeToggle {
    /// Read the saved preference and apply it. With nothing saved the surface
    /// is left untouched and the state reads as [`Theme::Dark`].
    pub fn init(store: Rc<dyn KeyValueStore>, surface: Rc<dyn ThemeSurface>) -> Self {
        let saved = saved_theme(store.as_ref());
        let toggle = Self {
            store,
            surface,
            current: Cell::new(saved.unwrap_or_default()),
            applied: Cell::new(None),
        };
        if let Some(theme) = saved {
            toggle.apply(theme);
        }
        toggle
    }

    /// What the surface shows if it can tell, else the last applied or saved value.
    pub fn current(&self) -> Theme {
        self.surface.current().unwrap_or_else(|| self.current.get())
    }

    /// Reflect `theme` on the surface; repeating the shown value is a no-op.
    fn apply(&self, theme: Theme) {
        self.current.set(theme);
        let shown = self.surface.current().or(self.applied.get());
        if shown != Some(theme) {
            self.surface.apply(theme);
            self.applied.set(Some(theme));
        }
    }

    /// Flip, apply and persist. Returns the new theme.
    pub fn toggle(&self) -> Result<Theme> {
        let next = self.current().toggled();
        self.apply(next);
        self.store.set(THEME_KEY, next.as_str())?;
        debug!(theme = %next, "theme toggled");
        Ok(next)
    }
}
