//! Widget tuning knobs, loadable from a TOML file.
//!
//! Every field has a default, so an empty file (or no file) yields the values the
//! pages have always used.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WidgetError};
use crate::history::DEFAULT_HISTORY_CAP;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_STORE_PATH: &str = "reel-widgets.json";

/// Configuration shared by every widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    /// Origin hosting `/api/autocomplete`.
    pub base_url: String,
    /// Quiet period before a suggestion request is sent.
    pub debounce_ms: u64,
    /// Maximum number of recent entries kept in the store.
    pub history_cap: usize,
    pub carousel_interval_ms: u64,
    /// How long the copy button shows its acknowledgement label.
    pub copy_ack_ms: u64,
    /// Horizontal gap between carousel slides.
    pub slide_gap_px: f64,
    /// Step used when the track has no first slide to measure.
    pub fallback_step_px: f64,
    pub request_timeout_ms: u64,
    /// File backing the CLI's key-value store.
    pub store_path: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            debounce_ms: 150,
            history_cap: DEFAULT_HISTORY_CAP,
            carousel_interval_ms: 4_000,
            copy_ack_ms: 1_500,
            slide_gap_px: 16.0,
            fallback_step_px: 316.0,
            request_timeout_ms: 5_000,
            store_path: DEFAULT_STORE_PATH.to_string(),
        }
    }
}

impl WidgetConfig {
    /// Parse a TOML document; absent keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| WidgetError::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn carousel_interval(&self) -> Duration {
        Duration::from_millis(self.carousel_interval_ms)
    }

    pub fn copy_ack(&self) -> Duration {
        Duration::from_millis(self.copy_ack_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
