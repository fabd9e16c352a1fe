//! Recent searches, kept most-recent-first under the `recent` key.
//!
//! The list is capped; adding past the cap evicts the oldest entries. Missing or
//! corrupt stored data reads as an empty list.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::store::{load_json, save_json, KeyValueStore};

pub const HISTORY_KEY: &str = "recent";
pub const DEFAULT_HISTORY_CAP: usize = 10;

/// Which form produced an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RecentKind {
    Search,
    Similar,
}

impl fmt::Display for RecentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecentKind::Search => write!(f, "search"),
            RecentKind::Similar => write!(f, "similar"),
        }
    }
}

impl FromStr for RecentKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "search" => Ok(RecentKind::Search),
            "similar" => Ok(RecentKind::Similar),
            other => Err(format!("unknown history kind: {other}")),
        }
    }
}

/// One submitted query. Serialized with the `type` / `ts` keys pages already
/// store; `kind` / `timestamp` are accepted when reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentEntry {
    #[serde(rename = "type", alias = "kind")]
    pub kind: RecentKind,
    pub value: String,
    /// Milliseconds since the Unix epoch.
    #[serde(rename = "ts", alias = "timestamp", deserialize_with = "lenient_millis")]
    pub timestamp: u64,
}

impl fmt::Display for RecentEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.value)
    }
}

/// Stored entries, most recent first. Never fails.
///
/// Entries are decoded one at a time: an entry with an unexpected shape is
/// dropped on its own and the rest of the list survives.
pub fn load(store: &dyn KeyValueStore) -> Vec<RecentEntry> {
    let raw: Vec<serde_json::Value> = load_json(store, HISTORY_KEY).unwrap_or_default();
    raw.into_iter()
        .filter_map(|value| match serde_json::from_value::<RecentEntry>(value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(error = %e, "dropping unreadable recent entry");
                None
            }
        })
        .collect()
}

/// Accepts integral or fractional millisecond stamps; fractions are truncated.
fn lenient_millis<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let ms = f64::deserialize(deserializer)?;
    if ms.is_finite() && ms >= 0.0 {
        Ok(ms as u64)
    } else {
        Err(serde::de::Error::custom(format!("invalid timestamp: {ms}")))
    }
}

/// Prepend an entry and keep the newest `cap`. Blank values are ignored and
/// report `Ok(false)`.
pub fn record(
    store: &dyn KeyValueStore,
    kind: RecentKind,
    value: &str,
    now_ms: u64,
    cap: usize,
) -> Result<bool> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(false);
    }
    let mut entries = load(store);
    entries.insert(
        0,
        RecentEntry {
            kind,
            value: value.to_string(),
            timestamp: now_ms,
        },
    );
    entries.truncate(cap);
    debug!(%kind, value, len = entries.len(), "recorded recent entry");
    save_json(store, HISTORY_KEY, &entries)?;
    Ok(true)
}

/// Read-only view taken once at page load. Later writes in the same page
/// lifetime are not reflected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecentList {
    entries: Vec<RecentEntry>,
}

impl RecentList {
    pub fn snapshot(store: &dyn KeyValueStore) -> Self {
        Self {
            entries: load(store),
        }
    }

    pub fn entries(&self) -> &[RecentEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One `kind value` line per entry.
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }
}
