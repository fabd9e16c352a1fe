//! Crate-level error type.
//!
//! Most widget paths swallow these on purpose (the page stays as it was), so the
//! variants mainly exist for library callers and the CLI.

use thiserror::Error;

/// Errors raised by stores, the suggestion client, the clipboard and config loading.
#[derive(Debug, Error)]
pub enum WidgetError {
    /// The suggestion endpoint replied with a non-2xx status code.
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    /// The request never got a response.
    #[error("connection failed to {url}: {detail}")]
    Connect { url: String, detail: String },

    /// A response body or stored value was not the expected JSON shape.
    #[error("could not decode {what}: {detail}")]
    Decode { what: String, detail: String },

    /// The backing key-value store refused a read or write.
    #[error("storage error: {0}")]
    Storage(String),

    /// The clipboard write was rejected.
    #[error("clipboard write failed: {0}")]
    Clipboard(String),

    /// The config file could not be parsed.
    #[error("invalid config: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl WidgetError {
    pub fn decode(what: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        WidgetError::Decode {
            what: what.into(),
            detail: detail.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WidgetError>;
