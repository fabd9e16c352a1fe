//! Client side of the `/api/autocomplete` collaborator.
//!
//! The endpoint takes `?prefix=<urlencoded>` and answers
//! `{"results": ["Title", ...]}`. Ranking and matching live on the server.

use std::time::Duration;

use futures_util::future::LocalBoxFuture;
use futures_util::FutureExt;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WidgetError};

pub const AUTOCOMPLETE_PATH: &str = "/api/autocomplete";

/// Anything that can turn a prefix into suggestion strings.
pub trait SuggestionSource {
    fn fetch(&self, prefix: &str) -> LocalBoxFuture<'static, Result<Vec<String>>>;
}

/// Wire shape of the endpoint's response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutocompleteResponse {
    pub results: Vec<String>,
}

/// Percent-encode `s` the way `encodeURIComponent` does: everything except
/// `A-Z a-z 0-9 - _ . ! ~ * ' ( )` becomes `%XX` over its UTF-8 bytes.
pub fn encode_uri_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Path and query for a prefix, e.g. `/api/autocomplete?prefix=dog`.
pub fn autocomplete_path(prefix: &str) -> String {
    format!("{}?prefix={}", AUTOCOMPLETE_PATH, encode_uri_component(prefix))
}

/// Full request URL against `base_url` (trailing slashes tolerated).
pub fn autocomplete_url(base_url: &str, prefix: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), autocomplete_path(prefix))
}

/// Parse a response body. A body without a `results` array is a decode error.
pub fn parse_response(body: &[u8]) -> Result<Vec<String>> {
    serde_json::from_slice::<AutocompleteResponse>(body)
        .map(|r| r.results)
        .map_err(|e| WidgetError::decode("autocomplete response", e))
}

/// `reqwest`-backed source. Works natively and on wasm32 (fetch API).
#[derive(Debug, Clone)]
pub struct HttpSuggestionSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSuggestionSource {
    #[cfg(not(target_arch = "wasm32"))]
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WidgetError::Config(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    /// The browser's fetch owns timeouts there.
    #[cfg(target_arch = "wasm32")]
    pub fn new(base_url: impl Into<String>, _timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl SuggestionSource for HttpSuggestionSource {
    fn fetch(&self, prefix: &str) -> LocalBoxFuture<'static, Result<Vec<String>>> {
        let url = autocomplete_url(&self.base_url, prefix);
        let client = self.client.clone();
        async move {
            let resp = client
                .get(&url)
                .send()
                .await
                .map_err(|e| WidgetError::Connect {
                    url: url.clone(),
                    detail: e.to_string(),
                })?;

            if !resp.status().is_success() {
                return Err(WidgetError::Http {
                    status: resp.status().as_u16(),
                    url,
                });
            }

            let bytes = resp
                .bytes()
                .await
                .map_err(|e| WidgetError::decode("autocomplete body", e))?;
            parse_response(&bytes)
        }
        .boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_plain_word_unchanged() {
        assert_eq!(encode_uri_component("dog"), "dog");
    }

    #[test]
    fn test_encode_space_is_percent_20() {
        assert_eq!(encode_uri_component("the matrix"), "the%20matrix");
    }

    #[test]
    fn test_encode_reserved_chars() {
        assert_eq!(encode_uri_component("a&b=c/d?"), "a%26b%3Dc%2Fd%3F");
        assert_eq!(encode_uri_component("+#%"), "%2B%23%25");
    }

    #[test]
    fn test_encode_keeps_unreserved_marks() {
        assert_eq!(encode_uri_component("-_.!~*'()"), "-_.!~*'()");
    }

    #[test]
    fn test_encode_utf8_multibyte() {
        assert_eq!(encode_uri_component("amélie"), "am%C3%A9lie");
    }

    #[test]
    fn test_autocomplete_path_example() {
        assert_eq!(autocomplete_path("dog"), "/api/autocomplete?prefix=dog");
    }

    #[test]
    fn test_autocomplete_url_trims_trailing_slash() {
        assert_eq!(
            autocomplete_url("http://localhost:5000/", "up"),
            "http://localhost:5000/api/autocomplete?prefix=up"
        );
    }

    #[test]
    fn test_parse_response_in_order() {
        let r = parse_response(br#"{"results":["dogma","dogs"]}"#).unwrap();
        assert_eq!(r, vec!["dogma", "dogs"]);
    }

    #[test]
    fn test_parse_response_empty_results() {
        assert!(parse_response(br#"{"results":[]}"#).unwrap().is_empty());
    }

    #[test]
    fn test_parse_response_missing_results_is_error() {
        let err = parse_response(br#"{"query":"dog"}"#).unwrap_err();
        assert!(matches!(err, WidgetError::Decode { .. }));
    }

    #[test]
    fn test_parse_response_not_json_is_error() {
        assert!(parse_response(b"<html>502</html>").is_err());
    }
}
