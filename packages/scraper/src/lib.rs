#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dispatch page scraping.
//!
//! Provides the [`FetchDocument`] trait with an HTTP implementation
//! ([`HttpFetcher`]) that downloads the dispatch page, and the
//! [`html_table`] extractor that turns the page's incident table into
//! [`fire_map_incident_models::Incident`] records. The [`progress`] module
//! holds the rendering-agnostic progress trait used by ingestion runs.

pub mod html_table;
pub mod progress;

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

/// Errors that can occur during scraping operations.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// An HTTP request failed (connection, timeout, or error status).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Building the request or a selector failed.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Where and how to fetch the dispatch page.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// The page URL.
    pub url: String,
    /// `User-Agent` sent with the request. The dispatch site rejects
    /// requests that do not look like a browser.
    pub user_agent: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Additional HTTP headers to include in the request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Layout of the incident table on the page.
    #[serde(default)]
    pub table: html_table::TableLayout,
}

const fn default_timeout_secs() -> u64 {
    30
}

/// Trait for retrieving the raw dispatch page markup.
pub trait FetchDocument: Send + Sync {
    /// Fetches the document body.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError`] if the document cannot be retrieved.
    fn fetch(&self) -> impl std::future::Future<Output = Result<String, ScrapeError>> + Send;
}

/// Fetches the dispatch page over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    url: String,
}

impl HttpFetcher {
    /// Builds a fetcher with the configured user agent, headers and timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError`] if a header is invalid or the client cannot
    /// be built.
    pub fn new(config: &SourceConfig) -> Result<Self, ScrapeError> {
        let mut header_map = reqwest::header::HeaderMap::new();
        for (key, value) in &config.headers {
            let name = reqwest::header::HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| ScrapeError::Parse(format!("invalid header name '{key}': {e}")))?;
            let val = reqwest::header::HeaderValue::from_str(value)
                .map_err(|e| ScrapeError::Parse(format!("invalid header value '{value}': {e}")))?;
            header_map.insert(name, val);
        }

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(header_map)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }
}

impl FetchDocument for HttpFetcher {
    async fn fetch(&self) -> Result<String, ScrapeError> {
        log::info!("Fetching {}", self.url);

        let response = self.client.get(&self.url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;

        // The page declares UTF-8 in a meta tag but not always in the
        // Content-Type header, so decode as UTF-8 unconditionally.
        let body = String::from_utf8_lossy(&bytes).into_owned();
        log::debug!("Fetched {} bytes", body.len());

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_header_name() {
        let config = SourceConfig {
            url: "http://localhost/".to_string(),
            user_agent: "test".to_string(),
            timeout_secs: 1,
            headers: BTreeMap::from([("bad header".to_string(), "x".to_string())]),
            table: html_table::TableLayout::default(),
        };

        assert!(matches!(
            HttpFetcher::new(&config),
            Err(ScrapeError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_host_is_an_error() {
        let config = SourceConfig {
            url: "http://127.0.0.1:1/".to_string(),
            user_agent: "test".to_string(),
            timeout_secs: 2,
            headers: BTreeMap::new(),
            table: html_table::TableLayout::default(),
        };
        let fetcher = HttpFetcher::new(&config).unwrap();

        assert!(matches!(fetcher.fetch().await, Err(ScrapeError::Http(_))));
    }
}
