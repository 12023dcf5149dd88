//! HTTP search client for OpenObserve-compatible backends.
//!
//! # Example
//!
//! ```rust,no_run
//! use tide_client::{ClientConfig, HttpSearchClient, SearchBackend, SearchQuery};
//! use tide_query::TimeExpr;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::new("http://localhost:5080", "default");
//! let client = HttpSearchClient::new(config)?;
//!
//! let query = SearchQuery::new(
//!     "SELECT * FROM app_logs ORDER BY _timestamp DESC LIMIT 10",
//!     TimeExpr::parse("-1h")?,
//!     TimeExpr::Now,
//!     10,
//! );
//! let results = client.search(&query).await?;
//! println!("hits: {}", results.hits.len());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::json;
use tracing::debug;

use crate::backend::{ByteChunks, SearchBackend};
use crate::error::ClientError;
use crate::types::{SearchQuery, SearchResults};

/// Default request timeout for one search call.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for an OpenObserve-style backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend, without a trailing slash.
    pub base_url: String,
    /// Organization the streams live under.
    pub org: String,
    /// Per-request timeout for bounded searches.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Creates a config for the given backend and organization.
    #[must_use]
    pub fn new(base_url: impl Into<String>, org: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            org: org.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A search backend speaking the OpenObserve HTTP API.
#[derive(Debug, Clone)]
pub struct HttpSearchClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl HttpSearchClient {
    /// Creates a client with its own connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] when the base URL cannot be
    /// parsed, or a transport error when the underlying client cannot be
    /// constructed.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        reqwest::Url::parse(&config.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {e}", config.base_url)))?;

        // No client-wide timeout: it would also cap long-lived chunked
        // streams. Bounded searches get a per-request timeout instead.
        let http = reqwest::Client::builder().build()?;

        Ok(Self { http, config })
    }

    /// Creates a client around an existing `reqwest` client.
    ///
    /// Use this to share a connection pool or to install default headers
    /// (authentication is the caller's concern).
    #[must_use]
    pub const fn with_client(http: reqwest::Client, config: ClientConfig) -> Self {
        Self { http, config }
    }

    /// The configuration this client was built with.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn search_url(&self) -> String {
        format!("{}/api/{}/_search", self.config.base_url, self.config.org)
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/api/{}/_search_stream",
            self.config.base_url, self.config.org
        )
    }
}

/// Reads the body of a failed response for the error message.
async fn status_error(response: reqwest::Response) -> ClientError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ClientError::Status { status, body }
}

#[async_trait]
impl SearchBackend for HttpSearchClient {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResults, ClientError> {
        let url = self.search_url();
        debug!(url = %url, sql = %query.sql, "issuing search");

        let body = json!({
            "query": {
                "sql": query.sql,
                "start_time": query.start_time,
                "end_time": query.end_time,
                "size": query.size,
                "from": 0,
            }
        });

        let response = self
            .http
            .post(&url)
            .timeout(self.config.timeout)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        Ok(response.json::<SearchResults>().await?)
    }

    async fn stream(&self, query: &SearchQuery) -> Result<ByteChunks, ClientError> {
        let url = self.stream_url();
        debug!(url = %url, sql = %query.sql, "opening chunked stream");

        let body = json!({
            "sql": query.sql,
            "start_time": query.start_time,
            "end_time": query.end_time,
        });

        let response = self
            .http
            .post(&url)
            .query(&[
                ("is_ui_histogram", "false"),
                ("is_multi_stream_search", "false"),
            ])
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let chunks = response
            .bytes_stream()
            .map(|item| item.map_err(ClientError::from));
        Ok(Box::pin(chunks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_strips_trailing_slashes() {
        let config = ClientConfig::new("http://localhost:5080///", "default");
        assert_eq!(config.base_url, "http://localhost:5080");
    }

    #[test]
    fn config_default_timeout() {
        let config = ClientConfig::new("http://localhost:5080", "default");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);

        let config = config.with_timeout(Duration::from_secs(5));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn urls_embed_the_org() {
        let config = ClientConfig::new("http://localhost:5080", "acme");
        let client = HttpSearchClient::new(config).expect("valid config");
        assert_eq!(
            client.search_url(),
            "http://localhost:5080/api/acme/_search"
        );
        assert_eq!(
            client.stream_url(),
            "http://localhost:5080/api/acme/_search_stream"
        );
    }

    #[test]
    fn bad_base_url_is_rejected() {
        let config = ClientConfig::new("not a url", "default");
        let result = HttpSearchClient::new(config);
        assert!(matches!(result, Err(ClientError::InvalidUrl(_))));
    }
}
