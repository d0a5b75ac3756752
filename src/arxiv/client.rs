/// arXiv query API client.
///
/// Builds `search_query` / `start` / `max_results` requests against the query
/// endpoint and hands the Atom response to the feed parser.
use std::time::Duration;

use tracing::{debug, info};

use super::feed::parse_feed;
use super::{PaperRecord, PaperSearch, SearchBackendError};

const DEFAULT_API_URL: &str = "http://export.arxiv.org/api/query";

/// Number of results requested when the caller has no preference.
pub const DEFAULT_MAX_RESULTS: usize = 3;

/// Builder for constructing `ArxivClient` instances.
///
/// # Examples
///
/// ```
/// use docqa::arxiv::ArxivClientBuilder;
///
/// let client = ArxivClientBuilder::new()
///     .api_url("http://export.arxiv.org/api/query")
///     .build()
///     .expect("Failed to create client");
/// ```
#[derive(Debug, Default)]
pub struct ArxivClientBuilder {
    api_url: Option<String>,
}

impl ArxivClientBuilder {
    /// Creates a new `ArxivClientBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the query endpoint URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Builds the `ArxivClient`.
    ///
    /// # Environment Variables
    ///
    /// If `api_url()` was not called, `ARXIV_API_URL` is used, falling back to
    /// `http://export.arxiv.org/api/query`.
    pub fn build(self) -> Result<ArxivClient, SearchBackendError> {
        let api_url = self.api_url.unwrap_or_else(|| {
            std::env::var("ARXIV_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string())
        });

        let api_url = reqwest::Url::parse(&api_url)
            .map_err(|e| SearchBackendError::InvalidUrl(format!("{}: {}", api_url, e)))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(SearchBackendError::Network)?;

        Ok(ArxivClient { client, api_url })
    }
}

/// Synchronous client for the arXiv query API.
pub struct ArxivClient {
    client: reqwest::blocking::Client,
    api_url: reqwest::Url,
}

impl ArxivClient {
    /// Returns the query endpoint this client calls.
    pub fn api_url(&self) -> &str {
        self.api_url.as_str()
    }

    /// Builds the request URL for a search.
    fn request_url(&self, query: &str, max_results: usize) -> reqwest::Url {
        let mut url = self.api_url.clone();
        url.query_pairs_mut()
            .append_pair("search_query", query)
            .append_pair("start", "0")
            .append_pair("max_results", &max_results.to_string());
        url
    }
}

impl PaperSearch for ArxivClient {
    /// Searches arXiv for `query`.
    ///
    /// # Errors
    ///
    /// Returns `SearchBackendError` on transport failure, a non-success status,
    /// or a response that is not an Atom feed. Zero matches is `Ok(vec![])`.
    fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<PaperRecord>, SearchBackendError> {
        let url = self.request_url(query, max_results);
        debug!(%url, "querying arXiv");

        let response = self
            .client
            .get(url.as_str())
            .send()
            .map_err(SearchBackendError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchBackendError::Http {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .map_err(SearchBackendError::from_transport)?;
        let records = parse_feed(&body)?;

        info!(query, results = records.len(), "arXiv search complete");
        Ok(records)
    }
}
