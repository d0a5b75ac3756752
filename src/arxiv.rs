/// arXiv paper search.
///
/// This module provides a synchronous client for the arXiv query API and a
/// tolerant parser for its Atom feed responses.
mod client;
mod feed;

use std::fmt;

use thiserror::Error;

pub use client::{ArxivClient, ArxivClientBuilder, DEFAULT_MAX_RESULTS};
pub use feed::parse_feed;

/// Errors that abort a paper search. No partial results are returned.
#[derive(Debug, Error)]
pub enum SearchBackendError {
    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request or response timeout errors
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    /// HTTP errors with status code
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// The response was not a readable Atom feed
    #[error("Malformed feed: {0}")]
    Parse(String),

    /// Invalid URL configuration error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl SearchBackendError {
    pub(crate) fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error)
        } else {
            Self::Network(error)
        }
    }
}

/// A single search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperRecord {
    /// Paper title with whitespace normalized
    pub title: String,
    /// Abstract with whitespace normalized
    pub summary: String,
    /// Canonical abstract page (the entry's Atom `id`)
    pub link: reqwest::Url,
}

impl fmt::Display for PaperRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Title: {}\nSummary: {}\nLink: {}",
            self.title, self.summary, self.link
        )
    }
}

/// Keyword search over a scholarly-paper index.
///
/// Each call queries the backend afresh; results are returned in backend order.
pub trait PaperSearch {
    /// Returns up to `max_results` papers matching `query`.
    fn search(&self, query: &str, max_results: usize)
    -> Result<Vec<PaperRecord>, SearchBackendError>;
}
