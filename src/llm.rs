//! LLM backend bindings.
//!
//! The answer service only depends on [`LlmBackend`]; concrete bindings for
//! Gemini and Ollama live in submodules and are injected at startup.

use std::time::Duration;

use thiserror::Error;

mod gemini;
mod ollama;

pub use gemini::{GeminiClient, GeminiClientBuilder};
pub use ollama::{OllamaClient, OllamaClientBuilder};

/// Errors that can occur when calling an LLM backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request or response timeout errors
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    /// HTTP errors with status code
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// Response body was not the JSON shape the backend promises
    #[error("Malformed response: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Error reported by the backend itself (bad key, unknown model, ...)
    #[error("API error: {message}")]
    Api { message: String },

    /// Invalid URL configuration error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// No API key was configured for a backend that requires one
    #[error("Missing API key: set {0}")]
    MissingApiKey(&'static str),
}

impl BackendError {
    /// Classifies a transport error as either a timeout or a network failure.
    pub(crate) fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error)
        } else {
            Self::Network(error)
        }
    }
}

/// Outcome of a successful backend call.
///
/// A backend that answers with zero candidates is not a failure; it is
/// represented as [`Generation::Empty`] rather than an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    /// The model produced answer text
    Text(String),
    /// The call succeeded but the model produced nothing
    Empty,
}

impl Generation {
    /// Wraps model output, treating whitespace-only text as empty.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.trim().is_empty() {
            Self::Empty
        } else {
            Self::Text(text)
        }
    }
}

/// A synchronous LLM backend: one prompt in, one generation out.
///
/// This trait enables mocking in unit tests and lets the concrete backend be
/// swapped without touching the conversation state machine.
pub trait LlmBackend: Send + Sync {
    /// Sends `prompt` to the model and returns its generation.
    ///
    /// Performs exactly one request; no retries.
    fn generate(&self, prompt: &str) -> Result<Generation, BackendError>;

    /// Returns the model name this backend sends requests to.
    fn model(&self) -> &str;
}

/// Builds the blocking HTTP client shared by all bindings.
fn http_client() -> Result<reqwest::blocking::Client, BackendError> {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(60))
        .connect_timeout(Duration::from_secs(5))
        .build()
        .map_err(BackendError::Network)
}

/// Validates a configured base URL and strips any trailing slash.
fn validate_base_url(url: &str) -> Result<String, BackendError> {
    reqwest::Url::parse(url).map_err(|e| BackendError::InvalidUrl(format!("{}: {}", url, e)))?;
    Ok(url.trim_end_matches('/').to_string())
}
