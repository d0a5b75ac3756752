//! Backend selection from the environment.
//!
//! `.env` is loaded by the binary before anything here runs; each client
//! builder then resolves its own variables.

use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::arxiv::{ArxivClient, ArxivClientBuilder};
use crate::llm::{GeminiClientBuilder, LlmBackend, OllamaClientBuilder};

/// Which LLM backend answers questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    #[default]
    Gemini,
    Ollama,
}

impl Provider {
    /// Parses a provider name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Some(Self::Gemini),
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }

    /// Reads `DOCQA_PROVIDER`, defaulting to Gemini when unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable names an unknown provider.
    pub fn from_env() -> Result<Self> {
        match std::env::var("DOCQA_PROVIDER") {
            Ok(value) => Self::parse(&value).with_context(|| {
                format!("Unknown DOCQA_PROVIDER '{value}' (expected 'gemini' or 'ollama')")
            }),
            Err(_) => Ok(Self::default()),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gemini => write!(f, "gemini"),
            Self::Ollama => write!(f, "ollama"),
        }
    }
}

/// Builds the LLM backend for `provider` from environment configuration.
///
/// # Errors
///
/// Returns an error if the backend is misconfigured (missing key, bad URL).
pub fn llm_backend(provider: Provider) -> Result<Arc<dyn LlmBackend>> {
    let backend: Arc<dyn LlmBackend> = match provider {
        Provider::Gemini => Arc::new(
            GeminiClientBuilder::new()
                .build()
                .context("Failed to configure Gemini backend")?,
        ),
        Provider::Ollama => Arc::new(
            OllamaClientBuilder::new()
                .build()
                .context("Failed to configure Ollama backend")?,
        ),
    };
    Ok(backend)
}

/// Builds the paper-search client from environment configuration.
///
/// # Errors
///
/// Returns an error if `ARXIV_API_URL` is not a valid URL.
pub fn paper_search() -> Result<ArxivClient> {
    ArxivClientBuilder::new()
        .build()
        .context("Failed to configure arXiv client")
}
