//! Gemini `generateContent` binding.

use serde::Deserialize;
use tracing::debug;

use super::{BackendError, Generation, LlmBackend, http_client, validate_base_url};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-1.5-pro-latest";

/// Builder for constructing `GeminiClient` instances.
///
/// # Examples
///
/// ```
/// use docqa::llm::GeminiClientBuilder;
///
/// let client = GeminiClientBuilder::new()
///     .api_key("test-key")
///     .model("gemini-1.5-flash")
///     .build()
///     .expect("Failed to create client");
/// ```
#[derive(Debug, Default)]
pub struct GeminiClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
}

impl GeminiClientBuilder {
    /// Creates a new `GeminiClientBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the API base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the model name (e.g., "gemini-1.5-pro-latest").
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Builds the `GeminiClient`.
    ///
    /// # Environment Variables
    ///
    /// Unset builder values fall back to `GEMINI_API_KEY` (then `GOOGLE_API_KEY`),
    /// `GEMINI_BASE_URL` and `GEMINI_MODEL`. A missing API key is an error.
    pub fn build(self) -> Result<GeminiClient, BackendError> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or(BackendError::MissingApiKey("GEMINI_API_KEY"))?;

        let base_url = self.base_url.unwrap_or_else(|| {
            std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
        });
        let model = self.model.unwrap_or_else(|| {
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string())
        });

        Ok(GeminiClient {
            client: http_client()?,
            api_key,
            base_url: validate_base_url(&base_url)?,
            model,
        })
    }
}

/// Synchronous client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    client: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    /// Returns the base URL configured for this client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

impl LlmBackend for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<Generation, BackendError> {
        let request_body = serde_json::json!({
            "contents": [
                { "parts": [ { "text": prompt } ] }
            ]
        });

        debug!(model = %self.model, prompt_chars = prompt.len(), "sending Gemini request");

        // Key goes in a header so it never appears in transport error messages.
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .map_err(BackendError::from_transport)?;

        let status = response.status();
        let body = response.text().map_err(BackendError::from_transport)?;

        if !status.is_success() {
            return Err(api_error(&body).unwrap_or(BackendError::Http {
                status: status.as_u16(),
            }));
        }

        extract_generation(&body)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Extracts answer text from the first candidate of a `generateContent` response.
///
/// Zero candidates (e.g. a blocked prompt) or a candidate without text parts is
/// an empty generation, not an error.
fn extract_generation(body: &str) -> Result<Generation, BackendError> {
    let response: GenerateContentResponse =
        serde_json::from_str(body).map_err(BackendError::Serialization)?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    Ok(Generation::from_text(text))
}

fn api_error(body: &str) -> Option<BackendError> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| BackendError::Api {
            message: envelope.error.message,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        unsafe {
            std::env::remove_var("GEMINI_API_KEY");
            std::env::remove_var("GOOGLE_API_KEY");
            std::env::remove_var("GEMINI_BASE_URL");
            std::env::remove_var("GEMINI_MODEL");
        }
    }

    #[test]
    fn extracts_text_from_first_candidate() {
        let body = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "Paris"}, {"text": "."}], "role": "model"}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }"#;
        assert_eq!(
            extract_generation(body).unwrap(),
            Generation::Text("Paris.".to_string())
        );
    }

    #[test]
    fn zero_candidates_is_empty_generation() {
        let body = r#"{"candidates": [], "promptFeedback": {"blockReason": "SAFETY"}}"#;
        assert_eq!(extract_generation(body).unwrap(), Generation::Empty);

        let body = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        assert_eq!(extract_generation(body).unwrap(), Generation::Empty);
    }

    #[test]
    fn candidate_without_content_is_empty_generation() {
        let body = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        assert_eq!(extract_generation(body).unwrap(), Generation::Empty);
    }

    #[test]
    fn malformed_body_is_serialization_error() {
        let result = extract_generation("upstream connect error");
        assert!(matches!(result, Err(BackendError::Serialization(_))));
    }

    #[test]
    fn error_envelope_is_parsed() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}}"#;
        match api_error(body) {
            Some(BackendError::Api { message }) => assert_eq!(message, "API key not valid."),
            other => panic!("Expected Api error, got {other:?}"),
        }
        assert!(api_error("Service Unavailable").is_none());
    }

    #[test]
    #[serial]
    fn build_fails_without_api_key() {
        clear_env();
        let result = GeminiClientBuilder::new().build();
        assert!(matches!(result, Err(BackendError::MissingApiKey(_))));
    }

    #[test]
    #[serial]
    fn build_falls_back_to_google_api_key() {
        clear_env();
        unsafe {
            std::env::set_var("GOOGLE_API_KEY", "google-key");
        }

        let client = GeminiClientBuilder::new().build().unwrap();
        assert_eq!(client.api_key, "google-key");
        assert_eq!(client.model(), DEFAULT_MODEL);
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);

        clear_env();
    }

    #[test]
    #[serial]
    fn builder_values_take_precedence_over_env() {
        clear_env();
        unsafe {
            std::env::set_var("GEMINI_API_KEY", "env-key");
            std::env::set_var("GEMINI_MODEL", "env-model");
        }

        let client = GeminiClientBuilder::new()
            .api_key("builder-key")
            .model("builder-model")
            .base_url("http://localhost:8080/")
            .build()
            .unwrap();
        assert_eq!(client.api_key, "builder-key");
        assert_eq!(client.model(), "builder-model");
        assert_eq!(
            client.endpoint(),
            "http://localhost:8080/v1beta/models/builder-model:generateContent"
        );

        clear_env();
    }
}
