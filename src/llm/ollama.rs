//! Ollama `/api/generate` binding.

use tracing::debug;

use super::{BackendError, Generation, LlmBackend, http_client, validate_base_url};

/// Builder for constructing `OllamaClient` instances.
///
/// # Examples
///
/// ```
/// use docqa::llm::OllamaClientBuilder;
///
/// let client = OllamaClientBuilder::new()
///     .base_url("http://localhost:11434")
///     .model("llama3.2")
///     .build()
///     .expect("Failed to create client");
/// ```
#[derive(Debug, Default)]
pub struct OllamaClientBuilder {
    base_url: Option<String>,
    model: Option<String>,
}

impl OllamaClientBuilder {
    /// Creates a new `OllamaClientBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL for the Ollama API (e.g., "http://localhost:11434").
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the model name (e.g., "llama3.2").
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Builds the `OllamaClient` with the configured settings.
    ///
    /// # Environment Variables
    ///
    /// If `base_url()` was not called, `OLLAMA_HOST` is used, falling back to
    /// `http://localhost:11434`. If `model()` was not called, `OLLAMA_MODEL` is
    /// used, falling back to `llama3.2`.
    pub fn build(self) -> Result<OllamaClient, BackendError> {
        let base_url = self.base_url.unwrap_or_else(|| {
            std::env::var("OLLAMA_HOST").unwrap_or_else(|_| "http://localhost:11434".to_string())
        });
        let model = self.model.unwrap_or_else(|| {
            std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string())
        });

        Ok(OllamaClient {
            client: http_client()?,
            base_url: validate_base_url(&base_url)?,
            model,
        })
    }
}

/// Synchronous client for a local Ollama server.
pub struct OllamaClient {
    client: reqwest::blocking::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    /// Returns the base URL configured for this client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl LlmBackend for OllamaClient {
    fn generate(&self, prompt: &str) -> Result<Generation, BackendError> {
        let url = format!("{}/api/generate", self.base_url);
        let request_body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false
        });

        debug!(model = %self.model, prompt_chars = prompt.len(), "sending Ollama request");

        let response = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .map_err(BackendError::from_transport)?;

        let status = response.status();
        let body = response.text().map_err(BackendError::from_transport)?;

        if !status.is_success() {
            return Err(error_from_body(&body).unwrap_or(BackendError::Http {
                status: status.as_u16(),
            }));
        }

        extract_generation(&body)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Extracts the generated text from an Ollama response body.
fn extract_generation(body: &str) -> Result<Generation, BackendError> {
    let json: serde_json::Value =
        serde_json::from_str(body).map_err(BackendError::Serialization)?;

    if let Some(error) = error_from_value(&json) {
        return Err(error);
    }

    json.get("response")
        .and_then(|v| v.as_str())
        .map(Generation::from_text)
        .ok_or_else(|| BackendError::Api {
            message: "Missing 'response' field in API response".to_string(),
        })
}

/// Ollama reports failures as `{"error": "..."}`.
fn error_from_body(body: &str) -> Option<BackendError> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .as_ref()
        .and_then(error_from_value)
}

fn error_from_value(json: &serde_json::Value) -> Option<BackendError> {
    json.get("error")
        .and_then(|e| e.as_str())
        .map(|message| BackendError::Api {
            message: message.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn extracts_response_field() {
        let body = r#"{"model":"llama3.2","response":"Paris.","done":true}"#;
        assert_eq!(
            extract_generation(body).unwrap(),
            Generation::Text("Paris.".to_string())
        );
    }

    #[test]
    fn empty_response_field_is_empty_generation() {
        let body = r#"{"model":"llama3.2","response":"","done":true}"#;
        assert_eq!(extract_generation(body).unwrap(), Generation::Empty);
    }

    #[test]
    fn missing_response_field_is_api_error() {
        let result = extract_generation(r#"{"done":true}"#);
        assert!(matches!(result, Err(BackendError::Api { .. })));
    }

    #[test]
    fn error_field_is_surfaced_as_api_error() {
        let result = extract_generation(r#"{"error":"model 'x' not found"}"#);
        match result {
            Err(BackendError::Api { message }) => assert_eq!(message, "model 'x' not found"),
            other => panic!("Expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn non_json_body_is_serialization_error() {
        let result = extract_generation("<html>bad gateway</html>");
        assert!(matches!(result, Err(BackendError::Serialization(_))));
    }

    #[test]
    #[serial]
    fn build_uses_defaults_when_env_not_set() {
        unsafe {
            std::env::remove_var("OLLAMA_HOST");
            std::env::remove_var("OLLAMA_MODEL");
        }

        let client = OllamaClientBuilder::new().build().unwrap();
        assert_eq!(client.base_url(), "http://localhost:11434");
        assert_eq!(client.model(), "llama3.2");
    }

    #[test]
    #[serial]
    fn builder_values_take_precedence_over_env() {
        unsafe {
            std::env::set_var("OLLAMA_HOST", "http://env-host:11434");
            std::env::set_var("OLLAMA_MODEL", "env-model");
        }

        let client = OllamaClientBuilder::new()
            .base_url("http://builder-host:11434")
            .model("builder-model")
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "http://builder-host:11434");
        assert_eq!(client.model(), "builder-model");

        unsafe {
            std::env::remove_var("OLLAMA_HOST");
            std::env::remove_var("OLLAMA_MODEL");
        }
    }

    #[test]
    fn build_returns_error_if_invalid_url_provided() {
        let result = OllamaClientBuilder::new()
            .base_url("not-a-valid-url")
            .build();
        assert!(matches!(result, Err(BackendError::InvalidUrl(_))));
    }
}
