//! Answer service backed by an injected LLM binding.

use std::error::Error;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::llm::{BackendError, Generation, LlmBackend};
use crate::prompt::build_prompt;

use super::types::Answer;

/// Builder for constructing `AnswerService` instances.
#[derive(Default)]
pub struct AnswerServiceBuilder {
    backend: Option<Arc<dyn LlmBackend>>,
}

impl AnswerServiceBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the LLM backend to use.
    pub fn backend(mut self, backend: Arc<dyn LlmBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Builds the `AnswerService`.
    ///
    /// # Panics
    ///
    /// Panics if `backend()` was not called.
    #[must_use]
    pub fn build(self) -> AnswerService {
        AnswerService {
            backend: self
                .backend
                .expect("backend must be set via backend() method"),
        }
    }
}

/// Answers questions about a document with a single backend call per question.
///
/// Performs no retries and no caching: asking the same question twice sends
/// two requests.
#[derive(Clone)]
pub struct AnswerService {
    backend: Arc<dyn LlmBackend>,
}

impl AnswerService {
    /// Creates a new `AnswerService` with the specified backend.
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self { backend }
    }

    /// Returns the model name of the underlying backend.
    pub fn model(&self) -> &str {
        self.backend.model()
    }

    /// Answers `question` using the full `document_text` as context.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the backend is unreachable, rejects the
    /// request, or returns a response that cannot be interpreted. A backend
    /// that answers with nothing is not an error; see [`Answer::is_no_response`].
    pub fn ask(&self, document_text: &str, question: &str) -> Result<Answer, BackendError> {
        let prompt = build_prompt(document_text, question);
        let model = self.backend.model().to_string();

        match self.backend.generate(&prompt) {
            Ok(Generation::Text(text)) => {
                debug!(model = %model, answer_chars = text.len(), "answer generated");
                Ok(Answer::new(text, model))
            }
            Ok(Generation::Empty) => {
                warn!(model = %model, "backend returned no response");
                Ok(Answer::no_response(model))
            }
            Err(e) => {
                warn!(model = %model, error = %e, "backend call failed");
                Err(e)
            }
        }
    }
}

/// Renders an answer outcome as the assistant's message text.
///
/// Failures become a readable description of what went wrong so they can be
/// recorded in the conversation like any other answer.
///
/// # Examples
///
/// ```
/// use docqa::answerer::outcome_text;
/// use docqa::llm::BackendError;
///
/// let failed = Err(BackendError::Http { status: 503 });
/// assert_eq!(outcome_text(&failed), "Error calling LLM backend: HTTP error: status 503");
/// ```
pub fn outcome_text(outcome: &Result<Answer, BackendError>) -> String {
    match outcome {
        Ok(answer) => answer.text().to_string(),
        Err(e) => format!("Error calling LLM backend: {}", error_chain(e)),
    }
}

/// Renders `error` followed by each distinct cause in its source chain.
fn error_chain(error: &dyn Error) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answerer::NO_RESPONSE_TEXT;
    use std::sync::Mutex;

    struct MockBackend {
        response: fn() -> Result<Generation, BackendError>,
        prompts: Mutex<Vec<String>>,
    }

    impl MockBackend {
        fn new(response: fn() -> Result<Generation, BackendError>) -> Self {
            Self {
                response,
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    impl LlmBackend for MockBackend {
        fn generate(&self, prompt: &str) -> Result<Generation, BackendError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            (self.response)()
        }

        fn model(&self) -> &str {
            "mock-model"
        }
    }

    #[test]
    fn test_answer_service_builder() {
        let service = AnswerServiceBuilder::new()
            .backend(Arc::new(MockBackend::new(|| {
                Ok(Generation::Text("Paris.".to_string()))
            })))
            .build();

        let answer = service
            .ask("Paris is the capital of France.", "What is the capital?")
            .unwrap();
        assert_eq!(answer.text(), "Paris.");
        assert_eq!(answer.model(), "mock-model");
    }

    #[test]
    fn test_prompt_contains_document_and_question() {
        let backend = Arc::new(MockBackend::new(|| {
            Ok(Generation::Text("ok".to_string()))
        }));
        let service = AnswerService::new(backend.clone());

        service.ask("The sky is green.", "What colour is the sky?").unwrap();

        let prompts = backend.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert_eq!(
            prompts[0],
            build_prompt("The sky is green.", "What colour is the sky?")
        );
    }

    #[test]
    fn test_empty_generation_is_sentinel_answer() {
        let service = AnswerService::new(Arc::new(MockBackend::new(|| Ok(Generation::Empty))));

        let answer = service.ask("doc", "q").unwrap();
        assert!(answer.is_no_response());
        assert_eq!(outcome_text(&Ok(answer)), NO_RESPONSE_TEXT);
    }

    #[test]
    fn test_backend_failure_is_returned_not_raised() {
        let service = AnswerService::new(Arc::new(MockBackend::new(|| {
            Err(BackendError::Api {
                message: "API key not valid.".to_string(),
            })
        })));

        let outcome = service.ask("doc", "q");
        assert!(matches!(outcome, Err(BackendError::Api { .. })));

        let text = outcome_text(&outcome);
        assert!(text.starts_with("Error calling LLM backend"));
        assert!(text.contains("API key not valid."));
    }

    #[test]
    fn test_failure_text_includes_underlying_cause() {
        let transport = reqwest::blocking::Client::new()
            .get("not-a-valid-url")
            .send()
            .unwrap_err();
        let outcome: Result<Answer, BackendError> = Err(BackendError::Network(transport));

        let text = outcome_text(&outcome);
        assert!(text.starts_with("Error calling LLM backend: Network error: "));
        assert!(text.contains("relative URL without a base"), "{text}");
    }

    #[test]
    fn test_identical_questions_are_not_cached() {
        let backend = Arc::new(MockBackend::new(|| {
            Ok(Generation::Text("same".to_string()))
        }));
        let service = AnswerService::new(backend.clone());

        service.ask("doc", "q").unwrap();
        service.ask("doc", "q").unwrap();

        assert_eq!(backend.prompts.lock().unwrap().len(), 2);
    }
}
