/// Integration tests for the LLM bindings.
///
/// The live tests need a running Ollama instance or a Gemini API key. They are
/// skipped in GitHub Actions CI and when the backend is not configured.
///
/// To run locally:
/// ```bash
/// cargo test --test backend_integration
/// ```
use std::sync::Arc;

use docqa::answerer::AnswerService;
use docqa::llm::{BackendError, GeminiClientBuilder, LlmBackend, OllamaClientBuilder};
use docqa::{ConversationState, Document, Role};

/// Skip test if running in GitHub Actions
fn skip_in_ci() -> bool {
    if std::env::var("GITHUB_ACTIONS").as_deref() == Ok("true") {
        println!("Skipping test in GitHub Actions (no LLM backend available)");
        return true;
    }
    false
}

/// Nothing listens on this port.
const UNREACHABLE: &str = "http://127.0.0.1:65535";

#[test]
fn unreachable_ollama_is_a_transport_error() {
    let client = OllamaClientBuilder::new()
        .base_url(UNREACHABLE)
        .model("llama3.2")
        .build()
        .expect("Failed to create Ollama client");

    let err = client.generate("Say hello").unwrap_err();
    assert!(
        matches!(err, BackendError::Network(_) | BackendError::Timeout(_)),
        "Expected transport error, got {err:?}"
    );
}

#[test]
fn unreachable_gemini_is_a_transport_error() {
    let client = GeminiClientBuilder::new()
        .api_key("test-key")
        .base_url(UNREACHABLE)
        .build()
        .expect("Failed to create Gemini client");

    let err = client.generate("Say hello").unwrap_err();
    assert!(matches!(
        err,
        BackendError::Network(_) | BackendError::Timeout(_)
    ));
    assert!(!err.to_string().contains("test-key"));
}

#[test]
fn unreachable_backend_is_recorded_as_answer() {
    let client = OllamaClientBuilder::new()
        .base_url(UNREACHABLE)
        .build()
        .expect("Failed to create Ollama client");
    let service = AnswerService::new(Arc::new(client));

    let mut state = ConversationState::new();
    state.load_document(Document::new("notes.txt", "The sky is blue."));

    let reply = state.ask(&service, "What colour is the sky?").unwrap();
    assert_eq!(reply.role(), Role::Assistant);
    assert!(reply.text().starts_with("Error calling LLM backend"));
    // The refused connection itself is recorded, not just the request URL.
    assert!(
        reply.text().to_lowercase().contains("connect"),
        "{}",
        reply.text()
    );
    assert!(!state.is_pending());

    // The conversation stays usable after the failure.
    state.submit_question("Again?").unwrap();
    assert!(state.is_pending());
}

#[test]
fn answer_with_real_ollama_instance() {
    if skip_in_ci() {
        return;
    }

    let client = OllamaClientBuilder::new()
        .build()
        .expect("Failed to create Ollama client");
    let service = AnswerService::new(Arc::new(client));

    match service.ask(
        "Paris is the capital of France.",
        "What is the capital of France?",
    ) {
        Ok(answer) => {
            println!("Ollama ({}) answered: {}", answer.model(), answer.text());
            assert!(!answer.text().is_empty());
        }
        Err(BackendError::Network(e)) => {
            println!("Skipping: Ollama not reachable ({e})");
        }
        Err(e) => panic!("Ollama call failed: {e}"),
    }
}

#[test]
fn answer_with_real_gemini_api() {
    if skip_in_ci() {
        return;
    }

    let client = match GeminiClientBuilder::new().build() {
        Ok(client) => client,
        Err(BackendError::MissingApiKey(var)) => {
            println!("Skipping: {var} not set");
            return;
        }
        Err(e) => panic!("Failed to create Gemini client: {e}"),
    };
    let service = AnswerService::new(Arc::new(client));

    let answer = service
        .ask(
            "Paris is the capital of France.",
            "What is the capital of France?",
        )
        .expect("Gemini call failed");
    println!("Gemini ({}) answered: {}", answer.model(), answer.text());
    assert!(answer.text().contains("Paris"));
}
