//! Question answering over an uploaded document.
//!
//! This module provides the `AnswerService` which builds a prompt from the
//! document and question, sends it to an injected [`LlmBackend`](crate::llm::LlmBackend)
//! and turns the outcome into text that can be recorded in the conversation.

mod answer_service;
mod types;

pub use answer_service::{AnswerService, AnswerServiceBuilder, outcome_text};
pub use types::{Answer, NO_RESPONSE_TEXT};
