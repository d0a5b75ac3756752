//! Conversation state machine for document question answering.
//!
//! [`ConversationState`] owns the loaded document, the ordered message history
//! and the pending-answer flag. It moves between three phases:
//!
//! ```text
//! Empty --load_document--> Ready --submit_question--> Awaiting
//!                            ^                            |
//!                            +------complete_answer-------+
//! ```
//!
//! `load_document` and `reset` are accepted in every phase. At most one
//! question is in flight at a time; a second `submit_question` while an answer
//! is pending is rejected rather than queued.

use std::fmt;
use std::path::Path;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::answerer::{AnswerService, outcome_text};
use crate::document::{Document, DocumentExtractor, DocumentId, ExtractionError};

/// Errors returned when an operation is not valid in the current phase.
///
/// A rejected operation never changes the conversation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConversationError {
    /// A question was submitted before any document was loaded
    #[error("No document loaded: upload a document before asking questions")]
    NoDocument,

    /// A question was submitted while the previous answer is still pending
    #[error("Still waiting for the previous answer")]
    AnswerPending,

    /// An answer was delivered while no question was awaiting one
    #[error("No question is awaiting an answer")]
    NoPendingQuestion,
}

impl ConversationError {
    /// Returns true if a question was rejected because the conversation was not ready.
    pub fn is_not_ready(&self) -> bool {
        matches!(self, Self::NoDocument | Self::AnswerPending)
    }
}

/// Non-fatal warning raised when a loaded document has no extractable text.
///
/// The document is still accepted; questions are answered against empty content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Document '{document}' contains no extractable text")]
pub struct EmptyDocumentWarning {
    /// The document that was loaded
    pub document: DocumentId,
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single immutable entry in the conversation history.
#[derive(Debug, Clone)]
pub struct Message {
    role: Role,
    text: String,
    sequence_number: u64,
    created_at: OffsetDateTime,
}

impl Message {
    fn new(role: Role, text: String, sequence_number: u64) -> Self {
        Self {
            role,
            text,
            sequence_number,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// Returns who authored the message.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the message text exactly as it was recorded.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the position of this message since the current document was loaded.
    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    /// Returns when the message was appended.
    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }
}

/// Phase of the conversation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No document loaded
    Empty,
    /// Document loaded, no answer pending
    Ready,
    /// A question has been recorded and its answer is pending
    Awaiting,
}

/// In-memory state of a single document conversation.
///
/// Invariants:
/// - `pending` is true iff the last message is a user message without an answer
/// - history is non-empty only while a document is loaded
/// - sequence numbers start at 0 for each document and increase by one per message
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    document: Option<Document>,
    history: Vec<Message>,
    pending: bool,
}

impl ConversationState {
    /// Creates an empty conversation with no document.
    ///
    /// # Examples
    ///
    /// ```
    /// use docqa::{ConversationState, Phase};
    ///
    /// let state = ConversationState::new();
    /// assert_eq!(state.phase(), Phase::Empty);
    /// assert!(state.history().is_empty());
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current phase.
    pub fn phase(&self) -> Phase {
        match (&self.document, self.pending) {
            (None, _) => Phase::Empty,
            (Some(_), false) => Phase::Ready,
            (Some(_), true) => Phase::Awaiting,
        }
    }

    /// Returns the loaded document, if any.
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// Returns true if a document is loaded.
    pub fn has_document(&self) -> bool {
        self.document.is_some()
    }

    /// Returns the ordered message history.
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Returns true if a question is awaiting its answer.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Returns the question awaiting an answer, if any.
    pub fn pending_question(&self) -> Option<&str> {
        if !self.pending {
            return None;
        }
        self.history
            .last()
            .filter(|m| m.role == Role::User)
            .map(Message::text)
    }

    /// Installs `document`, discarding any previous document and its history.
    ///
    /// Valid in every phase; always leaves the conversation `Ready` with an
    /// empty history. Returns a warning if the document has no text, but the
    /// document is loaded regardless.
    ///
    /// # Examples
    ///
    /// ```
    /// use docqa::{ConversationState, Document, Phase};
    ///
    /// let mut state = ConversationState::new();
    /// let warning = state.load_document(Document::new("empty.txt", ""));
    /// assert!(warning.is_some());
    /// assert_eq!(state.phase(), Phase::Ready);
    /// ```
    pub fn load_document(&mut self, document: Document) -> Option<EmptyDocumentWarning> {
        let warning = document.is_empty().then(|| EmptyDocumentWarning {
            document: document.id().clone(),
        });

        if let Some(ref w) = warning {
            warn!("{w}");
        }
        info!(
            document = %document.id(),
            chars = document.text().len(),
            discarded_messages = self.history.len(),
            "document loaded"
        );

        self.document = Some(document);
        self.history.clear();
        self.pending = false;

        warning
    }

    /// Extracts the file at `path` and loads it as the new document.
    ///
    /// # Errors
    ///
    /// Returns `ExtractionError` if the file cannot be read; the conversation
    /// is left exactly as it was.
    pub fn load_from(
        &mut self,
        extractor: &dyn DocumentExtractor,
        path: &Path,
    ) -> Result<Option<EmptyDocumentWarning>, ExtractionError> {
        let document = extractor.extract(path)?;
        Ok(self.load_document(document))
    }

    /// Records a user question and moves to `Awaiting`.
    ///
    /// # Errors
    ///
    /// Returns `ConversationError::NoDocument` with no document loaded, or
    /// `ConversationError::AnswerPending` while a previous answer is pending.
    /// Rejected questions leave the state untouched.
    pub fn submit_question(
        &mut self,
        question: impl Into<String>,
    ) -> Result<&Message, ConversationError> {
        match self.phase() {
            Phase::Empty => return Err(ConversationError::NoDocument),
            Phase::Awaiting => return Err(ConversationError::AnswerPending),
            Phase::Ready => {}
        }

        self.pending = true;
        Ok(self.append(Role::User, question.into()))
    }

    /// Records the answer to the pending question and moves back to `Ready`.
    ///
    /// `answer` is stored unchanged; it may describe a failure.
    ///
    /// # Errors
    ///
    /// Returns `ConversationError::NoPendingQuestion` unless a question is awaiting
    /// its answer.
    pub fn complete_answer(
        &mut self,
        answer: impl Into<String>,
    ) -> Result<&Message, ConversationError> {
        if self.phase() != Phase::Awaiting {
            return Err(ConversationError::NoPendingQuestion);
        }

        self.pending = false;
        Ok(self.append(Role::Assistant, answer.into()))
    }

    /// Asks `question` through `service` and records both turns.
    ///
    /// Backend failures are recorded as the assistant's answer, so an accepted
    /// question always leaves the conversation `Ready` again.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`submit_question`](Self::submit_question);
    /// the backend is not called in that case.
    pub fn ask(
        &mut self,
        service: &AnswerService,
        question: impl Into<String>,
    ) -> Result<&Message, ConversationError> {
        let question = question.into();
        self.submit_question(question.clone())?;

        let document_text = self.document.as_ref().map(Document::text).unwrap_or("");
        let outcome = service.ask(document_text, &question);

        self.complete_answer(outcome_text(&outcome))
    }

    /// Discards the document and history, returning to `Empty`.
    pub fn reset(&mut self) {
        debug!(discarded_messages = self.history.len(), "conversation reset");
        *self = Self::default();
    }

    fn append(&mut self, role: Role, text: String) -> &Message {
        let sequence_number = self.history.len() as u64;
        self.history.push(Message::new(role, text, sequence_number));
        &self.history[self.history.len() - 1]
    }
}
