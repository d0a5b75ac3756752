pub mod answerer;
pub mod arxiv;
pub mod config;
pub mod conversation;
pub mod document;
pub mod llm;
pub mod prompt;
pub mod tui;

pub use answerer::{Answer, AnswerService, NO_RESPONSE_TEXT};
pub use arxiv::{PaperRecord, PaperSearch, SearchBackendError};
pub use conversation::{
    ConversationError, ConversationState, EmptyDocumentWarning, Message, Phase, Role,
};
pub use document::{Document, DocumentExtractor, DocumentId, ExtractionError, FileExtractor};
pub use llm::{BackendError, Generation, LlmBackend};
pub use prompt::build_prompt;
