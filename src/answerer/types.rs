//! Types for answers produced by the LLM backend.

/// Text recorded when the backend succeeds but generates nothing.
pub const NO_RESPONSE_TEXT: &str = "No response generated.";

/// A successfully obtained answer to a document question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    /// The generated answer text (empty when no response was generated)
    text: String,
    /// Model used to generate the answer
    model: String,
    /// True if the backend returned no candidates or no text
    no_response: bool,
}

impl Answer {
    /// Creates an answer carrying generated text.
    pub fn new(text: String, model: String) -> Self {
        Self {
            text,
            model,
            no_response: false,
        }
    }

    /// Creates an answer recording that the backend generated nothing.
    pub fn no_response(model: String) -> Self {
        Self {
            text: String::new(),
            model,
            no_response: true,
        }
    }

    /// Returns the text to show for this answer.
    ///
    /// Falls back to [`NO_RESPONSE_TEXT`] when nothing was generated.
    pub fn text(&self) -> &str {
        if self.no_response {
            NO_RESPONSE_TEXT
        } else {
            &self.text
        }
    }

    /// Returns the model used.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns true if the backend generated nothing.
    pub fn is_no_response(&self) -> bool {
        self.no_response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_response_uses_sentinel_text() {
        let answer = Answer::no_response("model".to_string());
        assert!(answer.is_no_response());
        assert_eq!(answer.text(), NO_RESPONSE_TEXT);
    }

    #[test]
    fn answer_text_is_returned_unchanged() {
        let answer = Answer::new("  Paris.\n".to_string(), "model".to_string());
        assert!(!answer.is_no_response());
        assert_eq!(answer.text(), "  Paris.\n");
        assert_eq!(answer.model(), "model");
    }
}
