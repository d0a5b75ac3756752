//! Prompt construction for document question answering.

/// Prompt template combining the full document with a single question.
///
/// The document is embedded verbatim between explicit markers so the model can
/// tell where the document ends and the question begins.
const PROMPT_TEMPLATE: &str = "You are an AI assistant with access to the following document content.
Answer the question using only the information in the document.

DOCUMENT:
<<<
{document}
>>>

QUESTION:
{question}

ANSWER:";

/// Builds the model input for answering `question` about `document_text`.
///
/// The document is never truncated, summarized or chunked. An empty document
/// still yields a well-formed prompt. Deterministic for identical inputs.
///
/// # Examples
///
/// ```
/// use docqa::build_prompt;
///
/// let prompt = build_prompt("Paris is the capital of France.", "What is the capital of France?");
/// assert!(prompt.contains("Paris is the capital of France."));
/// assert!(prompt.contains("What is the capital of France?"));
/// ```
pub fn build_prompt(document_text: &str, question: &str) -> String {
    // Single pass so placeholder text inside the document is never re-substituted.
    let (head, rest) = PROMPT_TEMPLATE
        .split_once("{document}")
        .unwrap_or((PROMPT_TEMPLATE, ""));
    let (middle, tail) = rest.split_once("{question}").unwrap_or((rest, ""));

    let mut prompt =
        String::with_capacity(PROMPT_TEMPLATE.len() + document_text.len() + question.len());
    prompt.push_str(head);
    prompt.push_str(document_text);
    prompt.push_str(middle);
    prompt.push_str(question);
    prompt.push_str(tail);
    prompt
}
