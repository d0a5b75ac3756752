//! Uploaded documents and the text-extraction collaborator.
//!
//! A [`Document`] is the plain text pulled out of an uploaded file plus an
//! opaque identifier. Extraction itself sits behind [`DocumentExtractor`] so the
//! conversation core never depends on a particular file format.

use std::fmt;
use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

/// Errors raised while turning a file into plain text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The file could not be read from disk
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The file was read but its contents could not be decoded
    #[error("Failed to extract text from {path}: {message}")]
    Corrupt { path: String, message: String },

    /// No extractor exists for this file type
    #[error("Unsupported file type: .{extension}")]
    Unsupported { extension: String },
}

/// Opaque identifier for an uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentId(String);

impl DocumentId {
    /// Creates a new document ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the underlying identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An uploaded document and its extracted text.
///
/// Immutable once created. A new upload replaces the document wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    id: DocumentId,
    text: String,
}

impl Document {
    /// Creates a document from an identifier and its extracted text.
    ///
    /// # Examples
    ///
    /// ```
    /// use docqa::Document;
    ///
    /// let doc = Document::new("notes.txt", "Paris is the capital of France.");
    /// assert_eq!(doc.id().as_str(), "notes.txt");
    /// assert!(!doc.is_empty());
    /// ```
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: DocumentId::new(id),
            text: text.into(),
        }
    }

    /// Returns the document identifier.
    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    /// Returns the extracted plain text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns true if extraction produced no usable text.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Produces plain text from a document on disk.
///
/// Implementations must not return partial text on failure.
pub trait DocumentExtractor {
    /// Extracts the full plain text of the file at `path`.
    fn extract_text(&self, path: &Path) -> Result<String, ExtractionError>;

    /// Extracts `path` and wraps the result in a [`Document`] named after the file.
    fn extract(&self, path: &Path) -> Result<Document, ExtractionError> {
        let text = self.extract_text(path)?;
        let id = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Document::new(id, text))
    }
}

/// Extractor for the file types the app accepts: plain text, markdown and PDF.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileExtractor;

impl FileExtractor {
    /// Creates a new extractor.
    pub fn new() -> Self {
        Self
    }
}

impl DocumentExtractor for FileExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, ExtractionError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        let path_str = path.display().to_string();

        let text = match extension.as_str() {
            "txt" | "md" | "markdown" => {
                fs::read_to_string(path).map_err(|source| ExtractionError::Io {
                    path: path_str.clone(),
                    source,
                })?
            }
            "pdf" => {
                let bytes = fs::read(path).map_err(|source| ExtractionError::Io {
                    path: path_str.clone(),
                    source,
                })?;
                pdf_extract::extract_text_from_mem(&bytes).map_err(|e| {
                    ExtractionError::Corrupt {
                        path: path_str.clone(),
                        message: e.to_string(),
                    }
                })?
            }
            _ => return Err(ExtractionError::Unsupported { extension }),
        };

        debug!(path = %path_str, chars = text.len(), "extracted document text");
        Ok(text)
    }
}
