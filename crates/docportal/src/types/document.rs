//! Document and chunk types

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque document identifier handed out on upload
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Generate a fresh identifier: `pdf_<yyyymmdd_HHMMSS>_<8 hex>`
    pub fn generate() -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!(
            "pdf_{}_{}",
            chrono::Utc::now().format("%Y%m%d_%H%M%S"),
            &suffix[..8]
        ))
    }

    /// Borrow the identifier text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is safe to use as a file stem
    pub fn is_path_safe(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DocumentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A block of extracted text, in reading order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Page number (1-indexed) when the extractor knows it
    pub page_number: Option<u32>,
    /// Extracted text
    pub text: String,
}

impl TextBlock {
    pub fn new(page_number: Option<u32>, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
        }
    }
}

/// An ingested PDF
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Document identifier
    pub id: DocumentId,
    /// Original filename as uploaded
    pub filename: String,
    /// SHA-256 of the uploaded bytes
    pub content_hash: String,
    /// File size in bytes
    pub file_size: u64,
    /// Total number of pages (if known)
    pub total_pages: Option<u32>,
    /// Total number of chunks created
    pub total_chunks: u32,
    /// Length of the extracted text in bytes
    pub total_chars: usize,
    /// Ingestion timestamp
    pub ingested_at: chrono::DateTime<chrono::Utc>,
}

impl Document {
    /// Create a new document record
    pub fn new(id: DocumentId, filename: String, content_hash: String, file_size: u64) -> Self {
        Self {
            id,
            filename,
            content_hash,
            file_size,
            total_pages: None,
            total_chunks: 0,
            total_chars: 0,
            ingested_at: chrono::Utc::now(),
        }
    }
}

/// A retrieval unit: an exact span of a document's extracted text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Owning document
    pub document_id: DocumentId,
    /// Sequence position within the document (0-based)
    pub position: u32,
    /// Page the chunk starts on (if known)
    pub page_number: Option<u32>,
    /// Byte offset of the chunk start in the extracted text
    pub char_start: usize,
    /// Byte offset one past the chunk end
    pub char_end: usize,
    /// Text content
    pub content: String,
    /// Embedding vector
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub embedding: Vec<f32>,
}

impl Chunk {
    /// Create a chunk without an embedding
    pub fn new(
        document_id: DocumentId,
        position: u32,
        page_number: Option<u32>,
        char_start: usize,
        char_end: usize,
        content: String,
    ) -> Self {
        Self {
            document_id,
            position,
            page_number,
            char_start,
            char_end,
            content,
            embedding: Vec::new(),
        }
    }

    /// Copy of the chunk with the embedding dropped
    pub fn without_embedding(&self) -> Self {
        Self {
            embedding: Vec::new(),
            ..self.clone()
        }
    }
}
