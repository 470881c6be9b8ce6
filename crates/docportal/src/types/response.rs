//! Response types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::{Document, DocumentId};
use crate::retrieval::ScoredChunk;

/// A retrieved chunk as shown to the caller and the LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextChunk {
    /// Chunk position within the document
    pub position: u32,
    /// Page the chunk starts on (if known)
    pub page_number: Option<u32>,
    /// Cosine similarity to the question
    pub score: f32,
    /// Chunk text
    pub text: String,
}

impl From<&ScoredChunk> for ContextChunk {
    fn from(result: &ScoredChunk) -> Self {
        Self {
            position: result.chunk.position,
            page_number: result.chunk.page_number,
            score: result.score,
            text: result.chunk.content.clone(),
        }
    }
}

/// Generated answer with the context it was conditioned on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Answer identifier (referenced by feedback)
    pub id: Uuid,
    /// Generated text
    pub text: String,
    /// Context chunks placed in the prompt, in rank order
    pub context: Vec<ContextChunk>,
    /// LLM round-trip latency in milliseconds
    pub latency_ms: u64,
}

/// Response from `POST /query_pdf`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Query identifier (referenced by feedback)
    pub query_id: Uuid,
    /// Answer identifier (referenced by feedback)
    pub answer_id: Uuid,
    /// Queried document
    pub pdf_id: DocumentId,
    /// Generated answer
    pub answer: String,
    /// Context chunks used
    pub context: Vec<ContextChunk>,
    /// LLM round-trip latency in milliseconds
    pub latency_ms: u64,
}

impl QueryResponse {
    pub fn new(query_id: Uuid, pdf_id: DocumentId, answer: Answer) -> Self {
        Self {
            query_id,
            answer_id: answer.id,
            pdf_id,
            answer: answer.text,
            context: answer.context,
            latency_ms: answer.latency_ms,
        }
    }
}

/// Response from `POST /upload_pdf`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Identifier to query the document with
    pub pdf_id: DocumentId,
    /// Original filename
    pub filename: String,
    /// Human-readable status
    pub message: String,
    /// Number of chunks indexed
    pub total_chunks: u32,
    /// Number of pages (if known)
    pub total_pages: Option<u32>,
}

impl From<&Document> for UploadResponse {
    fn from(doc: &Document) -> Self {
        Self {
            pdf_id: doc.id.clone(),
            filename: doc.filename.clone(),
            message: format!("PDF indexed successfully ({} chunks)", doc.total_chunks),
            total_chunks: doc.total_chunks,
            total_pages: doc.total_pages,
        }
    }
}

/// Summary of an indexed document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Document ID
    pub pdf_id: DocumentId,
    /// Filename
    pub filename: String,
    /// Number of pages (if applicable)
    pub total_pages: Option<u32>,
    /// Number of chunks
    pub total_chunks: u32,
    /// File size in bytes
    pub file_size: u64,
    /// Ingestion time
    pub ingested_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Document> for DocumentSummary {
    fn from(doc: &Document) -> Self {
        Self {
            pdf_id: doc.id.clone(),
            filename: doc.filename.clone(),
            total_pages: doc.total_pages,
            total_chunks: doc.total_chunks,
            file_size: doc.file_size,
            ingested_at: doc.ingested_at,
        }
    }
}

/// Response from `GET /documents`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentSummary>,
    pub total: usize,
}

/// Response from `DELETE /documents/:pdf_id`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub pdf_id: DocumentId,
    pub chunks_deleted: usize,
    pub message: String,
}

/// Response from `POST /feedback`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub feedback_id: i64,
    pub message: String,
}
