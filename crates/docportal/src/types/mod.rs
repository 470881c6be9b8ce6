//! Core types for the document portal

pub mod document;
pub mod query;
pub mod response;

pub use document::{Chunk, Document, DocumentId, TextBlock};
pub use query::{FeedbackRequest, QueryRequest};
pub use response::{
    Answer, ContextChunk, DeleteResponse, DocumentListResponse, DocumentSummary,
    FeedbackResponse, QueryResponse, UploadResponse,
};
