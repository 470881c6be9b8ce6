//! docportal: PDF question answering over a retrieval-augmented-generation pipeline
//!
//! Uploaded PDFs are parsed, split into overlapping chunks, embedded and stored
//! in a per-document vector index. Questions are answered by retrieving the
//! most similar chunks of one document and passing them to a hosted LLM.
//! A feedback store records user ratings for offline evaluation.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod learning;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use types::{
    document::{Chunk, Document, DocumentId, TextBlock},
    query::QueryRequest,
    response::{Answer, ContextChunk, QueryResponse},
};
