//! Vector index and document-scoped search

mod index;
mod search;

pub use index::{cosine_similarity, Partition, VectorIndex};
pub use search::Retriever;

use crate::types::Chunk;

/// Retrieved chunk with its similarity to the question
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// The retrieved chunk (without its embedding)
    pub chunk: Chunk,
    /// Cosine similarity, higher is better
    pub score: f32,
}
