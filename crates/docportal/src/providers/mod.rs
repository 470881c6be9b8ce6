//! Provider abstractions for embeddings, LLM and upload storage
//!
//! Trait-based so the server can switch between hosted (Groq), local (Ollama)
//! and offline (hash) backends from configuration.

pub mod document_store;
pub mod embedding;
pub mod groq;
pub mod hash;
pub mod llm;
pub mod local;
pub mod ollama;

use std::sync::Arc;

use crate::config::{EmbeddingBackend, EmbeddingConfig, LlmBackend, LlmConfig};
use crate::error::Result;

pub use document_store::DocumentStoreProvider;
pub use embedding::{ensure_dimensions, EmbeddingProvider};
pub use groq::GroqClient;
pub use hash::HashEmbedder;
pub use llm::LlmProvider;
pub use local::LocalDocumentStore;
pub use ollama::{OllamaEmbedder, OllamaLlm};

/// Build the configured embedding provider
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    Ok(match config.backend {
        EmbeddingBackend::Ollama => Arc::new(OllamaEmbedder::new(config)?),
        EmbeddingBackend::Hash => Arc::new(HashEmbedder::new(config.dimensions)),
    })
}

/// Build the configured LLM provider
pub fn create_llm(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>> {
    Ok(match config.backend {
        LlmBackend::Groq => Arc::new(GroqClient::new(config)?),
        LlmBackend::Ollama => Arc::new(OllamaLlm::new(config)?),
    })
}
