//! Ingestion pipeline orchestration

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::{Chunk, Document, DocumentId};

use super::chunker::TextChunker;
use super::loader::PdfLoader;

/// Load, chunk and embed an uploaded PDF
pub struct IngestPipeline {
    loader: PdfLoader,
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    embed_concurrency: usize,
}

impl IngestPipeline {
    /// Create a new ingestion pipeline
    pub fn new(config: &RagConfig, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        Ok(Self {
            loader: PdfLoader::new(&config.loader),
            chunker: TextChunker::from_config(&config.chunking)?,
            embedder,
            embed_concurrency: config.embeddings.concurrency.max(1),
        })
    }

    /// Parse and chunk a PDF without embedding it
    pub async fn prepare(&self, filename: &str, data: bytes::Bytes) -> Result<(Document, Vec<Chunk>)> {
        let file_size = data.len() as u64;
        let loaded = self.loader.load(filename, data).await?;

        let mut doc = Document::new(
            DocumentId::generate(),
            filename.to_string(),
            loaded.content_hash,
            file_size,
        );
        doc.total_pages = loaded.total_pages;

        let (joined, chunks) = self.chunker.chunk_blocks(&doc.id, &loaded.blocks);
        if chunks.is_empty() {
            return Err(Error::EmptyDocument(filename.to_string()));
        }

        doc.total_chunks = chunks.len() as u32;
        doc.total_chars = joined.text.len();

        Ok((doc, chunks))
    }

    /// Attach embeddings to every chunk. Fails as a whole if any chunk fails.
    pub async fn embed_chunks(&self, mut chunks: Vec<Chunk>) -> Result<Vec<Chunk>> {
        tracing::debug!("Embedding {} chunks with {}", chunks.len(), self.embedder.name());
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts, self.embed_concurrency).await?;

        if embeddings.len() != chunks.len() {
            return Err(Error::embedding(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        Ok(chunks)
    }
}
