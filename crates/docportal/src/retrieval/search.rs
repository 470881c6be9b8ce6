//! Document-scoped retrieval

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::DocumentId;

use super::index::VectorIndex;
use super::ScoredChunk;

/// Embeds a question and searches one document's partition
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<VectorIndex>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index: Arc<VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Top-k chunks of `document_id` for `question`.
    ///
    /// Unknown documents fail before the embedder is called.
    pub async fn retrieve(
        &self,
        document_id: &DocumentId,
        question: &str,
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>> {
        if !self.index.contains(document_id) {
            return Err(Error::DocumentNotFound(document_id.to_string()));
        }

        let query_embedding = self.embedder.embed(question).await?;
        let results = self.index.search(document_id, &query_embedding, top_k)?;

        tracing::debug!(
            "Retrieved {} chunks from {} (top score {:.3})",
            results.len(),
            document_id,
            results.first().map(|r| r.score).unwrap_or(0.0)
        );

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::HashEmbedder;
    use crate::types::{Chunk, Document};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEmbedder {
        inner: HashEmbedder,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingProvider for CountingEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.embed(text).await
        }

        fn dimensions(&self) -> usize {
            self.inner.dimensions()
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn indexed(embedder: &HashEmbedder, texts: &[&str]) -> (Arc<VectorIndex>, DocumentId) {
        let index = Arc::new(VectorIndex::in_memory(embedder.dimensions()));
        let id = DocumentId::from("pdf_doc");
        let mut doc = Document::new(id.clone(), "doc.pdf".into(), "h".into(), 1);
        doc.total_chunks = texts.len() as u32;

        let chunks = texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let mut chunk = Chunk::new(id.clone(), i as u32, None, 0, text.len(), text.to_string());
                chunk.embedding = embedder.embed_text(text);
                chunk
            })
            .collect();
        index.insert_document(doc, chunks).unwrap();
        (index, id)
    }

    #[tokio::test]
    async fn test_unknown_document_skips_embedding() {
        let embedder = Arc::new(CountingEmbedder {
            inner: HashEmbedder::new(32),
            calls: AtomicUsize::new(0),
        });
        let index = Arc::new(VectorIndex::in_memory(32));
        let retriever = Retriever::new(embedder.clone(), index);

        let result = retriever
            .retrieve(&DocumentId::from("pdf_nope"), "anything", 4)
            .await;
        assert!(matches!(result, Err(Error::DocumentNotFound(_))));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_repeated_queries_are_stable() {
        let hash = HashEmbedder::new(128);
        let (index, id) = indexed(
            &hash,
            &[
                "Invoices are due within thirty days.",
                "The warranty covers parts and labour.",
                "Late invoices incur a fee.",
            ],
        );
        let retriever = Retriever::new(Arc::new(hash), index);

        let first = retriever.retrieve(&id, "when are invoices due", 2).await.unwrap();
        let second = retriever.retrieve(&id, "when are invoices due", 2).await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(first[0].chunk.position, 0);
        let positions = |r: &[ScoredChunk]| r.iter().map(|c| c.chunk.position).collect::<Vec<_>>();
        assert_eq!(positions(&first), positions(&second));
    }
}
