//! Embedding provider trait for generating text embeddings

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};

use crate::error::{Error, Result};

/// Trait for generating text embeddings
///
/// Implementations:
/// - `OllamaEmbedder`: Local Ollama server (all-minilm, nomic-embed-text)
/// - `HashEmbedder`: Offline feature hashing, no model required
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, preserving input order.
    ///
    /// Default implementation runs up to `concurrency` `embed` calls at once
    /// and stops at the first failure.
    async fn embed_batch(&self, texts: &[String], concurrency: usize) -> Result<Vec<Vec<f32>>> {
        let requests: Vec<_> = texts.iter().map(|text| self.embed(text)).collect();
        stream::iter(requests)
            .buffered(concurrency.max(1))
            .try_collect()
            .await
    }

    /// Embedding dimensions (e.g., 384 for all-minilm)
    fn dimensions(&self) -> usize;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// Reject vectors whose length differs from the configured dimension
pub fn ensure_dimensions(expected: usize, embedding: Vec<f32>) -> Result<Vec<f32>> {
    if embedding.len() != expected {
        return Err(Error::embedding(format!(
            "expected {} dimensions, got {}",
            expected,
            embedding.len()
        )));
    }
    Ok(embedding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct LengthEmbedder {
        calls: AtomicUsize,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl EmbeddingProvider for LengthEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on == Some(text) {
                return Err(Error::embedding("boom"));
            }
            Ok(vec![text.len() as f32])
        }

        fn dimensions(&self) -> usize {
            1
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "length"
        }
    }

    #[tokio::test]
    async fn test_embed_batch_preserves_order() {
        let embedder = LengthEmbedder {
            calls: AtomicUsize::new(0),
            fail_on: None,
        };
        let texts: Vec<String> = ["a", "bbb", "cc", "dddd"].iter().map(|s| s.to_string()).collect();
        let vectors = embedder.embed_batch(&texts, 3).await.unwrap();
        assert_eq!(vectors, vec![vec![1.0], vec![3.0], vec![2.0], vec![4.0]]);
    }

    #[tokio::test]
    async fn test_embed_batch_fails_as_a_whole() {
        let embedder = LengthEmbedder {
            calls: AtomicUsize::new(0),
            fail_on: Some("bad"),
        };
        let texts: Vec<String> = ["ok", "bad", "fine"].iter().map(|s| s.to_string()).collect();
        assert!(matches!(
            embedder.embed_batch(&texts, 1).await,
            Err(Error::Embedding(_))
        ));
    }

    #[test]
    fn test_ensure_dimensions() {
        assert!(ensure_dimensions(3, vec![0.0; 3]).is_ok());
        assert!(matches!(
            ensure_dimensions(3, vec![0.0; 2]),
            Err(Error::Embedding(_))
        ));
    }
}
