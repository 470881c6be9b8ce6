//! Application state for the portal server

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::generation::AnswerGenerator;
use crate::ingestion::IngestPipeline;
use crate::learning::FeedbackStore;
use crate::providers::{
    self, DocumentStoreProvider, EmbeddingProvider, LlmProvider, LocalDocumentStore,
};
use crate::retrieval::{Retriever, VectorIndex};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Per-document vector index
    index: Arc<VectorIndex>,
    /// Embedding provider (Ollama or hash)
    embedder: Arc<dyn EmbeddingProvider>,
    /// Load + chunk + embed
    pipeline: IngestPipeline,
    /// Question embedding + index search
    retriever: Retriever,
    /// Prompt + LLM call
    generator: AnswerGenerator,
    /// Query log and feedback
    feedback: Arc<FeedbackStore>,
    /// Uploaded PDFs (when kept)
    uploads: Option<Arc<dyn DocumentStoreProvider>>,
}

impl AppState {
    /// Create application state from configuration
    pub async fn new(config: RagConfig) -> Result<Self> {
        tracing::info!(
            "Initializing portal state (embeddings: {:?}, llm: {:?} {})",
            config.embeddings.backend,
            config.llm.backend,
            config.llm.model
        );

        let embedder = providers::create_embedder(&config.embeddings)?;
        let llm = providers::create_llm(&config.llm)?;

        let index = if config.storage.persist_index {
            VectorIndex::open(config.embeddings.dimensions, &config.storage.index_dir())?
        } else {
            VectorIndex::in_memory(config.embeddings.dimensions)
        };

        let feedback = FeedbackStore::new(config.storage.feedback_db_path())?;
        tracing::info!(
            "Feedback store opened at {}",
            config.storage.feedback_db_path().display()
        );

        let uploads: Option<Arc<dyn DocumentStoreProvider>> = if config.storage.keep_uploads {
            Some(Arc::new(LocalDocumentStore::new(config.storage.uploads_dir())?))
        } else {
            None
        };

        Self::assemble(config, embedder, llm, index, Arc::new(feedback), uploads)
    }

    /// State with injected providers, an in-memory index and no upload storage
    pub fn from_parts(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
        feedback: Arc<FeedbackStore>,
    ) -> Result<Self> {
        let index = VectorIndex::in_memory(embedder.dimensions());
        Self::assemble(config, embedder, llm, index, feedback, None)
    }

    fn assemble(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
        index: VectorIndex,
        feedback: Arc<FeedbackStore>,
        uploads: Option<Arc<dyn DocumentStoreProvider>>,
    ) -> Result<Self> {
        let index = Arc::new(index);
        let pipeline = IngestPipeline::new(&config, Arc::clone(&embedder))?;
        let retriever = Retriever::new(Arc::clone(&embedder), Arc::clone(&index));
        let generator = AnswerGenerator::new(llm, &config.llm);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                index,
                embedder,
                pipeline,
                retriever,
                generator,
                feedback,
                uploads,
            }),
        })
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.inner.index
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.inner.embedder
    }

    pub fn pipeline(&self) -> &IngestPipeline {
        &self.inner.pipeline
    }

    pub fn retriever(&self) -> &Retriever {
        &self.inner.retriever
    }

    pub fn generator(&self) -> &AnswerGenerator {
        &self.inner.generator
    }

    pub fn feedback(&self) -> &Arc<FeedbackStore> {
        &self.inner.feedback
    }

    pub fn uploads(&self) -> Option<&Arc<dyn DocumentStoreProvider>> {
        self.inner.uploads.as_ref()
    }
}
