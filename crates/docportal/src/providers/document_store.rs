//! Document store provider trait for keeping uploaded PDFs

use async_trait::async_trait;

use crate::error::Result;
use crate::types::DocumentId;

/// Trait for raw upload storage
///
/// Implementations:
/// - `LocalDocumentStore`: Local filesystem
#[async_trait]
pub trait DocumentStoreProvider: Send + Sync {
    /// Store a document, returning its storage URI
    async fn store_document(&self, doc_id: &DocumentId, filename: &str, data: &[u8]) -> Result<String>;

    /// Delete a document. Missing documents are not an error.
    async fn delete_document(&self, doc_id: &DocumentId) -> Result<()>;

    /// Check if the provider is healthy
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
