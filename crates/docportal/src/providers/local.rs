//! Local filesystem storage for uploaded PDFs

use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::types::DocumentId;

use super::document_store::DocumentStoreProvider;

/// Local document store using filesystem
pub struct LocalDocumentStore {
    /// Directory to store documents
    storage_dir: PathBuf,
}

impl LocalDocumentStore {
    /// Create a new local document store
    pub fn new(storage_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&storage_dir)?;
        Ok(Self { storage_dir })
    }

    /// Get path for a document
    fn doc_path(&self, doc_id: &DocumentId) -> Result<PathBuf> {
        if !doc_id.is_path_safe() {
            return Err(Error::InvalidRequest(format!("invalid document id: {}", doc_id)));
        }
        Ok(self.storage_dir.join(format!("{}.pdf", doc_id)))
    }

    /// Get metadata path for a document
    fn meta_path(&self, doc_id: &DocumentId) -> Result<PathBuf> {
        Ok(self.doc_path(doc_id)?.with_extension("meta.json"))
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
struct DocumentMeta {
    id: DocumentId,
    filename: String,
    size: u64,
}

#[async_trait]
impl DocumentStoreProvider for LocalDocumentStore {
    async fn store_document(&self, doc_id: &DocumentId, filename: &str, data: &[u8]) -> Result<String> {
        let doc_path = self.doc_path(doc_id)?;
        let meta_path = self.meta_path(doc_id)?;

        tokio::fs::write(&doc_path, data).await?;

        let meta = DocumentMeta {
            id: doc_id.clone(),
            filename: filename.to_string(),
            size: data.len() as u64,
        };
        let meta_json = serde_json::to_string_pretty(&meta)?;
        tokio::fs::write(&meta_path, meta_json).await?;

        Ok(doc_path.to_string_lossy().to_string())
    }

    async fn delete_document(&self, doc_id: &DocumentId) -> Result<()> {
        for path in [self.doc_path(doc_id)?, self.meta_path(doc_id)?] {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.storage_dir.exists())
    }

    fn name(&self) -> &str {
        "local-filesystem"
    }
}
