//! In-memory vector index partitioned by document
//!
//! Each document owns one immutable partition. Partitions are published
//! whole, so readers never observe a half-indexed document. When a
//! persistence directory is configured every partition is written as JSON
//! before it becomes visible and reloaded at startup.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::{Chunk, Document, DocumentId};

use super::ScoredChunk;

/// All chunks of one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partition {
    pub document: Document,
    pub chunks: Vec<Chunk>,
}

/// Cosine similarity between two vectors. Zero vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Vector index keyed by document id
pub struct VectorIndex {
    partitions: DashMap<DocumentId, Arc<Partition>>,
    dimensions: usize,
    persist_dir: Option<PathBuf>,
}

impl VectorIndex {
    /// Create an index that lives only in memory
    pub fn in_memory(dimensions: usize) -> Self {
        Self {
            partitions: DashMap::new(),
            dimensions,
            persist_dir: None,
        }
    }

    /// Open a persistent index, loading every readable partition in `dir`
    pub fn open(dimensions: usize, dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;

        let index = Self {
            partitions: DashMap::new(),
            dimensions,
            persist_dir: Some(dir.to_path_buf()),
        };
        let loaded = index.load_persisted(dir)?;
        tracing::info!("Loaded {} indexed documents from {}", loaded, dir.display());

        Ok(index)
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn load_persisted(&self, dir: &Path) -> Result<usize> {
        let mut loaded = 0;

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().map_or(true, |e| e != "json") {
                continue;
            }

            let partition = std::fs::read_to_string(&path)
                .map_err(Error::from)
                .and_then(|text| serde_json::from_str::<Partition>(&text).map_err(Error::from))
                .and_then(|partition| {
                    self.validate(&partition.document, &partition.chunks)?;
                    Ok(partition)
                });

            match partition {
                Ok(partition) => {
                    self.partitions
                        .insert(partition.document.id.clone(), Arc::new(partition));
                    loaded += 1;
                }
                Err(e) => {
                    tracing::warn!("Skipping unreadable index file {}: {}", path.display(), e);
                }
            }
        }

        Ok(loaded)
    }

    fn validate(&self, document: &Document, chunks: &[Chunk]) -> Result<()> {
        if document.total_chunks as usize != chunks.len() {
            return Err(Error::index(format!(
                "document {} declares {} chunks but {} were given",
                document.id,
                document.total_chunks,
                chunks.len()
            )));
        }

        for (i, chunk) in chunks.iter().enumerate() {
            if chunk.document_id != document.id {
                return Err(Error::index(format!(
                    "chunk {} belongs to {}, not {}",
                    i, chunk.document_id, document.id
                )));
            }
            if chunk.position as usize != i {
                return Err(Error::index(format!(
                    "chunk at index {} has position {}",
                    i, chunk.position
                )));
            }
            if chunk.embedding.len() != self.dimensions {
                return Err(Error::index(format!(
                    "chunk {} has {} dimensions, index expects {}",
                    i,
                    chunk.embedding.len(),
                    self.dimensions
                )));
            }
        }

        Ok(())
    }

    fn partition_path(dir: &Path, id: &DocumentId) -> Result<PathBuf> {
        if !id.is_path_safe() {
            return Err(Error::index(format!("document id not usable as a file name: {}", id)));
        }
        Ok(dir.join(format!("{}.json", id)))
    }

    fn persist(dir: &Path, partition: &Partition) -> Result<()> {
        let path = Self::partition_path(dir, &partition.document.id)?;
        let tmp = path.with_extension("json.tmp");

        let json = serde_json::to_vec(partition)?;
        std::fs::write(&tmp, json)?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    /// Add a whole document. Nothing is visible unless every step succeeds.
    pub fn insert_document(&self, document: Document, chunks: Vec<Chunk>) -> Result<()> {
        self.validate(&document, &chunks)?;

        match self.partitions.entry(document.id.clone()) {
            Entry::Occupied(_) => Err(Error::index(format!(
                "document {} is already indexed",
                document.id
            ))),
            Entry::Vacant(slot) => {
                let partition = Partition { document, chunks };
                if let Some(dir) = &self.persist_dir {
                    Self::persist(dir, &partition)?;
                }
                tracing::debug!(
                    "Indexed {} chunks for {}",
                    partition.chunks.len(),
                    partition.document.id
                );
                slot.insert(Arc::new(partition));
                Ok(())
            }
        }
    }

    /// Snapshot of a document's partition
    pub fn get(&self, id: &DocumentId) -> Option<Arc<Partition>> {
        self.partitions.get(id).map(|p| Arc::clone(p.value()))
    }

    pub fn contains(&self, id: &DocumentId) -> bool {
        self.partitions.contains_key(id)
    }

    /// All indexed documents, oldest first
    pub fn documents(&self) -> Vec<Document> {
        let mut docs: Vec<Document> = self
            .partitions
            .iter()
            .map(|p| p.value().document.clone())
            .collect();
        docs.sort_by(|a, b| a.ingested_at.cmp(&b.ingested_at).then_with(|| a.id.cmp(&b.id)));
        docs
    }

    /// Remove a document and its persisted file.
    ///
    /// The file is deleted first; if that fails the document stays indexed.
    pub fn remove(&self, id: &DocumentId) -> Result<Option<Arc<Partition>>> {
        let Entry::Occupied(entry) = self.partitions.entry(id.clone()) else {
            return Ok(None);
        };

        if let Some(dir) = &self.persist_dir {
            let path = Self::partition_path(dir, id)?;
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(Some(entry.remove()))
    }

    /// Number of indexed documents
    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    /// Number of chunks across all documents
    pub fn total_chunks(&self) -> usize {
        self.partitions.iter().map(|p| p.value().chunks.len()).sum()
    }

    /// Exhaustive cosine search inside one document.
    ///
    /// Results are sorted by descending score with ties broken by ascending
    /// chunk position, then truncated to `top_k`.
    pub fn search(&self, id: &DocumentId, query: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        let partition = self
            .get(id)
            .ok_or_else(|| Error::DocumentNotFound(id.to_string()))?;

        if query.len() != self.dimensions {
            return Err(Error::embedding(format!(
                "query has {} dimensions, index expects {}",
                query.len(),
                self.dimensions
            )));
        }

        let mut scored: Vec<(usize, f32)> = partition
            .chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| (i, cosine_similarity(query, &chunk.embedding)))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                chunk: partition.chunks[i].without_embedding(),
                score,
            })
            .collect())
    }
}
