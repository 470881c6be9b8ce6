//! Document management endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{DeleteResponse, DocumentId, DocumentListResponse, DocumentSummary};

/// GET /documents - List all indexed documents
pub async fn list_documents(State(state): State<AppState>) -> Json<DocumentListResponse> {
    let documents: Vec<DocumentSummary> = state
        .index()
        .documents()
        .iter()
        .map(DocumentSummary::from)
        .collect();
    let total = documents.len();

    Json(DocumentListResponse { documents, total })
}

/// GET /documents/:pdf_id - Get a specific document
pub async fn get_document(
    State(state): State<AppState>,
    Path(pdf_id): Path<String>,
) -> Result<Json<DocumentSummary>> {
    let id = DocumentId::from(pdf_id);
    let partition = state
        .index()
        .get(&id)
        .ok_or_else(|| Error::DocumentNotFound(id.to_string()))?;

    Ok(Json(DocumentSummary::from(&partition.document)))
}

/// DELETE /documents/:pdf_id - Remove a document, its chunks and its upload
pub async fn delete_document(
    State(state): State<AppState>,
    Path(pdf_id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let id = DocumentId::from(pdf_id);

    let index = Arc::clone(state.index());
    let remove_id = id.clone();
    let partition = tokio::task::spawn_blocking(move || index.remove(&remove_id))
        .await
        .map_err(|e| Error::Internal(format!("Task join error: {}", e)))??
        .ok_or_else(|| Error::DocumentNotFound(id.to_string()))?;

    // The document is already gone from the index; a leftover upload is
    // only worth a warning
    if let Some(store) = state.uploads() {
        if let Err(e) = store.delete_document(&id).await {
            tracing::warn!("Failed to remove stored upload for {}: {}", id, e);
        }
    }

    tracing::info!(
        "Deleted document '{}' ({}) and {} chunks",
        partition.document.filename,
        id,
        partition.chunks.len()
    );

    Ok(Json(DeleteResponse {
        pdf_id: id,
        chunks_deleted: partition.chunks.len(),
        message: format!("Deleted {}", partition.document.filename),
    }))
}
