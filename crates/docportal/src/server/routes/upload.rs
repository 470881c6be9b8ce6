//! PDF upload endpoint

use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{Chunk, Document, UploadResponse};

/// Take the uploaded file from the form: the first field carrying a filename,
/// or a field named `file`
async fn read_file_field(multipart: &mut Multipart) -> Result<(String, Bytes)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidRequest(format!("Failed to read multipart field: {}", e)))?
    {
        let is_file = field.file_name().is_some() || field.name() == Some("file");
        if !is_file {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "upload.pdf".to_string());

        let data = field
            .bytes()
            .await
            .map_err(|e| Error::InvalidRequest(format!("Failed to read file: {}", e)))?;

        return Ok((filename, data));
    }

    Err(Error::InvalidRequest("multipart form has no file field".to_string()))
}

/// Embed and publish a prepared document
async fn index_document(state: &AppState, doc: &Document, chunks: Vec<Chunk>) -> Result<()> {
    let chunks = state.pipeline().embed_chunks(chunks).await?;

    let index = Arc::clone(state.index());
    let doc = doc.clone();
    tokio::task::spawn_blocking(move || index.insert_document(doc, chunks))
        .await
        .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
}

/// POST /upload_pdf - Upload, chunk, embed and index one PDF
pub async fn upload_pdf(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let start = Instant::now();
    let (filename, data) = read_file_field(&mut multipart).await?;

    tracing::info!("Processing upload: {} ({} bytes)", filename, data.len());

    let (doc, chunks) = state.pipeline().prepare(&filename, data.clone()).await?;

    let stored = match state.uploads() {
        Some(store) => {
            store.store_document(&doc.id, &filename, &data).await?;
            true
        }
        None => false,
    };

    if let Err(e) = index_document(&state, &doc, chunks).await {
        if stored {
            if let Some(store) = state.uploads() {
                if let Err(cleanup) = store.delete_document(&doc.id).await {
                    tracing::warn!("Failed to remove upload {}: {}", doc.id, cleanup);
                }
            }
        }
        return Err(e);
    }

    tracing::info!(
        "Indexed {} as {} ({} chunks) in {:.1}s",
        filename,
        doc.id,
        doc.total_chunks,
        start.elapsed().as_secs_f64()
    );

    Ok(Json(UploadResponse::from(&doc)))
}
