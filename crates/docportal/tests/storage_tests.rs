//! Router tests against on-disk stores

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::*;
use docportal::config::EmbeddingBackend;

const PAGE: &str = "Invoices are due thirty days after delivery. Late payments accrue interest.";

#[tokio::test]
async fn failed_embedding_removes_saved_upload() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = disk_config(dir.path());
    // Nothing listens here
    config.embeddings.backend = EmbeddingBackend::Ollama;
    config.embeddings.base_url = "http://127.0.0.1:1".to_string();
    config.embeddings.timeout_secs = 2;
    let uploads_dir = config.storage.uploads_dir();
    let index_dir = config.storage.index_dir();

    let app = app_from_config(config).await;
    let (status, body) = send(&app.router, multipart_request("invoice.pdf", &sample_pdf(&[PAGE]))).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY, "{}", body);
    assert_eq!(body["error"]["type"], "embedding_error");
    assert!(file_names(&uploads_dir).is_empty(), "{:?}", file_names(&uploads_dir));
    assert!(file_names(&index_dir).is_empty());
    assert!(app.state.index().is_empty());
}

#[tokio::test]
async fn indexed_documents_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = disk_config(dir.path());
    let uploads_dir = config.storage.uploads_dir();

    let id = {
        let app = app_from_config(config.clone()).await;
        let id = upload(&app.router, &[PAGE]).await;

        let stored = file_names(&uploads_dir);
        assert_eq!(stored, vec![format!("{}.meta.json", id), format!("{}.pdf", id)]);
        id
    };

    let app = app_from_config(config).await;
    let (status, doc) = send(&app.router, get_request(&format!("/documents/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["filename"], "sample.pdf");

    // Deleting clears the partition file and the stored upload
    let request = axum::http::Request::builder()
        .method(Method::DELETE)
        .uri(format!("/documents/{}", id))
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(file_names(&uploads_dir).is_empty());

    let app = app_from_config(app.state.config().clone()).await;
    let (_, list) = send(&app.router, get_request("/documents")).await;
    assert_eq!(list, json!({ "documents": [], "total": 0 }));
}
