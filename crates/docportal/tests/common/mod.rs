//! Shared helpers for router-level tests
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use docportal::config::{EmbeddingBackend, RagConfig};
use docportal::error::{Error, Result};
use docportal::generation::ChatMessage;
use docportal::learning::FeedbackStore;
use docportal::providers::{EmbeddingProvider, HashEmbedder, LlmProvider};
use docportal::server::{build_router, AppState};

pub const BOUNDARY: &str = "docportal-test-boundary";

/// LLM that replies with fixed text after an optional delay
pub struct StubLlm {
    pub reply: String,
    pub delay: Duration,
    pub calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl StubLlm {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply: "too late".to_string(),
            delay,
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl LlmProvider for StubLlm {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.calls.lock().push(messages.to_vec());
        tokio::time::sleep(self.delay).await;
        Ok(self.reply.clone())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "stub"
    }

    fn model(&self) -> &str {
        "stub-model"
    }
}

/// Embedder whose service is always down
pub struct DownEmbedder {
    pub dimensions: usize,
}

#[async_trait]
impl EmbeddingProvider for DownEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(Error::embedding("connection refused"))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(false)
    }

    fn name(&self) -> &str {
        "down"
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

pub fn test_config() -> RagConfig {
    let mut config = RagConfig::default();
    config.chunking.chunk_size = 120;
    config.chunking.chunk_overlap = 30;
    config.embeddings.backend = EmbeddingBackend::Hash;
    config.embeddings.dimensions = 128;
    config.llm.timeout_secs = 1;
    config.storage.persist_index = false;
    config.storage.keep_uploads = false;
    config
}

pub fn app_with(embedder: Arc<dyn EmbeddingProvider>, llm: Arc<dyn LlmProvider>) -> TestApp {
    let feedback = Arc::new(FeedbackStore::in_memory().expect("in-memory store"));
    let state = AppState::from_parts(test_config(), embedder, llm, feedback).expect("state");
    TestApp {
        router: build_router(state.clone()),
        state,
    }
}

pub fn app(llm: Arc<dyn LlmProvider>) -> TestApp {
    app_with(Arc::new(HashEmbedder::new(128)), llm)
}

/// Configuration with every store under `dir`, as the server binary runs
pub fn disk_config(dir: &std::path::Path) -> RagConfig {
    let mut config = test_config();
    config.storage.data_dir = dir.to_path_buf();
    config.storage.persist_index = true;
    config.storage.keep_uploads = true;
    config
}

/// State built from configuration alone
pub async fn app_from_config(config: RagConfig) -> TestApp {
    let state = AppState::new(config).await.expect("state");
    TestApp {
        router: build_router(state.clone()),
        state,
    }
}

/// File names in `dir`, sorted (empty when the directory is missing)
pub fn file_names(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().to_string())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

/// Build a PDF with one page per entry, each drawn in Courier
pub fn sample_pdf(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![50.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("save pdf");
    bytes
}

pub fn multipart_request(filename: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/upload_pdf")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .expect("request")
}

pub fn json_request(method: Method, uri: &str, value: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(value.to_string()))
        .expect("request")
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

/// Send a request and decode the JSON body (Null when empty)
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

/// Upload a PDF and return its id
pub async fn upload(router: &Router, pages: &[&str]) -> String {
    let (status, body) = send(router, multipart_request("sample.pdf", &sample_pdf(pages))).await;
    assert_eq!(status, StatusCode::OK, "upload failed: {}", body);
    body["pdf_id"].as_str().expect("pdf_id").to_string()
}
