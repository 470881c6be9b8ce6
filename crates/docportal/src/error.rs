//! Error types for the document portal

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for portal operations
pub type Result<T> = std::result::Result<T, Error>;

/// Portal errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Uploaded file is not a parseable PDF
    #[error("Invalid file '{filename}': {message}")]
    InvalidFile { filename: String, message: String },

    /// PDF parsed but yielded no text
    #[error("No extractable text in '{0}'")]
    EmptyDocument(String),

    /// Malformed request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Embedding service failure
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// LLM service failure
    #[error("LLM error: {0}")]
    Llm(String),

    /// LLM call exceeded its timeout
    #[error("LLM request timed out after {0}s")]
    LlmTimeout(u64),

    /// Unknown document identifier
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// Any other missing record (query, answer)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Vector index error
    #[error("Index error: {0}")]
    Index(String),

    /// Feedback store error
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an invalid file error
    pub fn invalid_file(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidFile {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create an index error
    pub fn index(message: impl Into<String>) -> Self {
        Self::Index(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// HTTP status and machine-readable type for this error
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            Error::InvalidFile { .. } => (StatusCode::BAD_REQUEST, "invalid_file"),
            Error::EmptyDocument(_) => (StatusCode::UNPROCESSABLE_ENTITY, "empty_document"),
            Error::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            Error::Embedding(_) => (StatusCode::BAD_GATEWAY, "embedding_error"),
            Error::Llm(_) => (StatusCode::BAD_GATEWAY, "llm_error"),
            Error::LlmTimeout(_) => (StatusCode::GATEWAY_TIMEOUT, "llm_timeout"),
            Error::DocumentNotFound(_) | Error::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Error::Index(_) => (StatusCode::INTERNAL_SERVER_ERROR, "index_error"),
            Error::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            Error::Json(_) => (StatusCode::BAD_REQUEST, "json_error"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status();

        if status.is_server_error() {
            tracing::error!("{} ({})", self, error_type);
        } else {
            tracing::warn!("{} ({})", self, error_type);
        }

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}
