//! API routes for the portal server

pub mod documents;
pub mod feedback;
pub mod query;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Upload - with larger body limit for PDFs
        .route(
            "/upload_pdf",
            post(upload::upload_pdf).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/query_pdf", post(query::query_pdf))
        .route("/feedback", post(feedback::submit_feedback))
        // Document management
        .route("/documents", get(documents::list_documents))
        .route(
            "/documents/:pdf_id",
            get(documents::get_document).delete(documents::delete_document),
        )
}
