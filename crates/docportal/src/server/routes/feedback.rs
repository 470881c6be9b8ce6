//! Answer feedback endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{FeedbackRequest, FeedbackResponse};

/// POST /feedback - Rate a previously returned answer
pub async fn submit_feedback(
    State(state): State<AppState>,
    payload: std::result::Result<Json<FeedbackRequest>, JsonRejection>,
) -> Result<Json<FeedbackResponse>> {
    let Json(request) = payload.map_err(|e| Error::InvalidRequest(e.body_text()))?;

    let store = Arc::clone(state.feedback());
    let record = tokio::task::spawn_blocking(move || store.record_feedback(&request))
        .await
        .map_err(|e| Error::Internal(format!("Task join error: {}", e)))??;

    tracing::info!(
        "Recorded {} feedback {} for query {}",
        record.rating,
        record.id,
        record.query_id
    );

    Ok(Json(FeedbackResponse {
        feedback_id: record.id,
        message: "Feedback recorded".to_string(),
    }))
}
