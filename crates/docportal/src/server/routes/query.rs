//! Question answering endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::learning::QueryLogEntry;
use crate::server::state::AppState;
use crate::types::{QueryRequest, QueryResponse};

/// POST /query_pdf - Answer a question about one uploaded PDF
pub async fn query_pdf(
    State(state): State<AppState>,
    payload: std::result::Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>> {
    let Json(request) = payload.map_err(|e| Error::InvalidRequest(e.body_text()))?;
    request.validate()?;

    let retrieval = &state.config().retrieval;
    let top_k = request.resolved_top_k(retrieval.top_k, retrieval.max_top_k)?;

    tracing::info!(
        "Query on {}: \"{}\" (top_k {})",
        request.pdf_id,
        request.question,
        top_k
    );

    // Unknown documents fail before any LLM call
    if !state.index().contains(&request.pdf_id) {
        return Err(Error::DocumentNotFound(request.pdf_id.to_string()));
    }

    let search_question = state
        .generator()
        .standalone_question(&request.question, &request.chat_history)
        .await?;

    let results = state
        .retriever()
        .retrieve(&request.pdf_id, &search_question, top_k)
        .await?;

    let answer = state
        .generator()
        .generate(&request.question, &request.chat_history, &results)
        .await?;

    let query_id = Uuid::new_v4();
    let entry = QueryLogEntry::new(query_id, request.pdf_id.clone(), &request.question, &answer);
    let store = Arc::clone(state.feedback());
    match tokio::task::spawn_blocking(move || store.record_query(&entry)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!("Failed to log query {}: {}", query_id, e),
        Err(e) => tracing::error!("Query log task failed for {}: {}", query_id, e),
    }

    Ok(Json(QueryResponse::new(query_id, request.pdf_id, answer)))
}
