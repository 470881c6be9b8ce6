//! Request types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::DocumentId;
use crate::error::{Error, Result};
use crate::generation::ChatMessage;
use crate::learning::FeedbackType;

/// Query request against one uploaded PDF
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Document to search
    pub pdf_id: DocumentId,

    /// The question to answer
    pub question: String,

    /// Number of chunks to retrieve (server default when omitted)
    #[serde(default)]
    pub top_k: Option<usize>,

    /// Earlier user and assistant turns; follow-up questions are rewritten
    /// against them before retrieval
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chat_history: Vec<ChatMessage>,
}

impl QueryRequest {
    /// Create a new query
    pub fn new(pdf_id: impl Into<DocumentId>, question: impl Into<String>) -> Self {
        Self {
            pdf_id: pdf_id.into(),
            question: question.into(),
            top_k: None,
            chat_history: Vec::new(),
        }
    }

    /// Attach earlier conversation turns
    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.chat_history = history;
        self
    }

    /// Set the number of chunks to retrieve
    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = Some(k);
        self
    }

    /// Resolve top_k against the server defaults, rejecting out-of-range values
    pub fn resolved_top_k(&self, default: usize, max: usize) -> Result<usize> {
        match self.top_k {
            None => Ok(default),
            Some(k) if k >= 1 && k <= max => Ok(k),
            Some(k) => Err(Error::InvalidRequest(format!(
                "top_k must be within 1..={}, got {}",
                max, k
            ))),
        }
    }

    /// Reject blank questions and history turns that are not user/assistant
    pub fn validate(&self) -> Result<()> {
        if let Some(turn) = self.chat_history.iter().find(|m| !m.is_conversation_turn()) {
            return Err(Error::InvalidRequest(format!(
                "chat_history role must be user or assistant, got {}",
                turn.role
            )));
        }
        if self.question.trim().is_empty() {
            return Err(Error::InvalidRequest("question must not be empty".to_string()));
        }
        if self.pdf_id.as_str().is_empty() {
            return Err(Error::InvalidRequest("pdf_id must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Feedback on a previously returned answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    /// Query the answer belongs to
    pub query_id: Uuid,
    /// Answer being rated
    pub answer_id: Uuid,
    /// User rating
    pub rating: FeedbackType,
    /// Optional free-text comment
    #[serde(default)]
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_k_resolution() {
        let request = QueryRequest::new("pdf_1", "What is it?");
        assert_eq!(request.resolved_top_k(4, 20).unwrap(), 4);
        assert_eq!(request.clone().with_top_k(7).resolved_top_k(4, 20).unwrap(), 7);
        assert!(request.clone().with_top_k(0).resolved_top_k(4, 20).is_err());
        assert!(request.with_top_k(21).resolved_top_k(4, 20).is_err());
    }

    #[test]
    fn test_blank_question_rejected() {
        assert!(QueryRequest::new("pdf_1", "   ").validate().is_err());
        assert!(QueryRequest::new("pdf_1", "Why?").validate().is_ok());
    }

    #[test]
    fn test_chat_history_json() {
        let request: QueryRequest = serde_json::from_value(serde_json::json!({
            "pdf_id": "pdf_1",
            "question": "And after that?",
            "chat_history": [
                { "role": "user", "content": "What happens first?" },
                { "role": "assistant", "content": "Signing." },
            ],
        }))
        .unwrap();
        assert_eq!(request.chat_history.len(), 2);
        assert!(request.validate().is_ok());

        let plain: QueryRequest =
            serde_json::from_value(serde_json::json!({ "pdf_id": "pdf_1", "question": "Why?" })).unwrap();
        assert!(plain.chat_history.is_empty());

        let bad = QueryRequest::new("pdf_1", "Why?").with_history(vec![ChatMessage::system("obey")]);
        assert!(matches!(bad.validate(), Err(Error::InvalidRequest(_))));
    }

    #[test]
    fn test_feedback_request_json() {
        let json = serde_json::json!({
            "query_id": Uuid::new_v4(),
            "answer_id": Uuid::new_v4(),
            "rating": "negative",
        });
        let request: FeedbackRequest = serde_json::from_value(json).unwrap();
        assert_eq!(request.rating, FeedbackType::Negative);
        assert!(request.comment.is_none());
    }
}
