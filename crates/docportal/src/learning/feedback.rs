//! Feedback and query log types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;
use crate::types::{Answer, ContextChunk, DocumentId};

/// Type of feedback
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackType {
    /// Answer was helpful
    Positive,
    /// Answer was neutral/okay
    Neutral,
    /// Answer was not helpful
    Negative,
}

impl FeedbackType {
    pub fn to_score(&self) -> i32 {
        match self {
            FeedbackType::Positive => 1,
            FeedbackType::Neutral => 0,
            FeedbackType::Negative => -1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackType::Positive => "positive",
            FeedbackType::Neutral => "neutral",
            FeedbackType::Negative => "negative",
        }
    }
}

impl fmt::Display for FeedbackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedbackType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(FeedbackType::Positive),
            "neutral" => Ok(FeedbackType::Neutral),
            "negative" => Ok(FeedbackType::Negative),
            other => Err(Error::InvalidRequest(format!("unknown rating: {}", other))),
        }
    }
}

/// One answered query, as logged for evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryLogEntry {
    pub query_id: Uuid,
    pub answer_id: Uuid,
    pub document_id: DocumentId,
    pub question: String,
    pub answer: String,
    /// Context chunks the answer was conditioned on
    pub context: Vec<ContextChunk>,
    /// LLM round-trip latency
    pub latency_ms: u64,
    pub created_at: DateTime<Utc>,
}

impl QueryLogEntry {
    pub fn new(query_id: Uuid, document_id: DocumentId, question: &str, answer: &Answer) -> Self {
        Self {
            query_id,
            answer_id: answer.id,
            document_id,
            question: question.to_string(),
            answer: answer.text.clone(),
            context: answer.context.clone(),
            latency_ms: answer.latency_ms,
            created_at: Utc::now(),
        }
    }
}

/// A stored user rating
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: i64,
    pub query_id: Uuid,
    pub answer_id: Uuid,
    pub rating: FeedbackType,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}
