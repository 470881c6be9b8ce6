//! Feedback collection and offline evaluation

mod evaluation;
mod feedback;
mod store;

pub use evaluation::{keywords, DocumentMetrics, EvaluationReport, Evaluator, LatencyStats};
pub use feedback::{FeedbackRecord, FeedbackType, QueryLogEntry};
pub use store::FeedbackStore;
