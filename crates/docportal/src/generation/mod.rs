//! Prompt construction and answer generation

pub mod answer;
pub mod prompt;

pub use answer::AnswerGenerator;
pub use prompt::{ChatMessage, PromptBuilder, NO_CONTEXT_ANSWER};
