//! Prompt templates for grounded question answering

use serde::{Deserialize, Serialize};

use crate::types::ContextChunk;

/// Answer returned when retrieval produced no passages
pub const NO_CONTEXT_ANSWER: &str = "I could not find relevant information in this document to answer the question.";

const SYSTEM_PROMPT: &str = r#"You are an assistant answering questions about a single uploaded PDF.

Rules:
1. Use ONLY the numbered context passages provided by the user message.
2. If the passages do not contain the answer, reply exactly: "I don't know based on the provided document."
3. Do not use outside knowledge or guess.
4. Keep the answer concise. Cite passages inline as [1], [2] where helpful."#;

const CONDENSE_PROMPT: &str = "Given the conversation so far and the latest user question, \
rewrite the question so it can be understood without the conversation. Do not answer it. \
If it is already standalone, return it unchanged. Reply with the question only.";

/// One chat message (OpenAI / Ollama wire shape)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }

    /// Only user and assistant turns may be replayed as history
    pub fn is_conversation_turn(&self) -> bool {
        self.role == "user" || self.role == "assistant"
    }
}

/// Builds the messages sent to the LLM for a question
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    max_context_chars: usize,
}

impl PromptBuilder {
    pub fn new(max_context_chars: usize) -> Self {
        Self { max_context_chars }
    }

    /// Passages kept in rank order until the character budget is spent.
    /// The first passage is always kept.
    pub fn select_context<'a>(&self, context: &'a [ContextChunk]) -> &'a [ContextChunk] {
        let mut used = 0usize;
        let mut count = 0usize;

        for chunk in context {
            if count > 0 && used + chunk.text.len() > self.max_context_chars {
                break;
            }
            used += chunk.text.len();
            count += 1;
        }

        &context[..count]
    }

    /// Format numbered passages, with page numbers when known
    pub fn format_context(context: &[ContextChunk]) -> String {
        let mut out = String::new();

        for (i, chunk) in context.iter().enumerate() {
            match chunk.page_number {
                Some(page) => out.push_str(&format!("[{}] (page {})\n", i + 1, page)),
                None => out.push_str(&format!("[{}]\n", i + 1)),
            }
            out.push_str(chunk.text.trim());
            out.push_str("\n\n");
        }

        out
    }

    /// Deterministic messages for `question` over already-selected context.
    /// Earlier turns sit between the system prompt and the question.
    pub fn build(
        &self,
        question: &str,
        context: &[ContextChunk],
        history: &[ChatMessage],
    ) -> Vec<ChatMessage> {
        let user = format!(
            "Context passages:\n\n{}Question: {}\n\nAnswer:",
            Self::format_context(context),
            question.trim()
        );

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(SYSTEM_PROMPT));
        messages.extend_from_slice(history);
        messages.push(ChatMessage::user(user));
        messages
    }

    /// Messages asking the LLM to turn a follow-up into a standalone question
    pub fn condense(&self, question: &str, history: &[ChatMessage]) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(CONDENSE_PROMPT));
        messages.extend_from_slice(history);
        messages.push(ChatMessage::user(question.trim()));
        messages
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(12_000)
    }
}
