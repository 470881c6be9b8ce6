//! LLM provider trait for generating answers

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::generation::ChatMessage;

/// Trait for chat-style LLM completion
///
/// Implementations:
/// - `GroqClient`: Groq hosted API (OpenAI-compatible chat completions)
/// - `OllamaLlm`: Local Ollama server
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete a conversation and return the assistant text
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}

/// Map a failed request to the LLM service. A client-side timeout is
/// reported as `LlmTimeout` so it surfaces as 504 like the generator's own.
pub(crate) fn send_error(provider: &str, timeout_secs: u64, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::LlmTimeout(timeout_secs)
    } else {
        Error::llm(format!("{} request failed: {}", provider, err))
    }
}
