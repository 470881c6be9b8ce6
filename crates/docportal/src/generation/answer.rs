//! Answer generation over retrieved context

use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::providers::LlmProvider;
use crate::retrieval::ScoredChunk;
use crate::types::{Answer, ContextChunk};

use super::prompt::{ChatMessage, PromptBuilder, NO_CONTEXT_ANSWER};

/// Calls the LLM under a timeout: once per question, plus once to rewrite
/// follow-up questions when there is conversation history
pub struct AnswerGenerator {
    llm: Arc<dyn LlmProvider>,
    prompt: PromptBuilder,
    timeout: Duration,
}

impl AnswerGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>, config: &LlmConfig) -> Self {
        Self {
            llm,
            prompt: PromptBuilder::new(config.max_context_chars),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Override the call timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.llm
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        tokio::time::timeout(self.timeout, self.llm.complete(messages))
            .await
            .map_err(|_| Error::LlmTimeout(self.timeout.as_secs()))?
    }

    /// Question to search with. Without history this is the question itself;
    /// otherwise the LLM rewrites it to stand on its own.
    pub async fn standalone_question(&self, question: &str, history: &[ChatMessage]) -> Result<String> {
        if history.is_empty() {
            return Ok(question.trim().to_string());
        }

        let rewritten = self.complete(&self.prompt.condense(question, history)).await?;
        let rewritten = rewritten.trim();
        if rewritten.is_empty() {
            return Ok(question.trim().to_string());
        }

        tracing::debug!("Rewrote \"{}\" as \"{}\"", question, rewritten);
        Ok(rewritten.to_string())
    }

    /// Answer `question` from ranked retrieval results
    pub async fn generate(
        &self,
        question: &str,
        history: &[ChatMessage],
        results: &[ScoredChunk],
    ) -> Result<Answer> {
        let ranked: Vec<ContextChunk> = results.iter().map(ContextChunk::from).collect();
        let context = self.prompt.select_context(&ranked).to_vec();

        if context.is_empty() {
            return Ok(Answer {
                id: Uuid::new_v4(),
                text: NO_CONTEXT_ANSWER.to_string(),
                context,
                latency_ms: 0,
            });
        }

        let messages = self.prompt.build(question, &context, history);

        let start = Instant::now();
        let text = self.complete(&messages).await?;
        let latency_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            "{} ({}) answered in {}ms using {} passages",
            self.llm.name(),
            self.llm.model(),
            latency_ms,
            context.len()
        );

        Ok(Answer {
            id: Uuid::new_v4(),
            text,
            context,
            latency_ms,
        })
    }
}
