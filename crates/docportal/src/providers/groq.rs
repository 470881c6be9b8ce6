//! Groq client for answer generation
//!
//! Groq serves an OpenAI-compatible chat completions API. The key is read
//! from `GROQ_API_KEY` at startup; a missing key only fails when a request is
//! actually made.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::generation::ChatMessage;

use super::llm::{send_error, LlmProvider};
use super::ollama::http_client;

/// Groq chat completions client
pub struct GroqClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    reasoning_format: Option<String>,
    timeout_secs: u64,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_format: Option<&'a str>,
    stream: bool,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl GroqClient {
    /// Create a new Groq client
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            reasoning_format: config.reasoning_format.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| Error::llm("GROQ_API_KEY is not set"))
    }

    fn request<'a>(&'a self, messages: &'a [ChatMessage]) -> CompletionRequest<'a> {
        CompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            reasoning_format: self.reasoning_format.as_deref(),
            stream: false,
        }
    }
}

#[async_trait]
impl LlmProvider for GroqClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let api_key = self.api_key()?;
        let url = format!("{}/chat/completions", self.base_url);

        tracing::info!("Generating answer with Groq model: {}", self.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&self.request(messages))
            .send()
            .await
            .map_err(|e| send_error("Groq", self.timeout_secs, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::llm(format!("Groq API error {}: {}", status, body)));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::llm(format!("Failed to parse Groq response: {}", e)))?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(Error::llm("Groq returned an empty completion"));
        }

        Ok(text)
    }

    async fn health_check(&self) -> Result<bool> {
        let Ok(api_key) = self.api_key() else {
            return Ok(false);
        };
        let url = format!("{}/models", self.base_url);

        match self.client.get(&url).bearer_auth(api_key).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "groq"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
