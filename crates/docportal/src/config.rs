//! Configuration for the document portal

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "docportal.toml";

/// Main portal configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// LLM configuration
    pub llm: LlmConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// PDF loader configuration
    pub loader: LoaderConfig,
    /// On-disk storage configuration
    pub storage: StorageConfig,
    /// Offline evaluation configuration
    pub evaluation: EvaluationConfig,
}

impl RagConfig {
    /// Load configuration from `.env`, an optional TOML file and the environment.
    ///
    /// The file is taken from `DOCPORTAL_CONFIG`, falling back to
    /// `./docportal.toml` when it exists.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let explicit = std::env::var("DOCPORTAL_CONFIG").ok().map(PathBuf::from);
        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }

    /// Apply environment variable overrides
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("GROQ_API_KEY") {
            if !key.trim().is_empty() {
                self.llm.api_key = Some(key);
            }
        }
        if let Ok(host) = std::env::var("DOCPORTAL_HOST") {
            self.server.host = host;
        }
        if let Some(port) = std::env::var("DOCPORTAL_PORT").ok().and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Ok(dir) = std::env::var("DOCPORTAL_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Ok(model) = std::env::var("DOCPORTAL_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Ok(url) = std::env::var("DOCPORTAL_EMBED_URL") {
            self.embeddings.base_url = url;
        }
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;

        if self.embeddings.dimensions == 0 {
            return Err(Error::Config("embeddings.dimensions must be > 0".to_string()));
        }
        if self.retrieval.top_k == 0 || self.retrieval.top_k > self.retrieval.max_top_k {
            return Err(Error::Config(format!(
                "retrieval.top_k must be within 1..={}",
                self.retrieval.max_top_k
            )));
        }
        if !(0.0..=1.0).contains(&self.evaluation.relevance_threshold) {
            return Err(Error::Config(
                "evaluation.relevance_threshold must be within 0.0..=1.0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 50MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 50 * 1024 * 1024,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk size in bytes
    pub chunk_size: usize,
    /// Maximum overlap between consecutive chunks in bytes
    pub chunk_overlap: usize,
}

impl ChunkingConfig {
    /// Overlap must leave room for new text in every chunk
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Config("chunking.chunk_size must be > 0".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Embedding backend selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Ollama embeddings endpoint
    #[default]
    Ollama,
    /// Offline feature-hashing embedder
    Hash,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Backend provider
    pub backend: EmbeddingBackend,
    /// Embedding service base URL
    pub base_url: String,
    /// Model name (default: all-minilm)
    pub model: String,
    /// Embedding dimensions (384 for MiniLM)
    pub dimensions: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Concurrent embedding requests per upload
    pub concurrency: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Ollama,
            base_url: "http://localhost:11434".to_string(),
            model: "all-minilm".to_string(),
            dimensions: 384,
            timeout_secs: 60,
            concurrency: 4,
        }
    }
}

/// LLM backend selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// Groq hosted API (OpenAI-compatible)
    #[default]
    Groq,
    /// Local Ollama server
    Ollama,
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Backend provider
    pub backend: LlmBackend,
    /// API base URL
    pub base_url: String,
    /// Generation model name
    pub model: String,
    /// API key, read from GROQ_API_KEY
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Temperature for generation
    pub temperature: f32,
    /// Maximum tokens to generate (provider default when unset)
    pub max_tokens: Option<u32>,
    /// Groq reasoning output format for reasoning models
    pub reasoning_format: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Upper bound on context characters placed in the prompt
    pub max_context_chars: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::Groq,
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "openai/gpt-oss-20b".to_string(),
            api_key: None,
            temperature: 0.0,
            max_tokens: None,
            reasoning_format: None,
            timeout_secs: 60,
            max_context_chars: 12_000,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Chunks retrieved when the request does not specify top_k
    pub top_k: usize,
    /// Largest top_k a request may ask for
    pub max_top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            max_top_k: 20,
        }
    }
}

/// PDF loader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Timeout for the primary text extractor in seconds
    pub extract_timeout_secs: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            extract_timeout_secs: 60,
        }
    }
}

/// On-disk storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root data directory
    pub data_dir: PathBuf,
    /// Persist index partitions so they survive restarts
    pub persist_index: bool,
    /// Keep uploaded PDFs on disk
    pub keep_uploads: bool,
}

impl StorageConfig {
    /// Directory holding uploaded PDFs
    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("pdf")
    }

    /// Directory holding persisted index partitions
    pub fn index_dir(&self) -> PathBuf {
        self.data_dir.join("vectorstores")
    }

    /// SQLite file for the query log and feedback
    pub fn feedback_db_path(&self) -> PathBuf {
        self.data_dir.join("feedback.db")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            persist_index: true,
            keep_uploads: true,
        }
    }
}

/// Offline evaluation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Minimum similarity for a retrieved chunk to count as relevant
    pub relevance_threshold: f32,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            relevance_threshold: 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RagConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.retrieval.top_k, 4);
    }

    #[test]
    fn test_partial_toml() {
        let config = RagConfig::from_toml(
            r#"
            [server]
            port = 8000

            [embeddings]
            backend = "hash"
            dimensions = 64

            [llm]
            backend = "ollama"
            base_url = "http://localhost:11434"
            model = "llama3.2:3b"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.embeddings.backend, EmbeddingBackend::Hash);
        assert_eq!(config.embeddings.dimensions, 64);
        assert_eq!(config.llm.backend, LlmBackend::Ollama);
        assert_eq!(config.chunking.chunk_size, 1000);
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        let chunking = ChunkingConfig {
            chunk_size: 100,
            chunk_overlap: 100,
        };
        assert!(matches!(chunking.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_api_key_not_serialized() {
        let mut config = RagConfig::default();
        config.llm.api_key = Some("secret".to_string());
        let text = serde_json::to_string(&config).unwrap();
        assert!(!text.contains("secret"));
    }
}
