//! Configuration management

use crate::error::Result;
use crate::llm::ModelRegistry;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// LLM service configuration
    #[serde(default)]
    pub llm_service: LLMServiceConfig,

    /// Model used by each pipeline stage
    #[serde(default)]
    pub models: StageModels,

    /// Known models and their prompt ceilings
    #[serde(default)]
    pub registry: ModelRegistry,

    /// Location of the crawled corpus and its embeddings
    #[serde(default)]
    pub corpus: CorpusConfig,

    /// Retrieval and budgeting limits
    #[serde(default)]
    pub pipeline: PipelineSettings,
}

/// LLM service configuration for external inference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMServiceConfig {
    /// Base URL of the OpenAI-compatible chat completions service
    pub url: String,

    /// API key (optional, for authenticated services)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Sampling temperature for every completion
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens generated per completion
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Embedding cache TTL in seconds (0 disables caching); completions are never cached
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Base URL for embeddings service (can be different from LLM URL)
    #[serde(default)]
    pub embedding_url: Option<String>,

    /// Model name for embeddings, must match the model that built the matrix
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Embedding dimensions
    #[serde(default)]
    pub embedding_dimensions: Option<usize>,
}

impl LLMServiceConfig {
    /// Get the embeddings URL (falls back to main URL if not specified)
    pub fn embeddings_url(&self) -> &str {
        self.embedding_url.as_deref().unwrap_or(&self.url)
    }
}

impl Default for LLMServiceConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("CAMPUSQA_LLM_URL")
                .unwrap_or_else(|_| "https://api.groq.com/openai".to_string()),
            api_key: std::env::var("CAMPUSQA_LLM_API_KEY")
                .or_else(|_| std::env::var("GROQ_API_KEY"))
                .ok(),
            timeout_secs: default_timeout(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            cache_ttl_secs: default_cache_ttl(),
            embedding_url: std::env::var("CAMPUSQA_EMBEDDING_URL").ok(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: std::env::var("CAMPUSQA_EMBEDDING_DIMS")
                .ok()
                .and_then(|s| s.parse().ok()),
        }
    }
}

fn default_timeout() -> u64 {
    10
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_output_tokens() -> u32 {
    1000
}

fn default_cache_ttl() -> u64 {
    3600
}

fn default_embedding_model() -> String {
    std::env::var("CAMPUSQA_EMBEDDING_MODEL").unwrap_or_else(|_| {
        "sentence-transformers/distiluse-base-multilingual-cased-v1".to_string()
    })
}

/// Model identifier per pipeline stage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageModels {
    #[serde(default = "default_search_model")]
    pub search: String,
    #[serde(default = "default_judge_model")]
    pub relevance: String,
    #[serde(default = "default_judge_model")]
    pub extraction: String,
    #[serde(default = "default_judge_model")]
    pub answer: String,
}

impl Default for StageModels {
    fn default() -> Self {
        Self {
            search: default_search_model(),
            relevance: default_judge_model(),
            extraction: default_judge_model(),
            answer: default_judge_model(),
        }
    }
}

fn default_search_model() -> String {
    "llama-3.1-8b-instant".to_string()
}

fn default_judge_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

/// Corpus file locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// JSON array of `{ "URL", "content" }` records produced by the crawler
    pub documents: PathBuf,

    /// CSV embedding matrix keyed by a `URL` column
    pub embeddings: PathBuf,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::DATA_DIR_NAME);
        Self {
            documents: std::env::var("CAMPUSQA_DOCUMENTS")
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join("documents.json")),
            embeddings: std::env::var("CAMPUSQA_EMBEDDINGS")
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join("embeddings.csv")),
        }
    }
}

/// What a stage does when its backend call fails
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Fail the whole query
    Abort,
    /// Degrade: drop the item (or fall back to the raw query) and continue
    Drop,
}

/// Per-stage failure handling. Final answer synthesis always aborts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StagePolicies {
    #[serde(default = "abort")]
    pub search_query: ErrorPolicy,
    #[serde(default = "drop_item")]
    pub relevance: ErrorPolicy,
    #[serde(default = "abort")]
    pub extraction: ErrorPolicy,
}

impl Default for StagePolicies {
    fn default() -> Self {
        Self {
            search_query: abort(),
            relevance: drop_item(),
            extraction: abort(),
        }
    }
}

fn abort() -> ErrorPolicy {
    ErrorPolicy::Abort
}

fn drop_item() -> ErrorPolicy {
    ErrorPolicy::Drop
}

/// Retrieval and budgeting limits for the answer pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Candidates requested from the vector index
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Word budget for the excerpts fed into answer synthesis
    #[serde(default = "default_max_words")]
    pub max_words: usize,

    /// Simultaneous relevance checks
    #[serde(default = "default_relevance_concurrency")]
    pub relevance_concurrency: usize,

    /// Content prefix (chars) shown to the relevance judge
    #[serde(default = "default_relevance_content_chars")]
    pub relevance_content_chars: usize,

    /// Content prefix (chars) shown to the extractor
    #[serde(default = "default_extraction_content_chars")]
    pub extraction_content_chars: usize,

    /// Ceiling (chars) for rendered relevance and extraction prompts
    #[serde(default = "default_prompt_char_ceiling")]
    pub prompt_char_ceiling: usize,

    #[serde(default)]
    pub policies: StagePolicies,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_words: default_max_words(),
            relevance_concurrency: default_relevance_concurrency(),
            relevance_content_chars: default_relevance_content_chars(),
            extraction_content_chars: default_extraction_content_chars(),
            prompt_char_ceiling: default_prompt_char_ceiling(),
            policies: StagePolicies::default(),
        }
    }
}

fn default_top_k() -> usize {
    10
}

fn default_max_words() -> usize {
    3800
}

fn default_relevance_concurrency() -> usize {
    5
}

fn default_relevance_content_chars() -> usize {
    1000
}

fn default_extraction_content_chars() -> usize {
    4000
}

fn default_prompt_char_ceiling() -> usize {
    5000
}

impl Config {
    /// Load config from `CAMPUSQA_CONFIG` or the default path
    pub fn load() -> Result<Self> {
        let path = std::env::var("CAMPUSQA_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_path());
        Self::load_from(&path)
    }

    /// Load config from a specific path; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            tracing::debug!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to a path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.yml")
    }

    /// Default location of persisted prompt templates
    pub fn default_prompts_path() -> PathBuf {
        std::env::var("CAMPUSQA_PROMPTS")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::config_dir().join("prompts.yml"))
    }

    fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
    }
}
