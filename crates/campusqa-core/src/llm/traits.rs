//! LLM trait definitions

use crate::error::Result;
use async_trait::async_trait;

/// Prompt-in, text-out completion backend
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Complete `prompt` with `model`; unknown models fall back to the default
    async fn complete(&self, model: &str, prompt: &str) -> Result<String>;
}

/// Embedding generation trait
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate embedding for single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for batch of texts
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Get model name
    fn model_name(&self) -> &str;
}
