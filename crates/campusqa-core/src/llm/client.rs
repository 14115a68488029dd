//! HTTP client for OpenAI-compatible LLM services (Groq, vLLM, OpenAI, etc.)

use super::cache::{embedding_cache_key, CacheStats, LLMCache};
use super::{CompletionClient, Embedder, ModelConfig, ModelRegistry};
use crate::config::{Config, LLMServiceConfig};
use crate::error::{CampusQaError, Result};
use crate::text::truncate_chars;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const DEFAULT_EMBEDDING_DIMS: usize = 512;

/// Chat message for completion requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// API metrics for monitoring
#[derive(Debug, Default)]
struct APIMetrics {
    total_requests: AtomicU64,
    total_errors: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    total_latency_ms: AtomicU64,
}

/// Snapshot of API metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub total_errors: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_hit_rate: f64,
    pub avg_latency_ms: f64,
}

/// Completion and embedding client for an OpenAI-compatible endpoint
pub struct HttpLlmClient {
    http_client: reqwest::Client,
    config: LLMServiceConfig,
    registry: ModelRegistry,
    embedding_dimensions: usize,
    cache: Option<Arc<LLMCache>>,
    metrics: Arc<APIMetrics>,
}

impl HttpLlmClient {
    /// Create a client from service configuration and a model table
    pub fn new(config: LLMServiceConfig, registry: ModelRegistry) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(CampusQaError::Http)?;

        let embedding_dimensions = config
            .embedding_dimensions
            .unwrap_or(DEFAULT_EMBEDDING_DIMS);

        let cache = (config.cache_ttl_secs > 0)
            .then(|| Arc::new(LLMCache::with_ttl(Duration::from_secs(config.cache_ttl_secs))));

        Ok(Self {
            http_client,
            config,
            registry,
            embedding_dimensions,
            cache,
            metrics: Arc::new(APIMetrics::default()),
        })
    }

    /// Create from the full application config
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.llm_service.clone(), config.registry.clone())
    }

    /// Get current API metrics
    pub fn metrics(&self) -> MetricsSnapshot {
        let total = self.metrics.total_requests.load(Ordering::Relaxed);
        let hits = self.metrics.cache_hits.load(Ordering::Relaxed);
        let misses = self.metrics.cache_misses.load(Ordering::Relaxed);

        MetricsSnapshot {
            total_requests: total,
            total_errors: self.metrics.total_errors.load(Ordering::Relaxed),
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate: if hits + misses > 0 {
                hits as f64 / (hits + misses) as f64 * 100.0
            } else {
                0.0
            },
            avg_latency_ms: if total > 0 {
                self.metrics.total_latency_ms.load(Ordering::Relaxed) as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    /// Embedding cache statistics (all zero when caching is disabled)
    pub fn cache_stats(&self) -> CacheStats {
        self.cache
            .as_ref()
            .map(|c| c.stats())
            .unwrap_or_default()
    }

    /// Remove expired cache entries
    pub fn prune_cache(&self) -> usize {
        self.cache.as_ref().map(|c| c.cleanup()).unwrap_or(0)
    }

    /// Send a chat completion to an already-resolved model.
    ///
    /// Completions always reach the backend; only embeddings are cached.
    pub async fn chat_completion(
        &self,
        model: &ModelConfig,
        messages: Vec<ChatMessage>,
    ) -> Result<String> {
        let start = Instant::now();
        self.metrics.total_requests.fetch_add(1, Ordering::Relaxed);

        #[derive(Serialize)]
        struct ChatRequest<'a> {
            model: &'a str,
            messages: Vec<ChatMessage>,
            temperature: f32,
            max_tokens: u32,
        }

        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<ChatChoice>,
        }

        #[derive(Deserialize)]
        struct ChatChoice {
            message: ChatMessage,
        }

        let request = ChatRequest {
            model: &model.id,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_output_tokens,
        };

        let url = format!("{}/v1/chat/completions", self.config.url);
        let mut req = self.http_client.post(&url).json(&request);

        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req.send().await.map_err(|e| self.record_error(e.into()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(self.record_error(CampusQaError::ExternalError(format!(
                "LLM service error (HTTP {}): {}",
                status, body
            ))));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| self.record_error(e.into()))?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                self.record_error(CampusQaError::Llm("No response from LLM".to_string()))
            })?;

        let elapsed = start.elapsed().as_millis() as u64;
        self.metrics
            .total_latency_ms
            .fetch_add(elapsed, Ordering::Relaxed);

        Ok(content)
    }

    /// Embed texts in parallel with multiple concurrent batches
    ///
    /// Output order matches input order regardless of batch completion order.
    pub async fn embed_batch_parallel(
        &self,
        texts: &[String],
        batch_size: usize,
        max_concurrent: usize,
    ) -> Result<Vec<Vec<f32>>> {
        const DEFAULT_BATCH_SIZE: usize = 32;
        const DEFAULT_CONCURRENT: usize = 4;

        let chunk_size = if batch_size > 0 {
            batch_size
        } else {
            DEFAULT_BATCH_SIZE
        };
        let concurrent = if max_concurrent > 0 {
            max_concurrent
        } else {
            DEFAULT_CONCURRENT
        };

        let chunks: Vec<_> = texts.chunks(chunk_size).collect();
        let total_chunks = chunks.len();

        tracing::info!(
            "Embedding {} texts in {} batches ({} concurrent)",
            texts.len(),
            total_chunks,
            concurrent
        );

        let mut results: Vec<_> = stream::iter(chunks)
            .enumerate()
            .map(|(idx, chunk)| async move {
                tracing::debug!("Processing batch {}/{}", idx + 1, total_chunks);
                (idx, self.embed_batch(chunk).await)
            })
            .buffer_unordered(concurrent)
            .collect()
            .await;

        results.sort_by_key(|(idx, _)| *idx);

        let mut all_embeddings = Vec::with_capacity(texts.len());
        for (_, result) in results {
            all_embeddings.extend(result?);
        }

        Ok(all_embeddings)
    }

    fn record_error(&self, err: CampusQaError) -> CampusQaError {
        self.metrics.total_errors.fetch_add(1, Ordering::Relaxed);
        err
    }
}

#[async_trait]
impl CompletionClient for HttpLlmClient {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String> {
        let model = self.registry.resolve(model);
        let prompt = truncate_chars(prompt, model.token_ceiling);
        self.chat_completion(&model, vec![ChatMessage::user(prompt)])
            .await
    }
}

#[async_trait]
impl Embedder for HttpLlmClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| CampusQaError::Llm("No embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let start = Instant::now();
        self.metrics.total_requests.fetch_add(1, Ordering::Relaxed);

        let model = &self.config.embedding_model;
        let mut results: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        let mut uncached_texts = Vec::new();
        let mut uncached_indices = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            let cached = self
                .cache
                .as_ref()
                .and_then(|c| c.get(&embedding_cache_key(model, text)))
                .and_then(|json| serde_json::from_str::<Vec<f32>>(&json).ok());

            match cached {
                Some(embedding) => {
                    self.metrics.cache_hits.fetch_add(1, Ordering::Relaxed);
                    results.push(Some(embedding));
                }
                None => {
                    self.metrics.cache_misses.fetch_add(1, Ordering::Relaxed);
                    results.push(None);
                    uncached_texts.push(text.clone());
                    uncached_indices.push(i);
                }
            }
        }

        if !uncached_texts.is_empty() {
            tracing::debug!(
                "Embedding batch: {} cached, {} to fetch",
                texts.len() - uncached_texts.len(),
                uncached_texts.len()
            );

            #[derive(Serialize)]
            struct EmbedRequest<'a> {
                model: &'a str,
                input: &'a [String],
            }

            #[derive(Deserialize)]
            struct EmbedResponse {
                data: Vec<EmbedData>,
            }

            #[derive(Deserialize)]
            struct EmbedData {
                embedding: Vec<f32>,
            }

            let request = EmbedRequest {
                model,
                input: &uncached_texts,
            };

            let url = format!("{}/v1/embeddings", self.config.embeddings_url());
            let mut req = self.http_client.post(&url).json(&request);

            if let Some(ref api_key) = self.config.api_key {
                req = req.header("Authorization", format!("Bearer {}", api_key));
            }

            let response = req.send().await.map_err(|e| self.record_error(e.into()))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(self.record_error(CampusQaError::ExternalError(format!(
                    "Embedding service error (HTTP {}): {}",
                    status, body
                ))));
            }

            let embed_response: EmbedResponse = response
                .json()
                .await
                .map_err(|e| self.record_error(e.into()))?;

            if embed_response.data.len() != uncached_texts.len() {
                return Err(self.record_error(CampusQaError::Llm(format!(
                    "Embedding service returned {} vectors for {} inputs",
                    embed_response.data.len(),
                    uncached_texts.len()
                ))));
            }

            for ((original_idx, text), data) in uncached_indices
                .iter()
                .zip(uncached_texts.iter())
                .zip(embed_response.data)
            {
                if let (Some(cache), Ok(json)) = (&self.cache, serde_json::to_string(&data.embedding))
                {
                    cache.set(embedding_cache_key(model, text), json);
                }
                results[*original_idx] = Some(data.embedding);
            }
        }

        let elapsed = start.elapsed().as_millis() as u64;
        self.metrics
            .total_latency_ms
            .fetch_add(elapsed, Ordering::Relaxed);

        results
            .into_iter()
            .map(|r| r.ok_or_else(|| CampusQaError::Llm("Missing embedding".to_string())))
            .collect()
    }

    fn dimensions(&self) -> usize {
        self.embedding_dimensions
    }

    fn model_name(&self) -> &str {
        &self.config.embedding_model
    }
}
