//! LLM integration
//!
//! Provides traits and an OpenAI-compatible HTTP implementation for:
//! - Prompt completion (search query narrowing, relevance, extraction, answers)
//! - Query embedding

mod cache;
mod client;
mod models;
mod traits;

pub use cache::CacheStats;
pub use client::{ChatMessage, HttpLlmClient, MetricsSnapshot};
pub use models::{ModelConfig, ModelRegistry};
pub use traits::*;
