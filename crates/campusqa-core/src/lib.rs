//! CampusQA Core Library
//!
//! Retrieval-augmented question answering over a pre-crawled university
//! website corpus.
//!
//! # Features
//! - Exact inner-product vector index over precomputed embeddings
//! - LLM search-query narrowing, relevance filtering and excerpt extraction
//! - Word-budgeted context assembly with numbered citations
//! - Hot-swappable prompt templates with per-request overrides

pub mod config;
pub mod corpus;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod text;

pub use config::{Config, CorpusConfig, ErrorPolicy, LLMServiceConfig, PipelineSettings, StageModels};
pub use corpus::{Corpus, Document, DocumentStore, EmbeddingManifest, EmbeddingMatrix, VectorIndex};
pub use error::{CampusQaError, Error, Result};
pub use llm::{
    ChatMessage, CompletionClient, Embedder, HttpLlmClient, MetricsSnapshot, ModelConfig,
    ModelRegistry,
};
pub use pipeline::{
    Answer, BudgetReport, CandidateDocument, QueryPipeline, QueryRequest, QueryResponse,
    Retriever, FALLBACK_ANSWER, NO_RELEVANT_INFO,
};
pub use prompts::{PromptStore, PromptTemplates, TemplateUpdate};

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "campusqa";

/// Default data directory name
pub const DATA_DIR_NAME: &str = "campusqa";
