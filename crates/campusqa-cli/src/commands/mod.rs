//! CLI command handlers

pub mod ask;
pub mod embed;
pub mod models;
pub mod prompts;
pub mod retrieve;

use anyhow::Result;
use campusqa_core::{Config, HttpLlmClient, PromptStore, QueryPipeline};
use std::sync::Arc;

/// Load the corpus and wire the pipeline to the configured LLM service
pub fn load_pipeline(
    config: &Config,
    prompts: Arc<PromptStore>,
) -> Result<(QueryPipeline, Arc<HttpLlmClient>)> {
    let client = Arc::new(HttpLlmClient::from_config(config)?);
    let pipeline = QueryPipeline::from_config(config, client.clone(), prompts)?;
    Ok((pipeline, client))
}
