//! Narrow a conversational question to retrieval keywords

use super::RunContext;
use crate::error::Result;
use crate::llm::CompletionClient;
use crate::prompts::render;
use std::sync::Arc;

/// Single-completion search query extraction
pub struct SearchQueryExtractor {
    client: Arc<dyn CompletionClient>,
}

impl SearchQueryExtractor {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Search terms for `user_query`, used only as retriever input.
    ///
    /// A blank completion falls back to the user's own wording.
    pub async fn extract(&self, ctx: &RunContext, user_query: &str) -> Result<String> {
        let prompt = render(&ctx.templates.search_query, &[("query", user_query)]);
        let response = self.client.complete(&ctx.models.search, &prompt).await?;
        let extracted = response.trim();

        if extracted.is_empty() {
            tracing::warn!("Search query extraction returned nothing; using original query");
            return Ok(user_query.to_string());
        }

        tracing::info!("Extracted query: {} from: {}", extracted, user_query);
        Ok(extracted.to_string())
    }
}
