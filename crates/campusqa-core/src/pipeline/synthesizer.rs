//! Cited answer synthesis from budgeted excerpts

use super::RunContext;
use crate::error::Result;
use crate::llm::CompletionClient;
use crate::prompts::render;
use serde::Serialize;
use std::sync::Arc;

/// An excerpt admitted under the word budget
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ExtractedExcerpt {
    pub url: String,
    pub text: String,
    pub word_count: usize,
}

/// Numbered context block: `[i] From {url}:\n{text}`, 1-indexed, blank-line separated
pub fn build_context(excerpts: &[ExtractedExcerpt]) -> String {
    excerpts
        .iter()
        .enumerate()
        .map(|(i, excerpt)| format!("[{}] From {}:\n{}", i + 1, excerpt.url, excerpt.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub struct AnswerSynthesizer {
    client: Arc<dyn CompletionClient>,
}

impl AnswerSynthesizer {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Answer `query` from `excerpts`; the model's text is returned verbatim.
    /// Citation markers are requested by the prompt but not verified.
    pub async fn answer_with_context(
        &self,
        ctx: &RunContext,
        query: &str,
        excerpts: &[ExtractedExcerpt],
    ) -> Result<String> {
        let context = build_context(excerpts);
        let prompt = render(
            &ctx.templates.answer,
            &[("context", context.as_str()), ("query", query)],
        );
        self.client.complete(&ctx.models.answer, &prompt).await
    }
}
