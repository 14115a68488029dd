//! Query-focused excerpt extraction from a relevant document

use super::{CandidateDocument, RunContext};
use crate::config::PipelineSettings;
use crate::error::Result;
use crate::llm::CompletionClient;
use crate::prompts::render;
use crate::text::truncate_chars;
use std::sync::Arc;

/// Sentinel the extraction prompt asks the model to emit when nothing applies
pub const NO_RELEVANT_INFO: &str = "NO_RELEVANT_INFO";

/// Outcome of one extraction call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Found(String),
    NoRelevantInfo,
}

pub struct InfoExtractor {
    client: Arc<dyn CompletionClient>,
    content_chars: usize,
    prompt_ceiling: usize,
}

impl InfoExtractor {
    pub fn new(client: Arc<dyn CompletionClient>, settings: &PipelineSettings) -> Self {
        Self {
            client,
            content_chars: settings.extraction_content_chars,
            prompt_ceiling: settings.prompt_char_ceiling,
        }
    }

    pub async fn extract_relevant_info(
        &self,
        ctx: &RunContext,
        query: &str,
        document: &CandidateDocument,
    ) -> Result<Extraction> {
        let prompt = render(
            &ctx.templates.extraction,
            &[
                ("query", query),
                ("content", truncate_chars(&document.content, self.content_chars)),
            ],
        );
        let prompt = truncate_chars(&prompt, self.prompt_ceiling);
        let response = self.client.complete(&ctx.models.extraction, prompt).await?;
        Ok(classify(&response))
    }
}

fn classify(response: &str) -> Extraction {
    let trimmed = response.trim();
    if trimmed.is_empty() || trimmed == NO_RELEVANT_INFO {
        Extraction::NoRelevantInfo
    } else {
        Extraction::Found(trimmed.to_string())
    }
}
