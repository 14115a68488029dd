//! Concurrent LLM relevance judgement over retrieved candidates

use super::{CandidateDocument, RunContext};
use crate::config::{ErrorPolicy, PipelineSettings};
use crate::error::Result;
use crate::llm::CompletionClient;
use crate::prompts::render;
use crate::text::truncate_chars;
use futures::stream::{self, StreamExt};
use std::sync::Arc;

/// Judges candidates with bounded concurrency
pub struct RelevanceFilter {
    client: Arc<dyn CompletionClient>,
    concurrency: usize,
    content_chars: usize,
    prompt_ceiling: usize,
    on_error: ErrorPolicy,
}

impl RelevanceFilter {
    pub fn new(client: Arc<dyn CompletionClient>, settings: &PipelineSettings) -> Self {
        Self {
            client,
            concurrency: settings.relevance_concurrency.max(1),
            content_chars: settings.relevance_content_chars,
            prompt_ceiling: settings.prompt_char_ceiling,
            on_error: settings.policies.relevance,
        }
    }

    /// Candidates the judge answered "yes" for, returned in rank order.
    ///
    /// Checks complete in arbitrary order; the survivors are re-sorted by
    /// their retrieval rank before returning. A failed check drops its
    /// candidate unless the stage policy is `Abort`.
    pub async fn batch_check_relevance(
        &self,
        ctx: &RunContext,
        query: &str,
        candidates: Vec<CandidateDocument>,
    ) -> Result<Vec<CandidateDocument>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let verdicts: Vec<_> = stream::iter(candidates)
            .map(|candidate| async move {
                let verdict = self.check_relevance(ctx, query, &candidate).await;
                (candidate, verdict)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut relevant = Vec::with_capacity(verdicts.len());
        for (candidate, verdict) in verdicts {
            match verdict {
                Ok(true) => {
                    tracing::debug!("document {} is relevant: true", candidate.url);
                    relevant.push(candidate);
                }
                Ok(false) => tracing::debug!("document {} is relevant: false", candidate.url),
                Err(e) if self.on_error == ErrorPolicy::Drop => {
                    tracing::warn!("Error checking relevance for {}: {}", candidate.url, e);
                }
                Err(e) => return Err(e),
            }
        }

        relevant.sort_by_key(|c| c.rank);
        Ok(relevant)
    }

    /// Single yes/no judgement
    pub async fn check_relevance(
        &self,
        ctx: &RunContext,
        query: &str,
        candidate: &CandidateDocument,
    ) -> Result<bool> {
        let prompt = render(
            &ctx.templates.relevance,
            &[
                ("query", query),
                ("content", truncate_chars(&candidate.content, self.content_chars)),
            ],
        );
        let prompt = truncate_chars(&prompt, self.prompt_ceiling);
        let response = self.client.complete(&ctx.models.relevance, prompt).await?;
        Ok(is_affirmative(&response))
    }
}

/// `true` iff the trimmed, lower-cased response is exactly "yes"
pub fn is_affirmative(response: &str) -> bool {
    response.trim().to_lowercase() == "yes"
}
