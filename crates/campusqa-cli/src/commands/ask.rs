//! Ask command

use crate::app::{AskArgs, OutputFormat};
use crate::output;
use anyhow::Result;
use campusqa_core::{Config, PromptStore, QueryRequest};
use std::sync::Arc;

pub async fn run(
    args: AskArgs,
    config: &Config,
    prompts: Arc<PromptStore>,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let request = build_request(args);
    // Reject bad input before paying for corpus load
    request.validate()?;

    let (pipeline, client) = super::load_pipeline(config, prompts)?;
    let answer = pipeline.answer(&request).await?;

    print!("{}", output::format_answer(&answer, format));

    if verbose {
        let metrics = client.metrics();
        eprintln!(
            "LLM calls: {} ({} errors, {:.0}% cached, {:.0}ms avg, {} cache entries)",
            metrics.total_requests,
            metrics.total_errors,
            metrics.cache_hit_rate,
            metrics.avg_latency_ms,
            client.cache_stats().active_entries
        );
    }
    Ok(())
}

/// One-off model and template overrides apply to this question only
fn build_request(args: AskArgs) -> QueryRequest {
    QueryRequest {
        search_model: args.search_model,
        relevance_model: args.relevance_model,
        extraction_model: args.extraction_model,
        answer_model: args.answer_model,
        search_prompt: args.search_prompt,
        relevance_prompt: args.relevance_prompt,
        extraction_prompt: args.extraction_prompt,
        answer_prompt: args.answer_prompt,
        ..QueryRequest::new(args.query.join(" "))
    }
}
