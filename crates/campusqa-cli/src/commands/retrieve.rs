//! Retrieve command

use crate::app::{OutputFormat, RetrieveArgs};
use crate::output;
use anyhow::Result;
use campusqa_core::{CampusQaError, Config, PromptStore};
use std::sync::Arc;

pub async fn run(
    args: RetrieveArgs,
    config: &Config,
    prompts: Arc<PromptStore>,
    format: OutputFormat,
) -> Result<()> {
    let query = args.query.join(" ");
    if query.trim().is_empty() {
        return Err(CampusQaError::InvalidInput("query must not be empty".to_string()).into());
    }

    let (pipeline, _client) = super::load_pipeline(config, prompts)?;
    let candidates = pipeline.retriever().retrieve(query.trim(), args.limit).await?;

    print!("{}", output::format_candidates(&candidates, format, args.full));
    Ok(())
}
