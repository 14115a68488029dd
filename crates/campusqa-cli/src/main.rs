//! CampusQA CLI
//!
//! Cited answers to questions about a university, from its own website.

use anyhow::Result;
use campusqa_core::error::exit_codes;
use campusqa_core::{CampusQaError, Config, PromptStore, PromptTemplates};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

mod app;
mod commands;
mod output;
mod progress;

use app::{Cli, Commands};

/// Expired-response sweep while the MCP server is running
const CACHE_PRUNE_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries answers and MCP traffic
    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            let code = e
                .downcast_ref::<CampusQaError>()
                .map(CampusQaError::exit_code)
                .unwrap_or(exit_codes::GENERAL_ERROR);
            ExitCode::from(code as u8)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let prompts_path = Config::default_prompts_path();

    match cli.command {
        Commands::Ask(args) => {
            let prompts = Arc::new(PromptStore::new(PromptTemplates::load(&prompts_path)?));
            commands::ask::run(args, &config, prompts, cli.format, cli.verbose).await
        }
        Commands::Retrieve(args) => {
            let prompts = Arc::new(PromptStore::new(PromptTemplates::load(&prompts_path)?));
            commands::retrieve::run(args, &config, prompts, cli.format).await
        }
        Commands::Prompts(args) => commands::prompts::run(args, &prompts_path, cli.format),
        Commands::Models => commands::models::run(&config, cli.format),
        Commands::Embed(args) => commands::embed::run(args, &config).await,
        Commands::Mcp => {
            let prompts = Arc::new(PromptStore::new(PromptTemplates::load(&prompts_path)?));
            let (pipeline, client) = commands::load_pipeline(&config, prompts)?;
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(CACHE_PRUNE_INTERVAL);
                loop {
                    interval.tick().await;
                    let removed = client.prune_cache();
                    if removed > 0 {
                        tracing::debug!("Pruned {} expired cache entries", removed);
                    }
                }
            });
            campusqa_mcp::start_server(&pipeline, &config.registry).await
        }
    }
}
