//! CLI argument definitions

use campusqa_core::{PromptTemplates, TemplateUpdate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "campusqa")]
#[command(
    author,
    version,
    about = "Ask questions about your university and get cited answers from its website"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "cli")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Answer a question from the corpus
    Ask(AskArgs),

    /// Show the nearest pages for a search query
    Retrieve(RetrieveArgs),

    /// Inspect or edit prompt templates
    Prompts(PromptsArgs),

    /// List available completion models
    Models,

    /// Build the embedding matrix for the corpus
    Embed(EmbedArgs),

    /// Start MCP server
    Mcp,
}

#[derive(Args)]
pub struct AskArgs {
    /// The question
    pub query: Vec<String>,

    /// Model for search query extraction
    #[arg(long)]
    pub search_model: Option<String>,

    /// Model for relevance checks
    #[arg(long)]
    pub relevance_model: Option<String>,

    /// Model for excerpt extraction
    #[arg(long)]
    pub extraction_model: Option<String>,

    /// Model for the final answer
    #[arg(long)]
    pub answer_model: Option<String>,

    /// Search query template for this question ({query})
    #[arg(long)]
    pub search_prompt: Option<String>,

    /// Relevance template for this question ({query}, {content})
    #[arg(long)]
    pub relevance_prompt: Option<String>,

    /// Extraction template for this question ({query}, {content})
    #[arg(long)]
    pub extraction_prompt: Option<String>,

    /// Answer template for this question ({context}, {query})
    #[arg(long)]
    pub answer_prompt: Option<String>,
}

#[derive(Args)]
pub struct RetrieveArgs {
    /// Search query
    pub query: Vec<String>,

    /// Number of results
    #[arg(short = 'n', default_value = "10")]
    pub limit: usize,

    /// Show page content
    #[arg(long)]
    pub full: bool,
}

#[derive(Args)]
pub struct PromptsArgs {
    #[command(subcommand)]
    pub action: PromptsAction,
}

#[derive(Subcommand)]
pub enum PromptsAction {
    /// Print templates (all, or one by name)
    Show { name: Option<TemplateName> },
    /// Replace one template
    Set {
        name: TemplateName,
        /// Template text
        text: Option<String>,
        /// Read template text from a file
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
    },
    /// Restore defaults (all, or one by name)
    Reset { name: Option<TemplateName> },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TemplateName {
    SearchQuery,
    Relevance,
    Extraction,
    Answer,
}

impl TemplateName {
    pub const ALL: [TemplateName; 4] = [
        Self::SearchQuery,
        Self::Relevance,
        Self::Extraction,
        Self::Answer,
    ];

    /// Key used in the prompts file and on the wire
    pub fn key(self) -> &'static str {
        match self {
            Self::SearchQuery => "extract_query_prompt",
            Self::Relevance => "relevance_prompt",
            Self::Extraction => "extract_info_prompt",
            Self::Answer => "answer_prompt",
        }
    }

    pub fn get(self, templates: &PromptTemplates) -> &str {
        match self {
            Self::SearchQuery => &templates.search_query,
            Self::Relevance => &templates.relevance,
            Self::Extraction => &templates.extraction,
            Self::Answer => &templates.answer,
        }
    }

    pub fn update(self, text: String) -> TemplateUpdate {
        let mut update = TemplateUpdate::default();
        match self {
            Self::SearchQuery => update.search_query = Some(text),
            Self::Relevance => update.relevance = Some(text),
            Self::Extraction => update.extraction = Some(text),
            Self::Answer => update.answer = Some(text),
        }
        update
    }
}

#[derive(Args)]
pub struct EmbedArgs {
    /// Texts per embedding request
    #[arg(long, default_value = "32")]
    pub batch_size: usize,

    /// Embedding requests in flight
    #[arg(long, default_value = "4")]
    pub concurrency: usize,

    /// Output CSV (defaults to the configured embeddings path)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Cli,
    Json,
}
