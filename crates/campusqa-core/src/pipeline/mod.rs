//! Retrieval-augmented answer pipeline
//!
//! Stages, in order:
//! - search query narrowing (single completion)
//! - vector retrieval joined against the document store
//! - concurrent relevance judgement
//! - sequential excerpt extraction under a word budget
//! - cited answer synthesis

mod extractor;
mod query;
mod relevance;
mod request;
mod retriever;
mod search_query;
mod synthesizer;

pub use extractor::{Extraction, InfoExtractor, NO_RELEVANT_INFO};
pub use query::{Answer, BudgetReport, QueryPipeline, WordBudget};
pub use relevance::{is_affirmative, RelevanceFilter};
pub use request::{QueryRequest, QueryResponse};
pub use retriever::{CandidateDocument, Retriever};
pub use search_query::SearchQueryExtractor;
pub use synthesizer::{build_context, AnswerSynthesizer, ExtractedExcerpt};

use crate::config::StageModels;
use crate::prompts::PromptTemplates;
use std::fmt;
use std::sync::Arc;

/// Returned when no excerpt survives filtering and budgeting
pub const FALLBACK_ANSWER: &str =
    "I don't have enough relevant information to answer that question.";

/// Everything one query run reads from shared configuration, captured once
/// at the start so concurrent template updates cannot leak in mid-run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub templates: Arc<PromptTemplates>,
    pub models: StageModels,
}

/// Lifecycle of a single query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStage {
    Received,
    SearchExtracted,
    Retrieved,
    RelevanceFiltered,
    Budgeted,
    Answered,
    Fallback,
}

impl fmt::Display for QueryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::SearchExtracted => "search_extracted",
            Self::Retrieved => "retrieved",
            Self::RelevanceFiltered => "relevance_filtered",
            Self::Budgeted => "budgeted",
            Self::Answered => "answered",
            Self::Fallback => "fallback",
        };
        f.write_str(name)
    }
}
