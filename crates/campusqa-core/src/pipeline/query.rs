//! Query orchestration and word-budget enforcement

use super::{
    AnswerSynthesizer, CandidateDocument, ExtractedExcerpt, Extraction, InfoExtractor,
    QueryRequest, QueryResponse, QueryStage, RelevanceFilter, Retriever, RunContext,
    SearchQueryExtractor, FALLBACK_ANSWER,
};
use crate::config::{Config, ErrorPolicy, PipelineSettings, StageModels};
use crate::corpus::Corpus;
use crate::error::Result;
use crate::llm::{CompletionClient, Embedder};
use crate::prompts::PromptStore;
use crate::text::word_count;
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;

/// Running word total against a fixed ceiling
#[derive(Debug, Clone)]
pub struct WordBudget {
    max_words: usize,
    total_words: usize,
    exhausted: bool,
}

impl WordBudget {
    pub fn new(max_words: usize) -> Self {
        Self {
            max_words,
            total_words: 0,
            exhausted: false,
        }
    }

    /// Admit `words` if the total stays within the ceiling. The first refusal
    /// marks the budget exhausted; callers stop accumulating there.
    pub fn try_admit(&mut self, words: usize) -> bool {
        if self.exhausted || self.total_words + words > self.max_words {
            self.exhausted = true;
            return false;
        }
        self.total_words += words;
        true
    }

    pub fn total(&self) -> usize {
        self.total_words
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn report(&self, included: usize) -> BudgetReport {
        BudgetReport {
            max_words: self.max_words,
            total_words: self.total_words,
            included,
            exhausted: self.exhausted,
        }
    }
}

/// How the word budget was spent for one answer
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct BudgetReport {
    pub max_words: usize,
    pub total_words: usize,
    /// Excerpts admitted
    pub included: usize,
    /// Whether an excerpt was refused for exceeding the ceiling
    pub exhausted: bool,
}

/// Result of a query that did not hard-fail
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Answer {
    Answered {
        response: String,
        search_query: String,
        /// Excerpt URLs, in citation order (`[1]` first)
        sources: Vec<String>,
        budget: BudgetReport,
    },
    Fallback {
        search_query: String,
        budget: BudgetReport,
    },
}

impl Answer {
    pub fn response_text(&self) -> &str {
        match self {
            Self::Answered { response, .. } => response,
            Self::Fallback { .. } => FALLBACK_ANSWER,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    pub fn search_query(&self) -> &str {
        match self {
            Self::Answered { search_query, .. } | Self::Fallback { search_query, .. } => {
                search_query
            }
        }
    }

    pub fn sources(&self) -> &[String] {
        match self {
            Self::Answered { sources, .. } => sources,
            Self::Fallback { .. } => &[],
        }
    }

    pub fn budget(&self) -> &BudgetReport {
        match self {
            Self::Answered { budget, .. } | Self::Fallback { budget, .. } => budget,
        }
    }

    pub fn into_response(self) -> QueryResponse {
        QueryResponse {
            response: self.response_text().to_string(),
        }
    }
}

/// End-to-end question answering over the corpus
pub struct QueryPipeline {
    retriever: Retriever,
    prompts: Arc<PromptStore>,
    models: StageModels,
    settings: PipelineSettings,
    search: SearchQueryExtractor,
    relevance: RelevanceFilter,
    extractor: InfoExtractor,
    synthesizer: AnswerSynthesizer,
}

impl QueryPipeline {
    pub fn new(
        retriever: Retriever,
        client: Arc<dyn CompletionClient>,
        prompts: Arc<PromptStore>,
        models: StageModels,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            retriever,
            search: SearchQueryExtractor::new(client.clone()),
            relevance: RelevanceFilter::new(client.clone(), &settings),
            extractor: InfoExtractor::new(client.clone(), &settings),
            synthesizer: AnswerSynthesizer::new(client),
            prompts,
            models,
            settings,
        }
    }

    /// Load the corpus named by `config` and wire every stage to `client`
    pub fn from_config<C>(config: &Config, client: Arc<C>, prompts: Arc<PromptStore>) -> Result<Self>
    where
        C: CompletionClient + Embedder + 'static,
    {
        let corpus = Corpus::load(&config.corpus, client.as_ref())?;
        let embedder: Arc<dyn Embedder> = client.clone();
        let retriever = Retriever::new(corpus.index, corpus.documents, embedder);
        Ok(Self::new(
            retriever,
            client,
            prompts,
            config.models.clone(),
            config.pipeline.clone(),
        ))
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn prompts(&self) -> &Arc<PromptStore> {
        &self.prompts
    }

    /// Answer a bare question with configured models and current templates
    pub async fn ask(&self, query: &str) -> Result<Answer> {
        self.answer(&QueryRequest::new(query)).await
    }

    /// Run the full pipeline for one request.
    ///
    /// `Ok(Answer::Fallback)` means nothing relevant was found; `Err` means a
    /// stage whose policy is `Abort` failed.
    pub async fn answer(&self, request: &QueryRequest) -> Result<Answer> {
        request.validate()?;
        let user_query = request.query_text.trim();
        let ctx = self.run_context(request);
        tracing::debug!(stage = %QueryStage::Received, "Query request received: {}", user_query);

        let search_query = match self.search.extract(&ctx, user_query).await {
            Ok(q) => q,
            Err(e) if self.settings.policies.search_query == ErrorPolicy::Drop => {
                tracing::warn!("Search query extraction failed, using original query: {}", e);
                user_query.to_string()
            }
            Err(e) => return Err(e),
        };
        tracing::debug!(stage = %QueryStage::SearchExtracted, "Using search query: {}", search_query);

        let mut candidates = self
            .retriever
            .retrieve(&search_query, self.settings.top_k)
            .await?;
        sort_by_score(&mut candidates);
        tracing::info!(
            stage = %QueryStage::Retrieved,
            "Retrieved {} documents, checking relevance in parallel",
            candidates.len()
        );

        let relevant = self
            .relevance
            .batch_check_relevance(&ctx, user_query, candidates)
            .await?;
        tracing::info!(
            stage = %QueryStage::RelevanceFiltered,
            "Found {} relevant documents",
            relevant.len()
        );

        let (excerpts, budget) = self.collect_excerpts(&ctx, user_query, &relevant).await?;
        tracing::info!(
            stage = %QueryStage::Budgeted,
            "Total words collected: {} from {} documents",
            budget.total_words,
            budget.included
        );

        if excerpts.is_empty() {
            tracing::info!(stage = %QueryStage::Fallback, "No relevant excerpts; returning fallback");
            return Ok(Answer::Fallback {
                search_query,
                budget,
            });
        }

        let response = self
            .synthesizer
            .answer_with_context(&ctx, user_query, &excerpts)
            .await?;
        tracing::debug!(stage = %QueryStage::Answered, "Answer synthesized");

        Ok(Answer::Answered {
            response,
            search_query,
            sources: excerpts.into_iter().map(|e| e.url).collect(),
            budget,
        })
    }

    fn run_context(&self, request: &QueryRequest) -> RunContext {
        let snapshot = self.prompts.snapshot();
        let overrides = request.template_overrides();
        let templates = if overrides.is_empty() {
            snapshot
        } else {
            Arc::new(snapshot.with_update(&overrides))
        };

        RunContext {
            templates,
            models: request.resolve_models(&self.models),
        }
    }

    /// Extract from `relevant` in order until the word budget refuses an excerpt
    async fn collect_excerpts(
        &self,
        ctx: &RunContext,
        query: &str,
        relevant: &[CandidateDocument],
    ) -> Result<(Vec<ExtractedExcerpt>, BudgetReport)> {
        let mut budget = WordBudget::new(self.settings.max_words);
        let mut excerpts = Vec::new();

        for doc in relevant {
            let extraction = match self.extractor.extract_relevant_info(ctx, query, doc).await {
                Ok(extraction) => extraction,
                Err(e) if self.settings.policies.extraction == ErrorPolicy::Drop => {
                    tracing::warn!("Extraction failed for {}, skipping: {}", doc.url, e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let Extraction::Found(text) = extraction else {
                tracing::debug!("No relevant info in {}", doc.url);
                continue;
            };

            let words = word_count(&text);
            if !budget.try_admit(words) {
                tracing::info!("Word limit reached at {} words", budget.total());
                break;
            }

            tracing::debug!("Added info from {} (words: {})", doc.url, words);
            excerpts.push(ExtractedExcerpt {
                url: doc.url.clone(),
                text,
                word_count: words,
            });
        }

        let report = budget.report(excerpts.len());
        Ok((excerpts, report))
    }
}

/// Descending score, ranks renumbered to match
fn sort_by_score(candidates: &mut [CandidateDocument]) {
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    for (rank, candidate) in candidates.iter_mut().enumerate() {
        candidate.rank = rank;
    }
}
