//! End-to-end tests for the answer pipeline
//!
//! Runs the full query flow against an in-memory corpus with a scripted
//! completion backend, so no network or model is required.

use async_trait::async_trait;
use campusqa_core::corpus::{Document, DocumentStore, EmbeddingRecord, VectorIndex};
use campusqa_core::{
    Answer, CampusQaError, CompletionClient, Embedder, ErrorPolicy, PipelineSettings,
    PromptStore, PromptTemplates, QueryPipeline, QueryRequest, Result, Retriever, StageModels,
    TemplateUpdate, FALLBACK_ANSWER,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const DOCS: &[(&str, &str, [f32; 2])] = &[
    ("https://uni.edu/history", "DOC-A The university was founded in 1956.", [1.0, 0.0]),
    ("https://uni.edu/campus", "DOC-B The main campus covers 4500 hectares.", [0.9, 0.1]),
    ("https://uni.edu/library", "DOC-C The library opens at 8am.", [0.8, 0.2]),
    ("https://uni.edu/dorms", "DOC-D Dormitories host 3000 students.", [0.7, 0.3]),
];

const TAGS: &[&str] = &["DOC-A", "DOC-B", "DOC-C", "DOC-D"];

fn words(n: usize) -> String {
    vec!["word"; n].join(" ")
}

/// Every query embeds to the same direction; documents are ordered A > B > C > D
struct FixedEmbedder;

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0, 0.0])
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
    }

    fn dimensions(&self) -> usize {
        2
    }

    fn model_name(&self) -> &str {
        "fixed"
    }
}

/// Completion backend that answers by stage (model name) and document tag
#[derive(Default)]
struct ScriptedClient {
    search_reply: Option<String>,
    relevant: HashSet<&'static str>,
    relevance_failures: HashSet<&'static str>,
    extracts: HashMap<&'static str, String>,
    extraction_failures: HashSet<&'static str>,
    answer_reply: String,
    /// Swapped in by the search stage, to simulate a concurrent update
    swap_on_search: Option<(Arc<PromptStore>, PromptTemplates)>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedClient {
    fn calls_for(&self, model: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == model)
            .map(|(_, p)| p.clone())
            .collect()
    }

    fn tag(prompt: &str) -> Option<&'static str> {
        TAGS.iter().copied().find(|t| prompt.contains(t))
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), prompt.to_string()));

        let fail = |what: &str| Err(CampusQaError::Llm(format!("{} unavailable", what)));
        match model {
            "search" => {
                if let Some((store, templates)) = &self.swap_on_search {
                    store.replace(templates.clone());
                }
                match &self.search_reply {
                    Some(reply) => Ok(reply.clone()),
                    None => fail("search"),
                }
            }
            "relevance" => {
                let tag = Self::tag(prompt).unwrap_or_default();
                if self.relevance_failures.contains(tag) {
                    return fail("relevance");
                }
                Ok(if self.relevant.contains(tag) { " Yes\n" } else { "No" }.to_string())
            }
            "extraction" => {
                let tag = Self::tag(prompt).unwrap_or_default();
                if self.extraction_failures.contains(tag) {
                    return fail("extraction");
                }
                Ok(self
                    .extracts
                    .get(tag)
                    .cloned()
                    .unwrap_or_else(|| "NO_RELEVANT_INFO".to_string()))
            }
            "answer" => Ok(self.answer_reply.clone()),
            other => Err(CampusQaError::Llm(format!("unexpected model {}", other))),
        }
    }
}

fn stage_models() -> StageModels {
    StageModels {
        search: "search".to_string(),
        relevance: "relevance".to_string(),
        extraction: "extraction".to_string(),
        answer: "answer".to_string(),
    }
}

fn retriever(docs: &[(&str, &str, [f32; 2])]) -> Retriever {
    let records = docs
        .iter()
        .map(|(url, _, v)| EmbeddingRecord {
            url: url.to_string(),
            vector: v.to_vec(),
        })
        .collect();
    let documents = DocumentStore::from_documents(docs.iter().map(|(url, content, _)| Document {
        url: url.to_string(),
        content: content.to_string(),
    }));
    Retriever::new(
        Arc::new(VectorIndex::build(records).unwrap()),
        Arc::new(documents),
        Arc::new(FixedEmbedder),
    )
}

fn pipeline_with(
    client: Arc<ScriptedClient>,
    prompts: Arc<PromptStore>,
    settings: PipelineSettings,
) -> QueryPipeline {
    QueryPipeline::new(retriever(DOCS), client, prompts, stage_models(), settings)
}

fn pipeline(client: Arc<ScriptedClient>) -> QueryPipeline {
    pipeline_with(client, Arc::new(PromptStore::default()), PipelineSettings::default())
}

#[tokio::test]
async fn test_answer_end_to_end() {
    let client = Arc::new(ScriptedClient {
        search_reply: Some("university founding".to_string()),
        relevant: ["DOC-A", "DOC-B", "DOC-C", "DOC-D"].into(),
        extracts: [
            ("DOC-A", words(200)),
            ("DOC-B", words(150)),
            ("DOC-C", words(300)),
            ("DOC-D", words(180)),
        ]
        .into(),
        answer_reply: "It was founded in 1956 [1].".to_string(),
        ..Default::default()
    });

    let answer = pipeline(client.clone())
        .ask("When was the university founded?")
        .await
        .unwrap();

    assert!(!answer.is_fallback());
    assert_eq!(answer.response_text(), "It was founded in 1956 [1].");
    assert_eq!(answer.search_query(), "university founding");
    assert_eq!(
        answer.sources(),
        &[
            "https://uni.edu/history",
            "https://uni.edu/campus",
            "https://uni.edu/library",
            "https://uni.edu/dorms",
        ]
    );
    assert_eq!(answer.budget().total_words, 830);
    assert_eq!(answer.budget().included, 4);
    assert!(!answer.budget().exhausted);

    // Relevance and extraction see the user's question, not the search terms
    let relevance_prompts = client.calls_for("relevance");
    assert_eq!(relevance_prompts.len(), 4);
    assert!(relevance_prompts
        .iter()
        .all(|p| p.contains("When was the university founded?")));

    let answer_prompts = client.calls_for("answer");
    assert_eq!(answer_prompts.len(), 1);
    assert!(answer_prompts[0].contains("[1] From https://uni.edu/history:\n"));
    assert!(answer_prompts[0].contains("[4] From https://uni.edu/dorms:\n"));
}

#[tokio::test]
async fn test_word_budget_excludes_overflowing_excerpt() {
    let client = Arc::new(ScriptedClient {
        search_reply: Some("q".to_string()),
        relevant: ["DOC-A", "DOC-B", "DOC-C", "DOC-D"].into(),
        extracts: TAGS.iter().map(|t| (*t, words(1000))).collect(),
        answer_reply: "ok".to_string(),
        ..Default::default()
    });

    let answer = pipeline(client.clone()).ask("question").await.unwrap();

    let budget = answer.budget();
    assert_eq!(budget.included, 3);
    assert_eq!(budget.total_words, 3000);
    assert!(budget.exhausted);
    assert_eq!(answer.sources().len(), 3);
    assert!(!client.calls_for("answer")[0].contains("[4]"));
}

#[tokio::test]
async fn test_fallback_when_nothing_extracted() {
    let client = Arc::new(ScriptedClient {
        search_reply: Some("q".to_string()),
        relevant: ["DOC-A", "DOC-B"].into(),
        answer_reply: "should not be used".to_string(),
        ..Default::default()
    });

    let answer = pipeline(client.clone()).ask("What is the parking fee?").await.unwrap();

    assert!(answer.is_fallback());
    assert_eq!(answer.response_text(), FALLBACK_ANSWER);
    assert_eq!(client.calls_for("extraction").len(), 2);
    assert!(client.calls_for("answer").is_empty());
}

#[tokio::test]
async fn test_empty_corpus_skips_llm_stages() {
    let client = Arc::new(ScriptedClient {
        search_reply: Some("q".to_string()),
        ..Default::default()
    });
    let pipeline = QueryPipeline::new(
        retriever(&[]),
        client.clone(),
        Arc::new(PromptStore::default()),
        stage_models(),
        PipelineSettings::default(),
    );

    let answer = pipeline.ask("anything").await.unwrap();

    assert!(answer.is_fallback());
    assert_eq!(client.calls_for("search").len(), 1);
    assert!(client.calls_for("relevance").is_empty());
    assert!(client.calls_for("extraction").is_empty());
}

#[tokio::test]
async fn test_relevance_failures_are_dropped_and_rank_order_kept() {
    let client = Arc::new(ScriptedClient {
        search_reply: Some("q".to_string()),
        relevant: ["DOC-A", "DOC-B", "DOC-C", "DOC-D"].into(),
        relevance_failures: ["DOC-B"].into(),
        extracts: TAGS.iter().map(|t| (*t, format!("fact from {}", t))).collect(),
        answer_reply: "ok".to_string(),
        ..Default::default()
    });

    let answer = pipeline(client).ask("question").await.unwrap();

    assert_eq!(
        answer.sources(),
        &[
            "https://uni.edu/history",
            "https://uni.edu/library",
            "https://uni.edu/dorms",
        ]
    );
}

#[tokio::test]
async fn test_relevance_abort_policy() {
    let client = Arc::new(ScriptedClient {
        search_reply: Some("q".to_string()),
        relevant: ["DOC-A"].into(),
        relevance_failures: ["DOC-C"].into(),
        ..Default::default()
    });
    let mut settings = PipelineSettings::default();
    settings.policies.relevance = ErrorPolicy::Abort;

    let result = pipeline_with(client, Arc::new(PromptStore::default()), settings)
        .ask("question")
        .await;

    assert!(matches!(result, Err(CampusQaError::Llm(_))));
}

#[tokio::test]
async fn test_extraction_failure_aborts_by_default() {
    let client = Arc::new(ScriptedClient {
        search_reply: Some("q".to_string()),
        relevant: ["DOC-A", "DOC-B"].into(),
        extracts: [("DOC-A", "fact".to_string())].into(),
        extraction_failures: ["DOC-B"].into(),
        answer_reply: "ok".to_string(),
        ..Default::default()
    });

    let result = pipeline(client.clone()).ask("question").await;

    assert!(matches!(result, Err(CampusQaError::Llm(_))));
    assert!(client.calls_for("answer").is_empty());
}

#[tokio::test]
async fn test_extraction_failure_dropped_when_configured() {
    let client = Arc::new(ScriptedClient {
        search_reply: Some("q".to_string()),
        relevant: ["DOC-A", "DOC-B"].into(),
        extracts: [("DOC-A", "fact".to_string())].into(),
        extraction_failures: ["DOC-B"].into(),
        answer_reply: "ok".to_string(),
        ..Default::default()
    });
    let mut settings = PipelineSettings::default();
    settings.policies.extraction = ErrorPolicy::Drop;

    let answer = pipeline_with(client, Arc::new(PromptStore::default()), settings)
        .ask("question")
        .await
        .unwrap();

    assert_eq!(answer.sources(), &["https://uni.edu/history"]);
}

#[tokio::test]
async fn test_search_query_failure_policies() {
    let client = Arc::new(ScriptedClient {
        search_reply: None,
        relevant: ["DOC-A"].into(),
        extracts: [("DOC-A", "fact".to_string())].into(),
        answer_reply: "ok".to_string(),
        ..Default::default()
    });

    let aborted = pipeline(client.clone()).ask("library hours").await;
    assert!(matches!(aborted, Err(CampusQaError::Llm(_))));

    let mut settings = PipelineSettings::default();
    settings.policies.search_query = ErrorPolicy::Drop;
    let answer = pipeline_with(client, Arc::new(PromptStore::default()), settings)
        .ask("library hours")
        .await
        .unwrap();
    assert_eq!(answer.search_query(), "library hours");
    assert!(!answer.is_fallback());
}

#[tokio::test]
async fn test_blank_query_rejected_before_any_call() {
    let client = Arc::new(ScriptedClient::default());

    let result = pipeline(client.clone()).ask("   ").await;

    assert!(matches!(result, Err(CampusQaError::InvalidInput(_))));
    assert!(client.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_template_swap_mid_query_not_observed() {
    let store = Arc::new(PromptStore::default());
    let swapped = PromptTemplates {
        answer: "SWAPPED {context} {query}".to_string(),
        ..PromptTemplates::default()
    };
    let client = Arc::new(ScriptedClient {
        search_reply: Some("q".to_string()),
        relevant: ["DOC-A"].into(),
        extracts: [("DOC-A", "fact".to_string())].into(),
        answer_reply: "ok".to_string(),
        swap_on_search: Some((store.clone(), swapped)),
        ..Default::default()
    });
    let pipeline = pipeline_with(client.clone(), store.clone(), PipelineSettings::default());

    pipeline.ask("first").await.unwrap();
    let first = client.calls_for("answer");
    assert!(!first[0].starts_with("SWAPPED"));

    // The next query picks up the published templates
    pipeline.ask("second").await.unwrap();
    let second = client.calls_for("answer");
    assert!(second[1].starts_with("SWAPPED"));
    assert!(store.snapshot().answer.starts_with("SWAPPED"));
}

#[tokio::test]
async fn test_request_overrides_apply_to_one_request() {
    let client = Arc::new(ScriptedClient {
        search_reply: Some("q".to_string()),
        relevant: ["DOC-A"].into(),
        extracts: [("DOC-A", "fact".to_string())].into(),
        answer_reply: "ok".to_string(),
        ..Default::default()
    });
    let store = Arc::new(PromptStore::default());
    let pipeline = pipeline_with(client.clone(), store.clone(), PipelineSettings::default());

    let request = QueryRequest {
        search_prompt: Some("KEYWORDS: {query}".to_string()),
        ..QueryRequest::new("Where is the library?")
    };
    pipeline.answer(&request).await.unwrap();

    let search_prompts = client.calls_for("search");
    assert_eq!(search_prompts[0], "KEYWORDS: Where is the library?");
    assert_eq!(*store.snapshot(), PromptTemplates::default());

    // Unknown stage model is passed through; resolution is the backend's job
    let request = QueryRequest {
        answer_model: Some("answer".to_string()),
        relevance_model: Some("nonexistent".to_string()),
        ..QueryRequest::new("Where is the library?")
    };
    let result = pipeline.answer(&request).await;
    // Every relevance call fails and is dropped, so nothing reaches extraction
    assert!(matches!(result, Ok(Answer::Fallback { .. })));
}

#[tokio::test]
async fn test_store_update_is_partial() {
    let store = PromptStore::default();
    store.apply(&TemplateUpdate {
        relevance: Some("Relevant? {query} {content}".to_string()),
        ..Default::default()
    });

    let snapshot = store.snapshot();
    assert_eq!(snapshot.relevance, "Relevant? {query} {content}");
    assert_eq!(snapshot.answer, PromptTemplates::default().answer);
}

fn page_tag(rank: usize) -> String {
    format!("PAGE-{:02}", rank)
}

/// Pages ranked in input order against the fixed query direction
fn paged_retriever(contents: &[String]) -> Retriever {
    let records = (0..contents.len())
        .map(|rank| EmbeddingRecord {
            url: format!("https://uni.edu/page-{}", rank),
            vector: vec![1.0, rank as f32 * 0.05],
        })
        .collect();
    let documents = DocumentStore::from_documents(contents.iter().enumerate().map(
        |(rank, content)| Document {
            url: format!("https://uni.edu/page-{}", rank),
            content: content.clone(),
        },
    ));
    Retriever::new(
        Arc::new(VectorIndex::build(records).unwrap()),
        Arc::new(documents),
        Arc::new(FixedEmbedder),
    )
}

/// Judges every page relevant, with relevance replies for later ranks
/// arriving first; tracks how many completions are in flight
#[derive(Default)]
struct PagedClient {
    extract_words: usize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    calls: Mutex<Vec<(String, String)>>,
}

impl PagedClient {
    fn prompts_for(&self, model: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == model)
            .map(|(_, p)| p.clone())
            .collect()
    }
}

#[async_trait]
impl CompletionClient for PagedClient {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), prompt.to_string()));

        match model {
            "search" => Ok("pages".to_string()),
            "relevance" => {
                let rank = (0..20).find(|r| prompt.contains(&page_tag(*r))).unwrap_or(0) as u64;
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(200 - rank * 10)).await;
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok("yes".to_string())
            }
            "extraction" if self.extract_words > 0 => Ok(words(self.extract_words)),
            "extraction" => Ok("fact".to_string()),
            _ => Ok("ok".to_string()),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_budget_admits_top_ranked_excerpts_when_checks_finish_out_of_order() {
    let contents: Vec<String> = (0..12)
        .map(|rank| format!("{} campus page", page_tag(rank)))
        .collect();
    let client = Arc::new(PagedClient {
        extract_words: 1500,
        ..Default::default()
    });
    let settings = PipelineSettings::default();
    let pipeline = QueryPipeline::new(
        paged_retriever(&contents),
        client.clone(),
        Arc::new(PromptStore::default()),
        stage_models(),
        settings.clone(),
    );

    let answer = pipeline.ask("question").await.unwrap();

    assert_eq!(client.prompts_for("relevance").len(), settings.top_k);
    assert_eq!(
        client.peak_in_flight.load(Ordering::SeqCst),
        settings.relevance_concurrency
    );

    // Extraction walks the relevant pages in rank order
    let extraction_order: Vec<String> = client
        .prompts_for("extraction")
        .iter()
        .map(|p| p.split_whitespace().find(|w| w.starts_with("PAGE-")).unwrap().to_string())
        .collect();
    assert_eq!(extraction_order, vec![page_tag(0), page_tag(1), page_tag(2)]);

    assert_eq!(
        answer.sources(),
        &["https://uni.edu/page-0", "https://uni.edu/page-1"]
    );
    assert_eq!(answer.budget().total_words, 3000);
    assert!(answer.budget().exhausted);
}

#[tokio::test(start_paused = true)]
async fn test_stage_prompts_respect_char_limits() {
    // Two-byte characters, so char and byte limits differ
    let content = format!("{} {}", page_tag(0), "ü".repeat(12_000));
    let client = Arc::new(PagedClient::default());
    let pipeline = QueryPipeline::new(
        paged_retriever(&[content]),
        client.clone(),
        Arc::new(PromptStore::default()),
        stage_models(),
        PipelineSettings::default(),
    );

    pipeline.ask("When is the exam?").await.unwrap();

    let count = |p: &str| p.chars().filter(|c| *c == 'ü').count();
    let relevance = client.prompts_for("relevance");
    let extraction = client.prompts_for("extraction");
    assert_eq!(relevance.len(), 1);
    assert_eq!(extraction.len(), 1);
    // "PAGE-00 " takes the first eight characters of each prefix
    assert_eq!(count(&relevance[0]), 1000 - 8);
    assert_eq!(count(&extraction[0]), 4000 - 8);
    assert!(relevance[0].contains("When is the exam?"));
    assert!(extraction[0].contains("When is the exam?"));

    // Templates that repeat the content are cut at the prompt ceiling
    let request = QueryRequest {
        relevance_prompt: Some("{query} {content}{content}{content}{content}{content}{content}".to_string()),
        extraction_prompt: Some("{query} {content}{content}".to_string()),
        ..QueryRequest::new("When is the exam?")
    };
    pipeline.answer(&request).await.unwrap();

    let relevance = client.prompts_for("relevance");
    let extraction = client.prompts_for("extraction");
    assert_eq!(relevance[1].chars().count(), 5000);
    assert_eq!(extraction[1].chars().count(), 5000);
    assert!(extraction[1].starts_with("When is the exam? PAGE-00"));
}
