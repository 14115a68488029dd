//! Prompt templates and their hot-swappable store
//!
//! Templates use `{name}` placeholders (`{query}`, `{content}`, `{context}`);
//! `{{` and `}}` render as literal braces. Readers take an immutable snapshot,
//! writers publish a whole new snapshot, so a single query never observes a
//! mix of old and new template text.

use crate::error::Result;
use arc_swap::ArcSwap;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

lazy_static! {
    static ref PLACEHOLDER_RE: Regex =
        Regex::new(r"\{\{|\}\}|\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap();
}

const RELEVANCE_PROMPT: &str = "Determine if this document contains information that helps answer the query.
Reply with ONLY a single word: 'Yes' or 'No'.

Query: {query}

Document content:
{content}...

Is this document relevant? Answer with just 'Yes' or 'No':";

const EXTRACTION_PROMPT: &str = "Extract ONLY the information relevant to answering provided query. If no relevant information exists, respond with 'NO_RELEVANT_INFO'.

Query: {query}

Document content:
{content}...

Extract relevant information:";

const ANSWER_PROMPT: &str = "You are the university's Q/A assistant and you represent the university. Answer the question using the provided relevant information.
Cite sources as [X] when using information. Write concise answers.
If you can't answer from the provided information, say \"I don't have enough information.\"

Relevant Information:
{context}

Question: {query}

Provide a detailed answer with citations, then list the sources you used:";

const SEARCH_QUERY_PROMPT: &str = "Extract the core search query from the user's question. Remove unnecessary words and keep only the essential search terms.
Example 1:
Input: \"Can you tell me about the history of the university?\"
Output: university history

Example 2:
Input: \"bana üniversitenin tarihi hakkında yaz\"
Output: üniversitenin tarihi

User input: {query}

Extract core search query:";

/// The four named templates used by the answer pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PromptTemplates {
    /// Yes/No relevance judgement; placeholders `query`, `content`
    #[serde(rename = "relevance_prompt", default = "default_relevance")]
    pub relevance: String,

    /// Excerpt extraction; placeholders `query`, `content`
    #[serde(rename = "extract_info_prompt", default = "default_extraction")]
    pub extraction: String,

    /// Final cited answer; placeholders `context`, `query`
    #[serde(rename = "answer_prompt", default = "default_answer")]
    pub answer: String,

    /// Search query narrowing; placeholder `query`
    #[serde(rename = "extract_query_prompt", default = "default_search_query")]
    pub search_query: String,
}

fn default_relevance() -> String {
    RELEVANCE_PROMPT.to_string()
}

fn default_extraction() -> String {
    EXTRACTION_PROMPT.to_string()
}

fn default_answer() -> String {
    ANSWER_PROMPT.to_string()
}

fn default_search_query() -> String {
    SEARCH_QUERY_PROMPT.to_string()
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            relevance: default_relevance(),
            extraction: default_extraction(),
            answer: default_answer(),
            search_query: default_search_query(),
        }
    }
}

impl PromptTemplates {
    /// Copy of these templates with the update's fields replaced
    pub fn with_update(&self, update: &TemplateUpdate) -> Self {
        let mut next = self.clone();
        if let Some(ref t) = update.relevance {
            next.relevance = t.clone();
        }
        if let Some(ref t) = update.extraction {
            next.extraction = t.clone();
        }
        if let Some(ref t) = update.answer {
            next.answer = t.clone();
        }
        if let Some(ref t) = update.search_query {
            next.search_query = t.clone();
        }
        next
    }

    /// Load templates from a YAML file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }
}

/// Partial replacement of templates; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplateUpdate {
    #[serde(rename = "relevance_prompt", default, skip_serializing_if = "Option::is_none")]
    pub relevance: Option<String>,
    #[serde(rename = "extract_info_prompt", default, skip_serializing_if = "Option::is_none")]
    pub extraction: Option<String>,
    #[serde(rename = "answer_prompt", default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(rename = "extract_query_prompt", default, skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
}

impl TemplateUpdate {
    pub fn is_empty(&self) -> bool {
        self.relevance.is_none()
            && self.extraction.is_none()
            && self.answer.is_none()
            && self.search_query.is_none()
    }
}

/// Process-wide template store with atomically swapped snapshots
pub struct PromptStore {
    current: ArcSwap<PromptTemplates>,
}

impl PromptStore {
    pub fn new(templates: PromptTemplates) -> Self {
        Self {
            current: ArcSwap::from_pointee(templates),
        }
    }

    /// Current immutable snapshot
    pub fn snapshot(&self) -> Arc<PromptTemplates> {
        self.current.load_full()
    }

    /// Publish a whole new template set
    pub fn replace(&self, templates: PromptTemplates) {
        self.current.store(Arc::new(templates));
        tracing::info!("Prompt templates replaced");
    }

    /// Publish the current templates with `update` applied; returns the new snapshot
    pub fn apply(&self, update: &TemplateUpdate) -> Arc<PromptTemplates> {
        if update.is_empty() {
            return self.snapshot();
        }
        self.current.rcu(|current| current.with_update(update));
        tracing::info!("Prompt templates updated");
        self.snapshot()
    }
}

impl Default for PromptStore {
    fn default() -> Self {
        Self::new(PromptTemplates::default())
    }
}

/// Substitute `{name}` placeholders from `vars`.
///
/// Unknown placeholders are kept verbatim; substituted values are not
/// re-scanned, so document text containing braces is inserted as-is.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures| match caps.get(1) {
            Some(name) => vars
                .iter()
                .find(|(key, _)| *key == name.as_str())
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| caps[0].to_string()),
            None if &caps[0] == "{{" => "{".to_string(),
            None => "}".to_string(),
        })
        .into_owned()
}
