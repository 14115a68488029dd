//! Query request/response schema, validated at the system boundary

use crate::config::StageModels;
use crate::error::{CampusQaError, Result};
use crate::prompts::TemplateUpdate;
use serde::{Deserialize, Serialize};

/// A question plus optional per-request model and template overrides.
///
/// Overrides apply to this request only; they never touch the shared store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryRequest {
    pub query_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_prompt: Option<String>,
}

impl QueryRequest {
    pub fn new(query_text: impl Into<String>) -> Self {
        Self {
            query_text: query_text.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.query_text.trim().is_empty() {
            return Err(CampusQaError::InvalidInput(
                "query_text must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Stage models for this request: overrides win over `base`
    pub fn resolve_models(&self, base: &StageModels) -> StageModels {
        fn pick(over: &Option<String>, base: &str) -> String {
            over.as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .unwrap_or(base)
                .to_string()
        }

        StageModels {
            search: pick(&self.search_model, &base.search),
            relevance: pick(&self.relevance_model, &base.relevance),
            extraction: pick(&self.extraction_model, &base.extraction),
            answer: pick(&self.answer_model, &base.answer),
        }
    }

    /// Template overrides as a partial update
    pub fn template_overrides(&self) -> TemplateUpdate {
        TemplateUpdate {
            relevance: self.relevance_prompt.clone(),
            extraction: self.extraction_prompt.clone(),
            answer: self.answer_prompt.clone(),
            search_query: self.search_prompt.clone(),
        }
    }
}

/// `{ "response": ... }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryResponse {
    pub response: String,
}
