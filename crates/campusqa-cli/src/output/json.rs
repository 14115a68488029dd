//! JSON output formatter

use crate::app::TemplateName;
use campusqa_core::{Answer, CandidateDocument, ModelRegistry, PromptTemplates, StageModels};
use serde::Serialize;

fn pretty<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string()) + "\n"
}

pub fn format_answer(answer: &Answer) -> String {
    let mut value = serde_json::to_value(answer).unwrap_or_default();
    if let Some(obj) = value.as_object_mut() {
        obj.insert(
            "response".to_string(),
            serde_json::Value::String(answer.response_text().to_string()),
        );
    }
    pretty(&value)
}

pub fn format_candidates(candidates: &[CandidateDocument], full: bool) -> String {
    let output: Vec<serde_json::Value> = candidates
        .iter()
        .map(|c| {
            let mut item = serde_json::json!({
                "rank": c.rank,
                "score": c.score,
                "url": c.url,
            });
            if full {
                item["content"] = serde_json::Value::String(c.content.clone());
            }
            item
        })
        .collect();
    pretty(&output)
}

pub fn format_templates(templates: &PromptTemplates, name: Option<TemplateName>) -> String {
    match name {
        Some(name) => pretty(&serde_json::json!({ (name.key()): name.get(templates) })),
        None => pretty(templates),
    }
}

pub fn format_models(registry: &ModelRegistry, stages: &StageModels) -> String {
    pretty(&serde_json::json!({
        "default": registry.default_model,
        "models": registry.models,
        "stages": stages,
    }))
}
