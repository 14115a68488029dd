//! Output formatters

pub mod json;
pub mod terminal;

use crate::app::{OutputFormat, TemplateName};
use campusqa_core::{Answer, CandidateDocument, ModelRegistry, PromptTemplates, StageModels};

pub fn format_answer(answer: &Answer, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_answer(answer),
        OutputFormat::Cli => terminal::format_answer(answer),
    }
}

pub fn format_candidates(
    candidates: &[CandidateDocument],
    format: OutputFormat,
    full: bool,
) -> String {
    match format {
        OutputFormat::Json => json::format_candidates(candidates, full),
        OutputFormat::Cli => terminal::format_candidates(candidates, full),
    }
}

pub fn format_templates(
    templates: &PromptTemplates,
    name: Option<TemplateName>,
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Json => json::format_templates(templates, name),
        OutputFormat::Cli => terminal::format_templates(templates, name),
    }
}

pub fn format_models(registry: &ModelRegistry, stages: &StageModels, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_models(registry, stages),
        OutputFormat::Cli => terminal::format_models(registry, stages),
    }
}
