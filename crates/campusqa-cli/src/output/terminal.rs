//! Terminal output formatter

use crate::app::TemplateName;
use campusqa_core::{Answer, CandidateDocument, ModelRegistry, PromptTemplates, StageModels};

/// Lines of page content shown with `--full`
const PREVIEW_LINES: usize = 5;

pub fn format_answer(answer: &Answer) -> String {
    let mut output = format!("{}\n", answer.response_text().trim_end());

    if !answer.sources().is_empty() {
        output.push_str("\nSources:\n");
        for (i, url) in answer.sources().iter().enumerate() {
            output.push_str(&format!("  [{}] {}\n", i + 1, url));
        }
    }

    output
}

pub fn format_candidates(candidates: &[CandidateDocument], full: bool) -> String {
    let mut output = String::new();

    for candidate in candidates {
        output.push_str(&format!(
            "{:>2}. {:.3} {}\n",
            candidate.rank + 1,
            candidate.score,
            candidate.url
        ));

        if full {
            let mut lines = candidate.content.lines().filter(|l| !l.trim().is_empty());
            for line in lines.by_ref().take(PREVIEW_LINES) {
                output.push_str(&format!("    {}\n", line.trim()));
            }
            if lines.next().is_some() {
                output.push_str("    ...\n");
            }
        }
    }

    output
}

pub fn format_templates(templates: &PromptTemplates, name: Option<TemplateName>) -> String {
    match name {
        Some(name) => format!("{}\n", name.get(templates).trim_end()),
        None => TemplateName::ALL
            .iter()
            .map(|name| format!("== {} ==\n{}\n", name.key(), name.get(templates).trim_end()))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

pub fn format_models(registry: &ModelRegistry, stages: &StageModels) -> String {
    let mut output = String::new();

    for model in &registry.models {
        let marker = if model.id == registry.default_model {
            " (default)"
        } else {
            ""
        };
        output.push_str(&format!(
            "{:<28} {:>6} chars{}\n",
            model.id, model.token_ceiling, marker
        ));
    }

    output.push_str("\nStages:\n");
    output.push_str(&format!("  search:     {}\n", stages.search));
    output.push_str(&format!("  relevance:  {}\n", stages.relevance));
    output.push_str(&format!("  extraction: {}\n", stages.extraction));
    output.push_str(&format!("  answer:     {}\n", stages.answer));
    output
}
