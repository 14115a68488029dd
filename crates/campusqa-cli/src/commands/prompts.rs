//! Prompts command

use crate::app::{OutputFormat, PromptsAction, PromptsArgs, TemplateName};
use crate::output;
use anyhow::{Context, Result};
use campusqa_core::{CampusQaError, PromptTemplates, TemplateUpdate};
use std::path::Path;

pub fn run(args: PromptsArgs, path: &Path, format: OutputFormat) -> Result<()> {
    let templates = PromptTemplates::load(path)?;

    match args.action {
        PromptsAction::Show { name } => {
            print!("{}", output::format_templates(&templates, name, format));
        }
        PromptsAction::Set { name, text, file } => {
            let text = match (text, file) {
                (Some(text), None) => text,
                (None, Some(file)) => std::fs::read_to_string(&file)
                    .with_context(|| format!("Failed to read {}", file.display()))?,
                _ => {
                    return Err(CampusQaError::InvalidInput(
                        "give the template text or --file".to_string(),
                    )
                    .into())
                }
            };
            if text.trim().is_empty() {
                return Err(
                    CampusQaError::InvalidInput("template must not be empty".to_string()).into(),
                );
            }

            templates.with_update(&name.update(text)).save(path)?;
            println!("Updated {} in {}", name.key(), path.display());
        }
        PromptsAction::Reset { name } => {
            let defaults = PromptTemplates::default();
            let reset = match name {
                Some(name) => {
                    let update: TemplateUpdate = name.update(name.get(&defaults).to_string());
                    templates.with_update(&update)
                }
                None => defaults,
            };
            reset.save(path)?;

            let which = name.map(TemplateName::key).unwrap_or("all prompts");
            println!("Reset {} in {}", which, path.display());
        }
    }
    Ok(())
}
