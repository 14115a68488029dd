//! MCP tool definitions and handlers

use crate::protocol::*;
use anyhow::Result;
use campusqa_core::{ModelRegistry, QueryPipeline, QueryRequest, TemplateUpdate};
use serde_json::Value;

const DEFAULT_RETRIEVE_LIMIT: usize = 10;

/// Everything `tools/list` advertises, in display order
pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ask_tool_definition(),
        retrieve_tool_definition(),
        get_prompts_tool_definition(),
        update_prompts_tool_definition(),
        list_models_tool_definition(),
    ]
}

pub fn ask_tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "ask".to_string(),
        description: "Answer a question about the university from its website, with numbered citations"
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "query_text": {
                    "type": "string",
                    "description": "The question, in any language"
                },
                "search_model": { "type": "string", "description": "Model for search query extraction" },
                "relevance_model": { "type": "string", "description": "Model for relevance checks" },
                "extraction_model": { "type": "string", "description": "Model for excerpt extraction" },
                "answer_model": { "type": "string", "description": "Model for the final answer" },
                "search_prompt": { "type": "string", "description": "Search query template for this request ({query})" },
                "relevance_prompt": { "type": "string", "description": "Relevance template for this request ({query}, {content})" },
                "extraction_prompt": { "type": "string", "description": "Extraction template for this request ({query}, {content})" },
                "answer_prompt": { "type": "string", "description": "Answer template for this request ({context}, {query})" }
            },
            "required": ["query_text"]
        }),
    }
}

pub fn retrieve_tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "retrieve".to_string(),
        description: "Nearest pages to a search query by embedding similarity, without LLM filtering"
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search terms"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum results (default: 10)",
                    "default": 10
                }
            },
            "required": ["query"]
        }),
    }
}

pub fn get_prompts_tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "get_prompts".to_string(),
        description: "Current prompt templates used by the answer pipeline".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {}
        }),
    }
}

pub fn update_prompts_tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "update_prompts".to_string(),
        description: "Replace one or more prompt templates for all subsequent questions".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "relevance_prompt": { "type": "string" },
                "extract_info_prompt": { "type": "string" },
                "answer_prompt": { "type": "string" },
                "extract_query_prompt": { "type": "string" }
            }
        }),
    }
}

pub fn list_models_tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "list_models".to_string(),
        description: "Available completion models and their prompt ceilings".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {}
        }),
    }
}

pub async fn handle_ask(pipeline: &QueryPipeline, args: Value) -> Result<ToolResult> {
    let request: QueryRequest = serde_json::from_value(args)
        .map_err(|e| anyhow::anyhow!("Invalid ask arguments: {}", e))?;

    let answer = pipeline.answer(&request).await?;

    let mut text = answer.response_text().to_string();
    if !answer.sources().is_empty() {
        text.push_str("\n\nSources:\n");
        for (i, url) in answer.sources().iter().enumerate() {
            text.push_str(&format!("[{}] {}\n", i + 1, url));
        }
    }

    Ok(ToolResult::text_with_data(text, serde_json::to_value(&answer)?))
}

pub async fn handle_retrieve(pipeline: &QueryPipeline, args: Value) -> Result<ToolResult> {
    let query = args
        .get("query")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| anyhow::anyhow!("Missing required parameter: query"))?;

    let limit = args
        .get("limit")
        .and_then(|v| v.as_u64())
        .map(|l| l as usize)
        .unwrap_or(DEFAULT_RETRIEVE_LIMIT);

    let candidates = pipeline.retriever().retrieve(query, limit).await?;

    let summary = format!("Found {} pages", candidates.len());
    let items: Vec<Value> = candidates
        .iter()
        .map(|c| {
            serde_json::json!({
                "url": c.url,
                "score": c.score,
                "rank": c.rank,
            })
        })
        .collect();

    Ok(ToolResult::text_with_data(
        summary,
        serde_json::json!({ "results": items }),
    ))
}

pub async fn handle_get_prompts(pipeline: &QueryPipeline) -> Result<ToolResult> {
    let snapshot = pipeline.prompts().snapshot();
    let data = serde_json::to_value(snapshot.as_ref())?;
    Ok(ToolResult::text_with_data(
        serde_json::to_string_pretty(&data)?,
        data,
    ))
}

pub async fn handle_update_prompts(pipeline: &QueryPipeline, args: Value) -> Result<ToolResult> {
    let update: TemplateUpdate = serde_json::from_value(args)
        .map_err(|e| anyhow::anyhow!("Invalid update_prompts arguments: {}", e))?;
    if update.is_empty() {
        anyhow::bail!(
            "No templates given; expected any of relevance_prompt, extract_info_prompt, answer_prompt, extract_query_prompt"
        );
    }

    let updated = pipeline.prompts().apply(&update);
    Ok(ToolResult::text_with_data(
        "Prompts updated successfully".to_string(),
        serde_json::to_value(updated.as_ref())?,
    ))
}

pub async fn handle_list_models(registry: &ModelRegistry) -> Result<ToolResult> {
    let text = registry
        .models
        .iter()
        .map(|m| {
            let marker = if m.id == registry.default_model { " (default)" } else { "" };
            format!("{} - {} chars{}", m.id, m.token_ceiling, marker)
        })
        .collect::<Vec<_>>()
        .join("\n");

    Ok(ToolResult::text_with_data(
        text,
        serde_json::json!({
            "default": registry.default_model,
            "models": registry.models,
        }),
    ))
}
