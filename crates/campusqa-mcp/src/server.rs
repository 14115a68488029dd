//! Line-delimited JSON-RPC loop dispatching to the question-answering tools

use crate::protocol::*;
use crate::tools;
use anyhow::Result;
use campusqa_core::{ModelRegistry, QueryPipeline};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};

const PROTOCOL_VERSION: &str = "2024-11-05";

/// Serves one pipeline and its model table; borrowed so the caller keeps
/// ownership of the loaded corpus
pub struct McpServer<'a> {
    pipeline: &'a QueryPipeline,
    registry: &'a ModelRegistry,
}

impl<'a> McpServer<'a> {
    pub fn new(pipeline: &'a QueryPipeline, registry: &'a ModelRegistry) -> Self {
        Self { pipeline, registry }
    }

    /// Read requests until EOF, one JSON object per line, and write one reply
    /// line per call. Notifications and blank lines get no reply.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<JsonRpcRequest>(line) {
                Ok(request) if request.is_notification() => {
                    tracing::debug!("Notification: {}", request.method);
                    continue;
                }
                Ok(request) => self.handle_request(&request).await,
                Err(e) => JsonRpcResponse::error(None, PARSE_ERROR, format!("Parse error: {}", e)),
            };

            let mut json = serde_json::to_string(&response)?;
            json.push('\n');
            writer.write_all(json.as_bytes()).await?;
            writer.flush().await?;
        }

        Ok(())
    }

    pub async fn handle_request(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.clone();
        match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, initialize_result()),
            "tools/list" => {
                JsonRpcResponse::success(id, serde_json::json!({ "tools": tools::definitions() }))
            }
            "tools/call" => JsonRpcResponse::success(id, self.call_tool(request).await),
            "resources/list" => {
                JsonRpcResponse::success(id, serde_json::json!({ "resources": [] }))
            }
            other => JsonRpcResponse::error(
                id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", other),
            ),
        }
    }

    async fn call_tool(&self, request: &JsonRpcRequest) -> serde_json::Value {
        let name = request.tool_name();
        let arguments = request.tool_arguments();

        let result = match name {
            "ask" => tools::handle_ask(self.pipeline, arguments).await,
            "retrieve" => tools::handle_retrieve(self.pipeline, arguments).await,
            "get_prompts" => tools::handle_get_prompts(self.pipeline).await,
            "update_prompts" => tools::handle_update_prompts(self.pipeline, arguments).await,
            "list_models" => tools::handle_list_models(self.registry).await,
            _ => Err(anyhow::anyhow!("Unknown tool: {}", name)),
        };

        let tool_result = result.unwrap_or_else(|e| {
            tracing::warn!("Tool {} failed: {}", name, e);
            ToolResult::error(e.to_string())
        });
        serde_json::to_value(tool_result).unwrap_or_default()
    }
}

fn initialize_result() -> serde_json::Value {
    serde_json::json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {},
            "resources": { "subscribe": false }
        },
        "serverInfo": {
            "name": "campusqa",
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

/// Serve over the process's stdin and stdout
pub async fn start_server(pipeline: &QueryPipeline, registry: &ModelRegistry) -> Result<()> {
    tracing::info!("Starting MCP server on stdio");
    McpServer::new(pipeline, registry)
        .serve(
            BufReader::new(tokio::io::stdin()),
            BufWriter::new(tokio::io::stdout()),
        )
        .await
}
