//! CampusQA MCP Server
//!
//! Model Context Protocol server exposing question answering and prompt
//! template management to AI assistants.

pub mod protocol;
pub mod server;
pub mod tools;

pub use server::{start_server, McpServer};
