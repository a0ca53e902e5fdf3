//! MCP boundary for the webhook notification adapter.
//!
//! Exposes the core dispatcher as MCP tools over JSON-RPC 2.0 on stdio:
//! `initialize`, `ping`, `tools/list` and `tools/call`. Diagnostics go to
//! stderr; stdout carries protocol frames only.

pub mod protocol;
pub mod server;

pub use protocol::RpcError;
pub use server::McpServer;
