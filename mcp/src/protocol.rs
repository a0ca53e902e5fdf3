//! JSON-RPC 2.0 envelopes for the MCP stdio transport.

use notify_core::OperationResult;
use serde_json::{json, Value};
use thiserror::Error;

pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";
pub const MCP_SERVER_NAME: &str = "notify-mcp";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{message} ({code})")]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self {
            code: -32700,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            code: -32600,
            message: message.into(),
        }
    }

    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: format!("Method not found: {method}"),
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: -32602,
            message: message.into(),
        }
    }
}

pub fn success_response(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

pub fn error_response(id: Value, error: RpcError) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": error.code,
            "message": error.message
        }
    })
}

/// `tools/call` result. `isError` is only present on failures.
pub fn call_tool_result(result: &OperationResult) -> Value {
    let content = json!([{ "type": "text", "text": result.text }]);
    if result.is_error {
        json!({ "content": content, "isError": true })
    } else {
        json!({ "content": content })
    }
}
