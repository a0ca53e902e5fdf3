//! MCP server over newline-delimited JSON-RPC on stdio.
//!
//! # Design
//! Requests are read one line at a time. `tools/call` requests each run on
//! their own scoped thread so a slow webhook call does not hold up the rest;
//! every other message is answered inline. Responses are written whole
//! under a mutex so concurrent replies never interleave. EOF on the reader
//! ends the loop once in-flight calls have finished.

use std::io::{self, BufRead, Write};
use std::sync::Mutex;
use std::thread;

use notify_core::{Args, Dispatcher, DispatchError, Transport, UreqTransport};
use serde_json::{json, Map, Value};
use tracing::{debug, error};

use crate::protocol::{
    call_tool_result, error_response, success_response, RpcError, MCP_PROTOCOL_VERSION,
    MCP_SERVER_NAME,
};

pub struct McpServer<T = UreqTransport> {
    dispatcher: Dispatcher<T>,
}

impl<T: Transport> McpServer<T> {
    pub fn new(dispatcher: Dispatcher<T>) -> Self {
        Self { dispatcher }
    }

    pub fn serve<R, W>(&self, reader: R, writer: W) -> io::Result<()>
    where
        R: BufRead,
        W: Write + Send,
    {
        let writer = Mutex::new(writer);
        thread::scope(|scope| -> io::Result<()> {
            for line in reader.lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let incoming = match serde_json::from_str::<Value>(&line) {
                    Ok(incoming) => incoming,
                    Err(err) => {
                        let response =
                            error_response(Value::Null, RpcError::parse_error(err.to_string()));
                        write_message(&writer, &response)?;
                        continue;
                    }
                };

                if is_tool_call(&incoming) {
                    let writer = &writer;
                    scope.spawn(move || {
                        if let Some(response) = self.handle_message(incoming) {
                            if let Err(err) = write_message(writer, &response) {
                                error!(error = %err, "failed to write tool response");
                            }
                        }
                    });
                } else if let Some(response) = self.handle_message(incoming) {
                    write_message(&writer, &response)?;
                }
            }
            Ok(())
        })
    }

    /// Handle one decoded message. Notifications yield `None`.
    pub fn handle_message(&self, incoming: Value) -> Option<Value> {
        let Some(obj) = incoming.as_object() else {
            return Some(error_response(
                Value::Null,
                RpcError::invalid_request("Request must be a JSON object"),
            ));
        };

        if obj.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
            let id = obj.get("id").cloned().unwrap_or(Value::Null);
            return Some(error_response(
                id,
                RpcError::invalid_request("jsonrpc must be '2.0'"),
            ));
        }

        let Some(method) = obj.get("method").and_then(Value::as_str) else {
            // A response to something we never sent.
            return None;
        };

        let params = obj.get("params").cloned().unwrap_or(Value::Null);
        let id = obj.get("id").cloned()?;
        debug!(method, "request");
        Some(match self.handle_request(method, params) {
            Ok(result) => success_response(id, result),
            Err(err) => error_response(id, err),
        })
    }

    fn handle_request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        match method {
            "initialize" => Ok(initialize_payload()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(self.tools_list_payload()),
            "tools/call" => self.handle_tools_call(params),
            _ => Err(RpcError::method_not_found(method)),
        }
    }

    fn tools_list_payload(&self) -> Value {
        let tools: Vec<Value> = self
            .dispatcher
            .tools()
            .into_iter()
            .map(|tool| {
                json!({
                    "name": tool.name.as_str(),
                    "description": tool.description,
                    "inputSchema": tool.input_schema,
                })
            })
            .collect();
        json!({ "tools": tools })
    }

    fn handle_tools_call(&self, params: Value) -> Result<Value, RpcError> {
        let params = params
            .as_object()
            .ok_or_else(|| RpcError::invalid_params("tools/call params must be an object"))?;

        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::invalid_params("tools/call requires string field 'name'"))?;

        let args: Args = match params.get("arguments") {
            Some(Value::Object(map)) => map.clone(),
            Some(Value::Null) | None => Map::new(),
            Some(_) => {
                return Err(RpcError::invalid_params(
                    "tools/call 'arguments' must be an object",
                ));
            }
        };

        match self.dispatcher.call(name, &args) {
            Ok(result) => Ok(call_tool_result(&result)),
            Err(err @ DispatchError::UnknownOperation(_)) => {
                Err(RpcError::invalid_params(err.to_string()))
            }
        }
    }
}

fn initialize_payload() -> Value {
    json!({
        "protocolVersion": MCP_PROTOCOL_VERSION,
        "capabilities": {
            "tools": { "listChanged": false }
        },
        "serverInfo": {
            "name": MCP_SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

fn is_tool_call(incoming: &Value) -> bool {
    incoming.get("method").and_then(Value::as_str) == Some("tools/call")
        && incoming.get("id").is_some()
}

fn write_message<W: Write>(writer: &Mutex<W>, message: &Value) -> io::Result<()> {
    let mut line = serde_json::to_vec(message)?;
    line.push(b'\n');
    // The writer holds no invariants a panic could break.
    let mut guard = writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.write_all(&line)?;
    guard.flush()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use notify_core::Config;

    use super::*;

    fn server(admin: bool) -> McpServer {
        let config = Config::new("http://127.0.0.1:1")
            .with_admin_token(admin.then(|| "secret".to_string()))
            .with_timeout(Duration::from_secs(1));
        McpServer::new(Dispatcher::from_config(&config))
    }

    fn request(id: u64, method: &str, params: Value) -> Value {
        json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params})
    }

    #[test]
    fn initialize_reports_tools_capability() {
        let response = server(false)
            .handle_message(request(1, "initialize", json!({})))
            .unwrap();
        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], MCP_PROTOCOL_VERSION);
        assert_eq!(response["result"]["serverInfo"]["name"], MCP_SERVER_NAME);
        assert!(response["result"]["capabilities"]["tools"].is_object());
    }

    #[test]
    fn tools_list_is_gated_by_admin_token() {
        let without = server(false)
            .handle_message(request(1, "tools/list", Value::Null))
            .unwrap();
        let tools = without["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "send_notification");
        assert!(tools[0]["inputSchema"]["properties"]["channel_token"].is_object());

        let with = server(true)
            .handle_message(request(2, "tools/list", Value::Null))
            .unwrap();
        assert_eq!(with["result"]["tools"].as_array().unwrap().len(), 5);
    }

    #[test]
    fn unknown_tool_is_a_protocol_error() {
        let response = server(true)
            .handle_message(request(3, "tools/call", json!({"name": "nuke", "arguments": {}})))
            .unwrap();
        assert_eq!(response["error"]["code"], -32602);
        assert_eq!(response["error"]["message"], "Unknown tool: nuke");
        assert!(response.get("result").is_none());
    }

    #[test]
    fn validation_failure_is_a_tool_error_result() {
        let response = server(false)
            .handle_message(request(
                4,
                "tools/call",
                json!({"name": "send_notification", "arguments": {"channel_token": "t"}}),
            ))
            .unwrap();
        assert_eq!(response["result"]["isError"], true);
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("message"));
    }

    #[test]
    fn gated_tool_without_token_is_a_tool_error_result() {
        let response = server(false)
            .handle_message(request(5, "tools/call", json!({"name": "list_channels"})))
            .unwrap();
        assert_eq!(response["result"]["isError"], true);
    }

    #[test]
    fn malformed_calls_are_invalid_params() {
        let s = server(false);
        let no_name = s
            .handle_message(request(6, "tools/call", json!({"arguments": {}})))
            .unwrap();
        assert_eq!(no_name["error"]["code"], -32602);

        let bad_args = s
            .handle_message(request(
                7,
                "tools/call",
                json!({"name": "send_notification", "arguments": [1, 2]}),
            ))
            .unwrap();
        assert_eq!(bad_args["error"]["code"], -32602);
    }

    #[test]
    fn unknown_method_and_bad_envelopes() {
        let s = server(false);
        let response = s.handle_message(request(8, "resources/list", json!({}))).unwrap();
        assert_eq!(response["error"]["code"], -32601);

        let response = s.handle_message(json!([1, 2])).unwrap();
        assert_eq!(response["error"]["code"], -32600);

        let response = s
            .handle_message(json!({"jsonrpc": "1.0", "id": 9, "method": "ping"}))
            .unwrap();
        assert_eq!(response["error"]["code"], -32600);
        assert_eq!(response["id"], 9);
    }

    #[test]
    fn notifications_get_no_reply() {
        let s = server(false);
        let reply = s.handle_message(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}));
        assert!(reply.is_none());
    }

    #[test]
    fn serve_answers_each_line_and_reports_parse_errors() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            "\n",
            "{not json\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#,
            "\n",
        );
        let mut out = Vec::new();
        server(false).serve(input.as_bytes(), &mut out).unwrap();

        let replies: Vec<Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(replies.len(), 3);
        assert_eq!(replies[0]["id"], 1);
        assert_eq!(replies[1]["error"]["code"], -32700);
        assert_eq!(replies[2]["id"], 2);
        assert_eq!(replies[2]["result"], json!({}));
    }
}
