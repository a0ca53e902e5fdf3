//! Resolves a tool call to an operation and runs it end to end.
//!
//! # Design
//! `Operation` has one variant per tool, each carrying its validated
//! parameters; management variants also carry the admin token, so a request
//! needing credentials cannot be built without one. Unknown names are a
//! `DispatchError`; everything after name resolution ends in an
//! `OperationResult`.
//!
//! The dispatcher holds no mutable state and can be shared across threads.

use tracing::{debug, warn};

use crate::client::{self, NotifyClient};
use crate::config::{AdminToken, Capabilities, Config};
use crate::error::{ApiError, DispatchError};
use crate::http::{HttpRequest, HttpResponse};
use crate::tools::{self, ToolName, ToolSpec};
use crate::transport::{Transport, UreqTransport};
use crate::types::{CreateChannel, NotificationRequest, OperationResult, UpdateChannel};
use crate::validate::{self, Args};

#[derive(Debug, Clone)]
pub enum Operation {
    SendNotification(NotificationRequest),
    ListChannels {
        token: AdminToken,
    },
    CreateChannel {
        token: AdminToken,
        input: CreateChannel,
    },
    UpdateChannel {
        token: AdminToken,
        channel_id: String,
        input: UpdateChannel,
    },
    DeleteChannel {
        token: AdminToken,
        channel_id: String,
    },
}

impl Operation {
    /// Validate `args` for `tool`. The admin gate is checked before any
    /// field of a management tool.
    pub fn validate(
        tool: ToolName,
        args: &Args,
        caps: &Capabilities,
    ) -> Result<Self, OperationResult> {
        Ok(match tool {
            ToolName::SendNotification => {
                Operation::SendNotification(validate::send_notification(args)?)
            }
            ToolName::ListChannels => Operation::ListChannels {
                token: validate::admin_token(caps)?.clone(),
            },
            ToolName::CreateChannel => {
                let token = validate::admin_token(caps)?.clone();
                Operation::CreateChannel {
                    token,
                    input: validate::create_channel(args)?,
                }
            }
            ToolName::UpdateChannel => {
                let token = validate::admin_token(caps)?.clone();
                let (channel_id, input) = validate::update_channel(args)?;
                Operation::UpdateChannel {
                    token,
                    channel_id,
                    input,
                }
            }
            ToolName::DeleteChannel => {
                let token = validate::admin_token(caps)?.clone();
                Operation::DeleteChannel {
                    token,
                    channel_id: validate::delete_channel(args)?,
                }
            }
        })
    }

    pub fn tool(&self) -> ToolName {
        match self {
            Operation::SendNotification(_) => ToolName::SendNotification,
            Operation::ListChannels { .. } => ToolName::ListChannels,
            Operation::CreateChannel { .. } => ToolName::CreateChannel,
            Operation::UpdateChannel { .. } => ToolName::UpdateChannel,
            Operation::DeleteChannel { .. } => ToolName::DeleteChannel,
        }
    }
}

pub struct Dispatcher<T = UreqTransport> {
    client: NotifyClient,
    capabilities: Capabilities,
    transport: T,
}

impl Dispatcher<UreqTransport> {
    pub fn from_config(config: &Config) -> Self {
        Self::new(config, UreqTransport::new(config.timeout))
    }
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(config: &Config, transport: T) -> Self {
        Self {
            client: NotifyClient::new(&config.base_url),
            capabilities: config.capabilities(),
            transport,
        }
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Tools to advertise; shares `capabilities` with `call`.
    pub fn tools(&self) -> Vec<ToolSpec> {
        tools::catalogue(&self.capabilities)
    }

    pub fn call(&self, name: &str, args: &Args) -> Result<OperationResult, DispatchError> {
        let tool: ToolName = name.parse()?;
        match Operation::validate(tool, args, &self.capabilities) {
            Ok(operation) => Ok(self.run(&operation)),
            Err(rejection) => {
                debug!(tool = %tool, "rejected before sending");
                Ok(rejection)
            }
        }
    }

    pub fn run(&self, operation: &Operation) -> OperationResult {
        let tool = operation.tool();
        let request = match self.build(operation) {
            Ok(request) => request,
            Err(err) => {
                return OperationResult::error(format!("❌ Failed to {}: {err}", tool.verb()))
            }
        };

        debug!(tool = %tool, method = %request.method, "sending request");
        let response = match self.transport.execute(&request) {
            Ok(response) => response,
            Err(err) => {
                warn!(tool = %tool, error = %err, "transport failure");
                return client::transport_failure(tool, &err);
            }
        };
        debug!(tool = %tool, status = response.status, "received response");

        self.normalize(operation, response)
    }

    fn build(&self, operation: &Operation) -> Result<HttpRequest, ApiError> {
        match operation {
            Operation::SendNotification(input) => self.client.build_send_notification(input),
            Operation::ListChannels { token } => Ok(self.client.build_list_channels(token)),
            Operation::CreateChannel { token, input } => {
                self.client.build_create_channel(token, input)
            }
            Operation::UpdateChannel {
                token,
                channel_id,
                input,
            } => self.client.build_update_channel(token, channel_id, input),
            Operation::DeleteChannel { token, channel_id } => {
                Ok(self.client.build_delete_channel(token, channel_id))
            }
        }
    }

    fn normalize(&self, operation: &Operation, response: HttpResponse) -> OperationResult {
        match operation {
            Operation::SendNotification(_) => self.client.parse_send_notification(response),
            Operation::ListChannels { .. } => self.client.parse_list_channels(response),
            Operation::CreateChannel { .. } => self.client.parse_create_channel(response),
            Operation::UpdateChannel { .. } => self.client.parse_update_channel(response),
            Operation::DeleteChannel { channel_id, .. } => {
                self.client.parse_delete_channel(channel_id, response)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::{json, Value};

    use super::*;
    use crate::error::TransportError;
    use crate::http::HttpMethod;

    /// Records every request and answers with a canned response.
    struct StubTransport {
        requests: Mutex<Vec<HttpRequest>>,
        reply: Result<(u16, String), String>,
    }

    impl StubTransport {
        fn replying(status: u16, body: &str) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                reply: Ok((status, body.to_string())),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                reply: Err(message.to_string()),
            }
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn last(&self) -> HttpRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl Transport for StubTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.requests.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok((status, body)) => Ok(HttpResponse {
                    status: *status,
                    body: body.clone(),
                }),
                Err(message) => Err(TransportError::new(message.clone())),
            }
        }
    }

    fn args(value: Value) -> Args {
        value.as_object().cloned().unwrap()
    }

    fn dispatcher(transport: StubTransport, admin: bool) -> Dispatcher<StubTransport> {
        let config = Config::new("http://api.test")
            .with_admin_token(admin.then(|| "admin-secret".to_string()));
        Dispatcher::new(&config, transport)
    }

    #[test]
    fn unknown_tool_is_a_dispatch_error() {
        let d = dispatcher(StubTransport::replying(200, "{}"), true);
        let err = d.call("reboot_server", &Args::new()).unwrap_err();
        assert_eq!(err, DispatchError::UnknownOperation("reboot_server".to_string()));
        assert_eq!(d.transport.calls(), 0);
    }

    #[test]
    fn invalid_send_makes_no_network_call() {
        let d = dispatcher(StubTransport::replying(200, "{}"), false);
        for input in [
            json!({}),
            json!({"channel_token": "", "message": "hi"}),
            json!({"channel_token": "tok", "message": ""}),
            json!({"channel_token": "tok", "message": "hi", "priority": "urgent"}),
        ] {
            let result = d.call("send_notification", &args(input)).unwrap();
            assert!(result.is_error);
        }
        assert_eq!(d.transport.calls(), 0);
    }

    #[test]
    fn management_without_admin_token_makes_no_network_call() {
        let d = dispatcher(StubTransport::replying(200, "{}"), false);
        for (name, input) in [
            ("list_channels", json!({})),
            ("create_channel", json!({"name": "Alerts"})),
            ("update_channel", json!({"channel_id": "c1", "name": "x"})),
            ("delete_channel", json!({"channel_id": "c1"})),
        ] {
            let result = d.call(name, &args(input)).unwrap();
            assert!(result.is_error, "{name}");
            assert_eq!(result.text, validate::ADMIN_TOKEN_REQUIRED, "{name}");
        }
        assert_eq!(d.transport.calls(), 0);
    }

    #[test]
    fn admin_gate_precedes_field_validation() {
        let d = dispatcher(StubTransport::replying(200, "{}"), false);
        let result = d.call("update_channel", &Args::new()).unwrap();
        assert_eq!(result.text, validate::ADMIN_TOKEN_REQUIRED);
    }

    #[test]
    fn update_without_fields_makes_no_network_call() {
        let d = dispatcher(StubTransport::replying(200, "{}"), true);
        let result = d
            .call("update_channel", &args(json!({"channel_id": "c1"})))
            .unwrap();
        assert!(result.is_error);
        assert!(result.text.contains("No fields to update"));
        assert_eq!(d.transport.calls(), 0);
    }

    #[test]
    fn send_body_contains_only_message_when_minimal() {
        let d = dispatcher(
            StubTransport::replying(200, r#"{"subscribers_notified":5,"notification_id":"abc"}"#),
            false,
        );
        let result = d
            .call(
                "send_notification",
                &args(json!({"channel_token": "tok", "message": "hello"})),
            )
            .unwrap();
        assert!(!result.is_error);
        assert!(result.text.contains('5'));
        assert!(result.text.contains("abc"));

        let sent = d.transport.last();
        assert_eq!(sent.method, HttpMethod::Post);
        assert_eq!(sent.path, "http://api.test/webhook/tok");
        let body: Value = serde_json::from_str(sent.body.as_deref().unwrap()).unwrap();
        let keys: Vec<&str> = body.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["message"]);
    }

    #[test]
    fn non_string_title_reaches_the_body() {
        let d = dispatcher(StubTransport::replying(200, "{}"), false);
        let result = d
            .call(
                "send_notification",
                &args(json!({"channel_token": "t", "message": "m", "title": {"rich": true}})),
            )
            .unwrap();
        assert!(!result.is_error);

        let body: Value = serde_json::from_str(d.transport.last().body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"message": "m", "title": {"rich": true}}));
    }

    #[test]
    fn remote_error_message_is_surfaced() {
        let d = dispatcher(
            StubTransport::replying(404, r#"{"error":{"message":"Channel not found"}}"#),
            false,
        );
        let result = d
            .call(
                "send_notification",
                &args(json!({"channel_token": "nope", "message": "hi"})),
            )
            .unwrap();
        assert!(result.is_error);
        assert!(result.text.contains("Channel not found"));
    }

    #[test]
    fn transport_failure_is_an_error_result() {
        let d = dispatcher(StubTransport::failing("dns error: no such host"), true);
        let result = d.call("list_channels", &Args::new()).unwrap();
        assert!(result.is_error);
        assert_eq!(
            result.text,
            "❌ Failed to list channels: dns error: no such host"
        );
        assert_eq!(d.transport.calls(), 1);
    }

    #[test]
    fn management_requests_carry_bearer_token() {
        let d = dispatcher(StubTransport::replying(204, ""), true);
        let result = d
            .call("delete_channel", &args(json!({"channel_id": "c7"})))
            .unwrap();
        assert!(!result.is_error);
        let sent = d.transport.last();
        assert_eq!(sent.method, HttpMethod::Delete);
        assert_eq!(sent.path, "http://api.test/api/v1/channels/c7");
        assert_eq!(sent.header("authorization"), Some("Bearer admin-secret"));
    }

    #[test]
    fn advertised_tools_follow_capabilities() {
        let without = dispatcher(StubTransport::replying(200, "{}"), false);
        assert_eq!(without.tools().len(), 1);
        assert!(!without.capabilities().channel_management());

        let with = dispatcher(StubTransport::replying(200, "{}"), true);
        assert_eq!(with.tools().len(), 5);
    }
}
