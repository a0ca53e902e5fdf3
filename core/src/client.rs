//! Stateless request builder and response normalizer for the webhook API.
//!
//! # Design
//! `NotifyClient` holds only a `base_url`. Each operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method that
//! turns the `HttpResponse` into an `OperationResult`. The round-trip itself
//! happens elsewhere (see `transport`), so both halves are pure.
//!
//! Parsing never fails: bodies that are not JSON are treated as carrying no
//! structured fields and the documented fallbacks apply.

use serde_json::Value;

use crate::config::AdminToken;
use crate::error::{ApiError, TransportError};
use crate::fields;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::tools::ToolName;
use crate::types::{
    ChannelDescriptor, CreateChannel, NotificationRequest, OperationResult, UpdateChannel,
};

#[derive(Debug, Clone)]
pub struct NotifyClient {
    base_url: String,
}

impl NotifyClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_send_notification(
        &self,
        input: &NotificationRequest,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input)?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/webhook/{}", self.base_url, input.channel_token),
            headers: vec![json_content_type()],
            body: Some(body),
        })
    }

    pub fn build_list_channels(&self, token: &AdminToken) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: self.channels_url(),
            headers: vec![bearer(token)],
            body: None,
        }
    }

    pub fn build_create_channel(
        &self,
        token: &AdminToken,
        input: &CreateChannel,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input)?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: self.channels_url(),
            headers: vec![bearer(token), json_content_type()],
            body: Some(body),
        })
    }

    pub fn build_update_channel(
        &self,
        token: &AdminToken,
        channel_id: &str,
        input: &UpdateChannel,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input)?;
        Ok(HttpRequest {
            method: HttpMethod::Patch,
            path: format!("{}/{channel_id}", self.channels_url()),
            headers: vec![bearer(token), json_content_type()],
            body: Some(body),
        })
    }

    pub fn build_delete_channel(&self, token: &AdminToken, channel_id: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            path: format!("{}/{channel_id}", self.channels_url()),
            headers: vec![bearer(token)],
            body: None,
        }
    }

    pub fn parse_send_notification(&self, response: HttpResponse) -> OperationResult {
        let body = match check_status(ToolName::SendNotification, &response) {
            Ok(body) => body,
            Err(failure) => return failure,
        };
        let subscribers = fields::display_or(&body, fields::SUBSCRIBERS_NOTIFIED, "0");
        let id = fields::display_or(&body, fields::NOTIFICATION_ID, "unknown");
        OperationResult::success(format!(
            "✅ Notification sent successfully!\n\nSubscribers notified: {subscribers}\nNotification ID: {id}"
        ))
    }

    pub fn parse_list_channels(&self, response: HttpResponse) -> OperationResult {
        let body = match check_status(ToolName::ListChannels, &response) {
            Ok(body) => body,
            Err(failure) => return failure,
        };
        let channels: Vec<ChannelDescriptor> = body
            .as_array()
            .or_else(|| body.get("channels").and_then(Value::as_array))
            .map(|items| items.iter().map(ChannelDescriptor::from_value).collect())
            .unwrap_or_default();

        if channels.is_empty() {
            return OperationResult::success(
                "📭 No channels yet. Create one with create_channel to start sending notifications.",
            );
        }

        let entries: Vec<String> = channels
            .iter()
            .enumerate()
            .map(|(i, channel)| render_list_entry(i + 1, channel))
            .collect();
        OperationResult::success(format!(
            "📋 Found {} channel(s):\n\n{}",
            channels.len(),
            entries.join("\n\n")
        ))
    }

    pub fn parse_create_channel(&self, response: HttpResponse) -> OperationResult {
        let body = match check_status(ToolName::CreateChannel, &response) {
            Ok(body) => body,
            Err(failure) => return failure,
        };
        let channel = ChannelDescriptor::from_value(unwrap_channel(&body));
        OperationResult::success(format!(
            "✅ Channel created successfully!\n\n{}\n\nUse the token at the end of the webhook URL with send_notification.",
            render_channel_info(&channel)
        ))
    }

    pub fn parse_update_channel(&self, response: HttpResponse) -> OperationResult {
        let body = match check_status(ToolName::UpdateChannel, &response) {
            Ok(body) => body,
            Err(failure) => return failure,
        };
        let channel = ChannelDescriptor::from_value(unwrap_channel(&body));
        OperationResult::success(format!(
            "✅ Channel updated successfully!\n\n{}",
            render_channel_info(&channel)
        ))
    }

    /// `channel_id` is echoed back since a 204 carries no body.
    pub fn parse_delete_channel(&self, channel_id: &str, response: HttpResponse) -> OperationResult {
        let body = match check_status(ToolName::DeleteChannel, &response) {
            Ok(body) => body,
            Err(failure) => return failure,
        };
        let name = fields::first_present(&body, &["name"])
            .or_else(|| body.get("channel").and_then(|c| fields::first_present(c, &["name"])))
            .map(fields::display)
            .unwrap_or_else(|| "unknown".to_string());
        OperationResult::success(format!(
            "🗑️ Channel \"{name}\" deleted successfully (ID: {channel_id})."
        ))
    }

    fn channels_url(&self) -> String {
        format!("{}/api/v1/channels", self.base_url)
    }
}

/// Result for a round-trip that never produced a response.
pub fn transport_failure(tool: ToolName, err: &TransportError) -> OperationResult {
    OperationResult::error(format!("❌ Failed to {}: {}", tool.verb(), err.message()))
}

/// Map a non-2xx status to a failure result, or return the parsed body
/// (`Value::Null` when it is not JSON).
fn check_status(tool: ToolName, response: &HttpResponse) -> Result<Value, OperationResult> {
    let body = serde_json::from_str::<Value>(&response.body).unwrap_or(Value::Null);
    if response.is_success() {
        return Ok(body);
    }
    let reason = body
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| {
            let raw = response.body.trim();
            (!raw.is_empty()).then(|| raw.to_string())
        })
        .unwrap_or_else(|| format!("HTTP {}", response.status));
    Err(OperationResult::error(format!(
        "❌ Failed to {}: {reason}",
        tool.verb()
    )))
}

fn unwrap_channel(body: &Value) -> &Value {
    body.get("channel").filter(|c| c.is_object()).unwrap_or(body)
}

fn render_channel_info(channel: &ChannelDescriptor) -> String {
    format!(
        "Name: {}\nID: {}\nWebhook URL: {}",
        channel.name, channel.id, channel.webhook_url
    )
}

fn render_list_entry(index: usize, channel: &ChannelDescriptor) -> String {
    let mut entry = format!(
        "{index}. {}\n   ID: {}\n   Webhook URL: {}\n   Notifications: {}",
        channel.name, channel.id, channel.webhook_url, channel.notification_count
    );
    if let Some(description) = &channel.description {
        entry.push_str(&format!("\n   Description: {description}"));
    }
    entry
}

fn json_content_type() -> (String, String) {
    ("content-type".to_string(), "application/json".to_string())
}

fn bearer(token: &AdminToken) -> (String, String) {
    ("authorization".to_string(), format!("Bearer {}", token.expose()))
}
