//! Tool catalogue advertised at the discovery boundary.

use std::fmt;
use std::str::FromStr;

use serde_json::{json, Value};

use crate::config::Capabilities;
use crate::error::DispatchError;

/// The fixed set of operations this adapter understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    SendNotification,
    ListChannels,
    CreateChannel,
    UpdateChannel,
    DeleteChannel,
}

impl ToolName {
    pub const ALL: [ToolName; 5] = [
        ToolName::SendNotification,
        ToolName::ListChannels,
        ToolName::CreateChannel,
        ToolName::UpdateChannel,
        ToolName::DeleteChannel,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::SendNotification => "send_notification",
            ToolName::ListChannels => "list_channels",
            ToolName::CreateChannel => "create_channel",
            ToolName::UpdateChannel => "update_channel",
            ToolName::DeleteChannel => "delete_channel",
        }
    }

    /// Phrase used in "Failed to ..." messages.
    pub fn verb(self) -> &'static str {
        match self {
            ToolName::SendNotification => "send notification",
            ToolName::ListChannels => "list channels",
            ToolName::CreateChannel => "create channel",
            ToolName::UpdateChannel => "update channel",
            ToolName::DeleteChannel => "delete channel",
        }
    }

    pub fn requires_admin(self) -> bool {
        !matches!(self, ToolName::SendNotification)
    }
}

impl FromStr for ToolName {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .into_iter()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| DispatchError::UnknownOperation(s.to_string()))
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: ToolName,
    pub description: &'static str,
    pub input_schema: Value,
}

/// Tools available under `caps`. Management tools appear only when an admin
/// token is configured.
pub fn catalogue(caps: &Capabilities) -> Vec<ToolSpec> {
    ToolName::ALL
        .into_iter()
        .filter(|tool| !tool.requires_admin() || caps.channel_management())
        .map(spec)
        .collect()
}

fn spec(name: ToolName) -> ToolSpec {
    let (description, input_schema) = match name {
        ToolName::SendNotification => (
            "Send a push notification to every subscriber of a channel. Required: channel_token, message. Optional: title, priority (low/normal/high), payload.",
            json!({
                "type": "object",
                "required": ["channel_token", "message"],
                "properties": {
                    "channel_token": { "type": "string", "description": "Webhook token of the target channel" },
                    "message": { "type": "string", "description": "Notification body" },
                    "title": { "type": "string", "description": "Notification title" },
                    "priority": { "type": "string", "enum": ["low", "normal", "high"] },
                    "payload": { "description": "Arbitrary data delivered with the notification" }
                }
            }),
        ),
        ToolName::ListChannels => (
            "List all notification channels with their webhook URLs and notification counts.",
            json!({ "type": "object", "properties": {} }),
        ),
        ToolName::CreateChannel => (
            "Create a notification channel. Required: name. Optional: description, color, icon.",
            json!({
                "type": "object",
                "required": ["name"],
                "properties": {
                    "name": { "type": "string" },
                    "description": { "type": "string" },
                    "color": { "type": "string", "description": "Hex color, e.g. #3b82f6" },
                    "icon": { "type": "string" }
                }
            }),
        ),
        ToolName::UpdateChannel => (
            "Update a channel. Required: channel_id and at least one of name, description, color, icon.",
            json!({
                "type": "object",
                "required": ["channel_id"],
                "properties": {
                    "channel_id": { "type": "string" },
                    "name": { "type": "string" },
                    "description": { "type": "string" },
                    "color": { "type": "string" },
                    "icon": { "type": "string" }
                }
            }),
        ),
        ToolName::DeleteChannel => (
            "Delete a channel and its webhook. Required: channel_id.",
            json!({
                "type": "object",
                "required": ["channel_id"],
                "properties": {
                    "channel_id": { "type": "string" }
                }
            }),
        ),
    };
    ToolSpec {
        name,
        description,
        input_schema,
    }
}
