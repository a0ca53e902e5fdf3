//! Request-scoped value types.
//!
//! # Design
//! Outbound payloads use `Option` fields with `skip_serializing_if`, so a
//! field the caller did not supply is omitted from the JSON body rather than
//! sent as `null`. `UpdateChannel` relies on this to tell "set to empty
//! string" (`Some("")`) apart from "leave unchanged" (`None`).
//!
//! `ChannelDescriptor` is read leniently from whatever JSON the service
//! returns; nothing here is persisted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fields;

/// Delivery priority understood by the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Normal,
    High,
}

impl Priority {
    pub const ALLOWED: [&'static str; 3] = ["low", "normal", "high"];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    /// Case-sensitive: `"High"` is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            other => Err(format!(
                "Invalid priority \"{other}\". Must be one of: {}",
                Priority::ALLOWED.join(", ")
            )),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated send-notification call.
///
/// `channel_token` goes into the URL path and is not part of the body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationRequest {
    #[serde(skip)]
    pub channel_token: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

/// Body for creating a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateChannel {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Body for a partial channel update. Only `Some` fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateChannel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl UpdateChannel {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.color.is_none()
            && self.icon.is_none()
    }
}

/// A channel as reported by the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelDescriptor {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub webhook_url: String,
    pub notification_count: String,
}

impl ChannelDescriptor {
    /// Read a channel from a JSON object, tolerating missing fields and
    /// either key casing.
    pub fn from_value(value: &Value) -> Self {
        let optional = |key: &str| {
            fields::first_present(value, &[key])
                .map(fields::display)
                .filter(|s| !s.is_empty())
        };
        Self {
            id: fields::display_or(value, &["id"], "unknown"),
            name: fields::display_or(value, &["name"], "unknown"),
            description: optional("description"),
            color: optional("color"),
            icon: optional("icon"),
            webhook_url: fields::display_or(value, fields::WEBHOOK_URL, "unknown"),
            notification_count: fields::display_or(value, fields::NOTIFICATION_COUNT, "0"),
        }
    }
}

/// The value handed back to the caller for every known operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationResult {
    pub text: String,
    pub is_error: bool,
}

impl OperationResult {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}
