//! Static input checks, run before any request is built.
//!
//! Every check returns the rejection as a ready-made `OperationResult`, so
//! the dispatcher can hand it straight back without touching the network.

use serde_json::{Map, Value};

use crate::config::{AdminToken, Capabilities};
use crate::types::{CreateChannel, NotificationRequest, OperationResult, Priority, UpdateChannel};

pub type Args = Map<String, Value>;

pub const ADMIN_TOKEN_REQUIRED: &str = "❌ Channel management is not available: no admin token configured. \
Set NOTIFY_ADMIN_TOKEN (or pass --admin-token) when starting the server.";

pub fn send_notification(args: &Args) -> Result<NotificationRequest, OperationResult> {
    let channel_token = required_string(args, "channel_token")?;
    let message = required_string(args, "message")?;
    let title = passthrough(args, "title");
    let priority = match optional_string(args, "priority")? {
        Some(raw) => Some(
            raw.parse::<Priority>()
                .map_err(|reason| OperationResult::error(format!("❌ {reason}")))?,
        ),
        None => None,
    };
    let payload = passthrough(args, "payload");

    Ok(NotificationRequest {
        channel_token,
        message,
        title,
        priority,
        payload,
    })
}

/// Gate for the four channel-management operations.
pub fn admin_token(caps: &Capabilities) -> Result<&AdminToken, OperationResult> {
    caps.admin_token()
        .ok_or_else(|| OperationResult::error(ADMIN_TOKEN_REQUIRED))
}

pub fn create_channel(args: &Args) -> Result<CreateChannel, OperationResult> {
    Ok(CreateChannel {
        name: required_string(args, "name")?,
        description: optional_string(args, "description")?,
        color: optional_string(args, "color")?,
        icon: optional_string(args, "icon")?,
    })
}

pub fn update_channel(args: &Args) -> Result<(String, UpdateChannel), OperationResult> {
    let channel_id = required_string(args, "channel_id")?;
    let update = UpdateChannel {
        name: optional_string(args, "name")?,
        description: optional_string(args, "description")?,
        color: optional_string(args, "color")?,
        icon: optional_string(args, "icon")?,
    };
    if update.is_empty() {
        return Err(OperationResult::error(
            "❌ No fields to update. Provide at least one of: name, description, color, icon",
        ));
    }
    Ok((channel_id, update))
}

pub fn delete_channel(args: &Args) -> Result<String, OperationResult> {
    required_string(args, "channel_id")
}

fn required_string(args: &Args, field: &str) -> Result<String, OperationResult> {
    match args.get(field) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        _ => Err(OperationResult::error(format!(
            "❌ Missing required parameter: {field} (must be a non-empty string)"
        ))),
    }
}

/// Absent and `null` both mean "not supplied"; an empty string is kept.
fn optional_string(args: &Args, field: &str) -> Result<Option<String>, OperationResult> {
    match args.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(OperationResult::error(format!(
            "❌ Invalid parameter: {field} must be a string"
        ))),
    }
}

/// Forwarded as given; `null` means "not supplied".
fn passthrough(args: &Args, field: &str) -> Option<Value> {
    args.get(field).filter(|v| !v.is_null()).cloned()
}
