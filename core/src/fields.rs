//! Lenient field lookup for JSON bodies returned by the remote service.
//!
//! The service is not consistent about key casing, so each logical field is
//! looked up through an ordered list of candidate names. The first candidate
//! that is present and not `null` wins.

use serde_json::Value;

pub const SUBSCRIBERS_NOTIFIED: &[&str] = &["subscribers_notified", "subscribersNotified"];
pub const NOTIFICATION_ID: &[&str] = &["notification_id", "notificationId"];
pub const WEBHOOK_URL: &[&str] = &["webhookUrl", "webhook_url"];
pub const NOTIFICATION_COUNT: &[&str] = &["notificationCount", "notification_count"];

/// Return the first candidate field of `value` that is present and non-null.
pub fn first_present<'a>(value: &'a Value, candidates: &[&str]) -> Option<&'a Value> {
    candidates
        .iter()
        .filter_map(|key| value.get(*key))
        .find(|field| !field.is_null())
}

/// Render a scalar for display: strings without quotes, everything else as JSON.
pub fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `first_present` rendered for display, or `default` when absent.
pub fn display_or(value: &Value, candidates: &[&str], default: &str) -> String {
    first_present(value, candidates)
        .map(display)
        .unwrap_or_else(|| default.to_string())
}
