//! Error types for the notification client.
//!
//! # Design
//! Most failures are reported to the caller as an `OperationResult` with
//! `is_error` set, not as `Err`. The types here cover the few places where a
//! Rust error is the right shape: body serialization, a transport that could
//! not complete the round-trip, and an operation name that matches nothing.

use thiserror::Error;

/// Errors raised while building a request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The HTTP round-trip did not produce a response (DNS, connect, timeout,
/// or a body that could not be read).
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Errors returned by the dispatcher before any operation runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// The requested tool name is not one of the known operations.
    #[error("Unknown tool: {0}")]
    UnknownOperation(String),
}
