//! Core of the webhook notification adapter.
//!
//! # Overview
//! Turns a tool call (name + JSON arguments) into a single HTTP request
//! against the remote webhook API and maps the response to a human-readable
//! `OperationResult`.
//!
//! # Design
//! - `validate` checks arguments before anything is built.
//! - `NotifyClient` is stateless: `build_*` produce `HttpRequest`s and
//!   `parse_*` normalize `HttpResponse`s, both without I/O.
//! - `Transport` is the single I/O seam; `UreqTransport` is the real one.
//! - `Dispatcher` sequences the above per call and shares nothing mutable,
//!   so calls can run concurrently.
//! - `Capabilities` is derived once from `Config` and gates both the
//!   advertised tool list and the management operations.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod fields;
pub mod http;
pub mod tools;
pub mod transport;
pub mod types;
pub mod validate;

pub use client::NotifyClient;
pub use config::{AdminToken, Capabilities, Config};
pub use dispatch::{Dispatcher, Operation};
pub use error::{ApiError, DispatchError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use tools::{ToolName, ToolSpec};
pub use transport::{Transport, UreqTransport};
pub use types::{
    ChannelDescriptor, CreateChannel, NotificationRequest, OperationResult, Priority,
    UpdateChannel,
};
pub use validate::Args;
