//! In-memory stand-in for the remote webhook and channel-management API.
//!
//! Mirrors the wire shapes the adapter talks to: `POST /webhook/{token}` for
//! sending and bearer-authenticated `/api/v1/channels` for management. Error
//! bodies use `{"error":{"message":...}}`. Received notification bodies are
//! kept verbatim and exposed at `GET /_mock/notifications` so tests can check
//! exactly what went over the wire.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Subscribers every new channel starts with.
pub const DEFAULT_SUBSCRIBERS: u64 = 3;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub webhook_url: String,
    pub notification_count: u64,
    #[serde(skip)]
    pub token: String,
    #[serde(skip)]
    pub subscribers: u64,
}

impl Channel {
    /// The webhook token is the last path segment of the webhook URL.
    pub fn webhook_token(&self) -> &str {
        self.webhook_url.rsplit('/').next().unwrap_or_default()
    }
}

#[derive(Deserialize)]
pub struct CreateChannel {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateChannel {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DeliveredNotification {
    pub channel_id: String,
    pub body: Value,
}

#[derive(Default)]
struct Store {
    channels: HashMap<String, Channel>,
    notifications: Vec<DeliveredNotification>,
}

#[derive(Clone)]
pub struct MockState {
    store: Arc<RwLock<Store>>,
    admin_token: Arc<str>,
    public_url: Arc<str>,
}

impl MockState {
    /// `public_url` is the base used when rendering channel webhook URLs.
    pub fn new(admin_token: &str, public_url: &str) -> Self {
        Self {
            store: Arc::new(RwLock::new(Store::default())),
            admin_token: Arc::from(admin_token),
            public_url: Arc::from(public_url.trim_end_matches('/')),
        }
    }
}

type ApiError = (StatusCode, Json<Value>);
type ApiResult<T> = Result<T, ApiError>;

fn api_error(status: StatusCode, message: &str) -> ApiError {
    (status, Json(json!({ "error": { "message": message } })))
}

pub fn app(state: MockState) -> Router {
    Router::new()
        .route("/webhook/{token}", post(send_notification))
        .route("/api/v1/channels", get(list_channels).post(create_channel))
        .route(
            "/api/v1/channels/{id}",
            patch(update_channel).delete(delete_channel),
        )
        .route("/_mock/notifications", get(list_notifications))
        .with_state(state)
}

pub async fn run(listener: TcpListener, state: MockState) -> Result<(), std::io::Error> {
    axum::serve(listener, app(state)).await
}

fn authorize(state: &MockState, headers: &HeaderMap) -> ApiResult<()> {
    let expected = format!("Bearer {}", state.admin_token);
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err(api_error(
            StatusCode::UNAUTHORIZED,
            "Invalid or missing API key",
        )),
    }
}

async fn send_notification(
    State(state): State<MockState>,
    Path(token): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let has_message = body
        .get("message")
        .and_then(Value::as_str)
        .is_some_and(|m| !m.is_empty());
    if !has_message {
        return Err(api_error(StatusCode::BAD_REQUEST, "message is required"));
    }

    let mut store = state.store.write().await;
    let channel = store
        .channels
        .values_mut()
        .find(|c| c.token == token)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Channel not found"))?;
    channel.notification_count += 1;
    let channel_id = channel.id.clone();
    let subscribers = channel.subscribers;
    store
        .notifications
        .push(DeliveredNotification { channel_id, body });

    Ok(Json(json!({
        "success": true,
        "notification_id": format!("ntf_{}", Uuid::new_v4().simple()),
        "subscribers_notified": subscribers,
    })))
}

async fn list_channels(
    State(state): State<MockState>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    authorize(&state, &headers)?;
    let store = state.store.read().await;
    let mut channels: Vec<Channel> = store.channels.values().cloned().collect();
    channels.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(json!({ "channels": channels })))
}

async fn create_channel(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(input): Json<CreateChannel>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    authorize(&state, &headers)?;
    let name = input
        .name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "name is required"))?;

    let token = Uuid::new_v4().simple().to_string();
    let channel = Channel {
        id: format!("ch_{}", Uuid::new_v4().simple()),
        name,
        description: input.description,
        color: input.color,
        icon: input.icon,
        webhook_url: format!("{}/webhook/{token}", state.public_url),
        notification_count: 0,
        token,
        subscribers: DEFAULT_SUBSCRIBERS,
    };
    state
        .store
        .write()
        .await
        .channels
        .insert(channel.id.clone(), channel.clone());
    Ok((StatusCode::CREATED, Json(json!({ "channel": channel }))))
}

async fn update_channel(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<UpdateChannel>,
) -> ApiResult<Json<Channel>> {
    authorize(&state, &headers)?;
    let mut store = state.store.write().await;
    let channel = store
        .channels
        .get_mut(&id)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Channel not found"))?;
    if let Some(name) = input.name {
        channel.name = name;
    }
    if let Some(description) = input.description {
        channel.description = Some(description);
    }
    if let Some(color) = input.color {
        channel.color = Some(color);
    }
    if let Some(icon) = input.icon {
        channel.icon = Some(icon);
    }
    Ok(Json(channel.clone()))
}

async fn delete_channel(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    authorize(&state, &headers)?;
    let removed = state
        .store
        .write()
        .await
        .channels
        .remove(&id)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Channel not found"))?;
    Ok(Json(json!({ "success": true, "name": removed.name })))
}

async fn list_notifications(State(state): State<MockState>) -> Json<Vec<DeliveredNotification>> {
    Json(state.store.read().await.notifications.clone())
}
