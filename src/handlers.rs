//! HTTP route handlers for the optional status server.
//!
//! The server only reads: it reports liveness and the bot's current cursor.

use axum::{extract::State, response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::cursor::{CursorStore, MentionId};
use crate::twitter::BotIdentity;

/// Shared state of the status server.
#[derive(Clone)]
pub struct AppState {
    pub bot: BotIdentity,
    pub store: Arc<dyn CursorStore>,
    pub poll_interval: Duration,
}

/// Builds the status router (`/health`, `/status`).
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/status", get(handle_status))
        .with_state(state)
}

/// Handles GET requests to the `/health` endpoint.
///
/// # Example Response
///
/// ```json
/// {
///   "status": "healthy",
///   "service": "replybot"
/// }
/// ```
pub async fn handle_health() -> Json<Value> {
    Json(json!({"status": "healthy", "service": "replybot"}))
}

/// Handles GET requests to the `/status` endpoint.
///
/// Reports the bot account, the last processed mention id (`null` before the
/// first one) and the poll interval in seconds.
pub async fn handle_status(State(state): State<AppState>) -> Json<Value> {
    let cursor = state.store.load().await;
    Json(json!({
        "bot_id": state.bot.id,
        "bot_username": state.bot.username,
        "last_mention_id": cursor.as_ref().map(MentionId::as_str),
        "poll_interval_secs": state.poll_interval.as_secs(),
    }))
}
