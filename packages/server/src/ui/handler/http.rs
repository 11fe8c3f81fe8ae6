//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::domain::{QueueEntry, Session};
use crate::ui::state::AppState;

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Debug endpoint to inspect the current waiting queue (for testing purposes)
pub async fn debug_queue_state(State(state): State<Arc<AppState>>) -> Json<Vec<QueueEntry>> {
    Json(state.queue_repository.all_ordered().await)
}

/// Debug endpoint to inspect stored sessions, active and ended (for testing purposes)
pub async fn debug_session_state(State(state): State<Arc<AppState>>) -> Json<Vec<Session>> {
    Json(state.session_repository.all().await)
}
