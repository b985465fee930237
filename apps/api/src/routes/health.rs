use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status, version, ticket backend and live session count.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "cvision-support-chat",
        "ticket_backend": state.chat.ticket_backend(),
        "active_sessions": state.chat.session_count().await
    }))
}
