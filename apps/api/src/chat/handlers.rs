//! Axum route handlers for the Chat API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chat::service::{SessionSnapshot, TurnResult};
use crate::errors::AppError;
use crate::models::chat::{QuickAction, QUICK_ACTION_MENU};
use crate::models::ticket::SupportTicket;
use crate::state::AppState;

const MAX_MESSAGE_CHARS: usize = 2000;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct QuickActionRequest {
    pub action: QuickAction,
}

#[derive(Debug, Serialize)]
pub struct QuickActionView {
    pub action: QuickAction,
    pub label: &'static str,
    pub message: Option<&'static str>,
}

impl From<QuickAction> for QuickActionView {
    fn from(action: QuickAction) -> Self {
        Self {
            action,
            label: action.label(),
            message: action.message(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/chat/sessions
///
/// Opens a session and returns the welcome message with the quick-action menu.
pub async fn handle_start_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionSnapshot>) {
    let snapshot = state.chat.start_session().await;
    (StatusCode::CREATED, Json(snapshot))
}

/// GET /api/v1/chat/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(state.chat.snapshot(id).await?))
}

/// DELETE /api/v1/chat/sessions/:id
pub async fn handle_close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.chat.close_session(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/chat/sessions/:id/reset
pub async fn handle_reset_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(state.chat.reset_session(id).await?))
}

/// POST /api/v1/chat/sessions/:id/messages
///
/// Responds after the typing delay. Concurrent calls for the same session
/// are answered one at a time, in arrival order.
pub async fn handle_send_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<TurnResult>, AppError> {
    if request.text.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::Validation(format!(
            "text must be at most {MAX_MESSAGE_CHARS} characters"
        )));
    }

    Ok(Json(state.chat.submit_message(id, &request.text).await?))
}

/// POST /api/v1/chat/sessions/:id/actions
pub async fn handle_quick_action(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<QuickActionRequest>,
) -> Result<Json<TurnResult>, AppError> {
    Ok(Json(state.chat.trigger_action(id, request.action).await?))
}

/// GET /api/v1/chat/quick-actions
pub async fn handle_quick_actions() -> Json<Vec<QuickActionView>> {
    Json(
        QUICK_ACTION_MENU
            .iter()
            .copied()
            .map(QuickActionView::from)
            .collect(),
    )
}

/// GET /api/v1/support/tickets
pub async fn handle_list_tickets(
    State(state): State<AppState>,
) -> Result<Json<Vec<SupportTicket>>, AppError> {
    Ok(Json(state.chat.list_tickets().await?))
}
