pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::chat::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Chat API
        .route(
            "/api/v1/chat/sessions",
            post(handlers::handle_start_session),
        )
        .route(
            "/api/v1/chat/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_close_session),
        )
        .route(
            "/api/v1/chat/sessions/:id/reset",
            post(handlers::handle_reset_session),
        )
        .route(
            "/api/v1/chat/sessions/:id/messages",
            post(handlers::handle_send_message),
        )
        .route(
            "/api/v1/chat/sessions/:id/actions",
            post(handlers::handle_quick_action),
        )
        .route(
            "/api/v1/chat/quick-actions",
            get(handlers::handle_quick_actions),
        )
        // Support tickets
        .route("/api/v1/support/tickets", get(handlers::handle_list_tickets))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::chat::knowledge::KnowledgeBase;
    use crate::chat::service::{ChatService, ServiceSettings};
    use crate::tickets::MemoryTicketStore;

    fn app() -> Router {
        let chat = ChatService::new(
            Arc::new(KnowledgeBase::default()),
            Arc::new(MemoryTicketStore::default()),
            ServiceSettings {
                typing_delay: Duration::ZERO,
                handoff_delay: Duration::ZERO,
                ..ServiceSettings::default()
            },
        );
        build_router(AppState {
            chat: Arc::new(chat),
        })
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        // axum's extractor rejections are plain text
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn start(app: &Router) -> String {
        let (status, body) = send(app, Method::POST, "/api/v1/chat/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        body["session_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_reports_backend() {
        let app = app();
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["ticket_backend"], "memory");
    }

    #[tokio::test]
    async fn test_start_session_has_welcome_and_menu() {
        let app = app();
        let (_, body) = send(&app, Method::POST, "/api/v1/chat/sessions", None).await;
        assert_eq!(body["state"], "normal");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["quick_actions"][0], "upload_cv");
    }

    #[tokio::test]
    async fn test_full_ticket_flow_over_http() {
        let app = app();
        let id = start(&app).await;
        let messages = format!("/api/v1/chat/sessions/{id}/messages");

        let (_, body) = send(&app, Method::POST, &messages, Some(json!({"text": "agent"}))).await;
        assert_eq!(body["state"], "awaiting_email");

        let (_, body) = send(&app, Method::POST, &messages, Some(json!({"text": "not-an-email"}))).await;
        assert_eq!(body["state"], "awaiting_email");
        assert_eq!(body["outcome"]["kind"], "invalid_email");

        let (_, body) = send(&app, Method::POST, &messages, Some(json!({"text": "user@example.com"}))).await;
        assert_eq!(body["state"], "awaiting_message");

        let (_, body) = send(&app, Method::POST, &messages, Some(json!({"text": "my CV didn't upload"}))).await;
        assert_eq!(body["state"], "normal");
        assert_eq!(body["outcome"]["kind"], "ticket_created");

        let (status, tickets) = send(&app, Method::GET, "/api/v1/support/tickets", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(tickets.as_array().unwrap().len(), 1);
        assert_eq!(tickets[0]["message"], "my CV didn't upload");
    }

    #[tokio::test]
    async fn test_quick_action_dispatch() {
        let app = app();
        let id = start(&app).await;
        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/v1/chat/sessions/{id}/actions"),
            Some(json!({"action": "continue_with_ai"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["failed_attempts"], 0);
        assert!(body["outcome"].is_null());
    }

    #[tokio::test]
    async fn test_unknown_action_is_rejected() {
        let app = app();
        let id = start(&app).await;
        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/api/v1/chat/sessions/{id}/actions"),
            Some(json!({"action": "onclick=alert(1)"})),
        )
        .await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_unknown_session_returns_404_envelope() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/api/v1/chat/sessions/{}", Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_oversized_message_is_rejected() {
        let app = app();
        let id = start(&app).await;
        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/v1/chat/sessions/{id}/messages"),
            Some(json!({"text": "a".repeat(2001)})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_reset_and_delete_session() {
        let app = app();
        let id = start(&app).await;
        let uri = format!("/api/v1/chat/sessions/{id}");

        let (status, body) = send(&app, Method::POST, &format!("{uri}/reset"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_quick_action_menu_lists_labels() {
        let app = app();
        let (status, body) = send(&app, Method::GET, "/api/v1/chat/quick-actions", None).await;
        assert_eq!(status, StatusCode::OK);
        let menu = body.as_array().unwrap();
        assert_eq!(menu.len(), 5);
        assert_eq!(menu[4]["action"], "talk_to_human");
        assert_eq!(menu[4]["label"], "Talk to Human");
    }
}
