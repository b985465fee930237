use std::sync::Arc;

use crate::chat::service::ChatService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Owns every live chat session and the ticket store behind them.
    pub chat: Arc<ChatService>,
}
