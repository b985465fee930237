mod chat;
mod config;
mod errors;
mod models;
mod routes;
mod state;
mod tickets;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::chat::engine::EngineSettings;
use crate::chat::knowledge::KnowledgeBase;
use crate::chat::service::{sweep_idle_sessions, ChatService, ServiceSettings};
use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;
use crate::tickets::build_ticket_store;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CVision support chat v{}", env!("CARGO_PKG_VERSION"));

    // Initialize ticket store
    let tickets = build_ticket_store(&config)?;
    info!("Ticket store initialized (backend: {})", tickets.backend());

    let knowledge = Arc::new(KnowledgeBase::default());
    info!(
        "Knowledge base loaded: {} categories",
        knowledge.entries().len()
    );

    let settings = ServiceSettings {
        typing_delay: config.typing_delay,
        handoff_delay: config.handoff_delay,
        idle_ttl: config.session_idle_ttl,
        engine: EngineSettings {
            escalation_threshold: config.escalation_threshold,
            ..EngineSettings::default()
        },
    };
    info!(
        "Chat settings: typing delay {}ms, hand-off delay {}ms, escalation after {} misses, idle TTL {}s",
        settings.typing_delay.as_millis(),
        settings.handoff_delay.as_millis(),
        settings.engine.escalation_threshold,
        settings.idle_ttl.as_secs()
    );

    let chat = Arc::new(ChatService::new(knowledge, tickets, settings));
    tokio::spawn(sweep_idle_sessions(chat.clone()));

    let state = AppState { chat };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the web frontend's domain

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
