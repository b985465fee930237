//! Ticket persistence: a pluggable trait-based store for completed hand-offs.
//!
//! Default: `RedisTicketStore` (ordered list under one fixed key).
//! `HttpTicketStore` forwards tickets to a ticket-creation API instead.
//!
//! `ChatService` holds an `Arc<dyn TicketStore>`, chosen at startup via config.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{Config, TicketBackend};
use crate::models::ticket::SupportTicket;

pub mod http_store;
pub mod memory;
pub mod redis_store;

pub use http_store::HttpTicketStore;
pub use memory::MemoryTicketStore;
pub use redis_store::RedisTicketStore;

#[derive(Debug, Error)]
pub enum TicketStoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Ticket API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Ticket API unavailable after {retries} retries")]
    RetriesExhausted { retries: u32 },
}

/// Append-only ticket log. Implement this to swap backends without touching
/// the chat service or handlers.
#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn append(&self, ticket: &SupportTicket) -> Result<(), TicketStoreError>;

    /// All tickets in the order they were appended.
    async fn list(&self) -> Result<Vec<SupportTicket>, TicketStoreError>;

    /// Backend label, for logs and the health endpoint.
    fn backend(&self) -> &'static str;
}

/// Builds the store selected by `TICKET_BACKEND`.
pub fn build_ticket_store(config: &Config) -> anyhow::Result<Arc<dyn TicketStore>> {
    let store: Arc<dyn TicketStore> = match config.ticket_backend {
        TicketBackend::Redis => {
            let client = redis::Client::open(config.redis_url.clone())?;
            Arc::new(RedisTicketStore::new(
                client,
                config.ticket_storage_key.clone(),
            ))
        }
        TicketBackend::Http => {
            let url = config.ticket_api_url.clone().ok_or_else(|| {
                anyhow::anyhow!("TICKET_API_URL is required when TICKET_BACKEND=http")
            })?;
            Arc::new(HttpTicketStore::new(url, config.ticket_api_token.clone())?)
        }
        TicketBackend::Memory => Arc::new(MemoryTicketStore::default()),
    };
    Ok(store)
}
