use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::{debug, warn};

use crate::models::ticket::SupportTicket;
use crate::tickets::{TicketStore, TicketStoreError};

pub const DEFAULT_TICKET_KEY: &str = "cvision_support_tickets";

/// Tickets kept as a Redis list under one fixed key, one JSON document per
/// entry. `RPUSH` keeps appends atomic and ordered.
pub struct RedisTicketStore {
    client: redis::Client,
    key: String,
}

impl RedisTicketStore {
    pub fn new(client: redis::Client, key: String) -> Self {
        Self { client, key }
    }
}

#[async_trait]
impl TicketStore for RedisTicketStore {
    async fn append(&self, ticket: &SupportTicket) -> Result<(), TicketStoreError> {
        let payload = encode_ticket(ticket)?;
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let len: usize = conn.rpush(&self.key, payload).await?;
        debug!("Appended ticket #{} to {} (len={len})", ticket.id, self.key);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SupportTicket>, TicketStoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Vec<String> = conn.lrange(&self.key, 0, -1).await?;
        Ok(decode_tickets(&raw))
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

pub fn encode_ticket(ticket: &SupportTicket) -> Result<String, serde_json::Error> {
    serde_json::to_string(ticket)
}

/// Parses stored entries, skipping any that are not valid tickets.
pub fn decode_tickets(raw: &[String]) -> Vec<SupportTicket> {
    raw.iter()
        .enumerate()
        .filter_map(|(idx, entry)| match serde_json::from_str(entry) {
            Ok(ticket) => Some(ticket),
            Err(e) => {
                warn!("Skipping unreadable ticket entry at index {idx}: {e}");
                None
            }
        })
        .collect()
}
