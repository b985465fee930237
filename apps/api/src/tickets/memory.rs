use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::ticket::SupportTicket;
use crate::tickets::{TicketStore, TicketStoreError};

/// Process-local store for tests and local development. Lost on restart.
#[derive(Default)]
pub struct MemoryTicketStore {
    tickets: RwLock<Vec<SupportTicket>>,
}

#[async_trait]
impl TicketStore for MemoryTicketStore {
    async fn append(&self, ticket: &SupportTicket) -> Result<(), TicketStoreError> {
        self.tickets.write().await.push(ticket.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SupportTicket>, TicketStoreError> {
        Ok(self.tickets.read().await.clone())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
