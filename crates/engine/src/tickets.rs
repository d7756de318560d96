use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use ticketry_core::domain::ticket::{TicketId, TicketSnapshot};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TicketDirectoryError {
    #[error("ticket `{ticket_id}` was not found")]
    NotFound { ticket_id: String },
    #[error("ticket lookup failed: {0}")]
    Lookup(String),
}

/// Collaborator boundary to the ticket-intake subsystem. The engine only
/// reads the attribute snapshot it needs for calculation.
#[async_trait]
pub trait TicketDirectory: Send + Sync {
    async fn get_ticket(&self, ticket_id: &TicketId)
        -> Result<TicketSnapshot, TicketDirectoryError>;
}

#[derive(Default)]
pub struct InMemoryTicketDirectory {
    tickets: HashMap<String, TicketSnapshot>,
}

impl InMemoryTicketDirectory {
    pub fn with_tickets(tickets: impl IntoIterator<Item = TicketSnapshot>) -> Self {
        Self {
            tickets: tickets.into_iter().map(|ticket| (ticket.id.0.clone(), ticket)).collect(),
        }
    }
}

#[async_trait]
impl TicketDirectory for InMemoryTicketDirectory {
    async fn get_ticket(
        &self,
        ticket_id: &TicketId,
    ) -> Result<TicketSnapshot, TicketDirectoryError> {
        self.tickets
            .get(&ticket_id.0)
            .cloned()
            .ok_or_else(|| TicketDirectoryError::NotFound { ticket_id: ticket_id.0.clone() })
    }
}
