use thiserror::Error;

use ticketry_core::errors::DomainError;
use ticketry_db::StoreError;

use crate::tickets::TicketDirectoryError;

/// Everything a lifecycle operation can fail with. Domain and store failures
/// pass through transparently so callers can match the full taxonomy
/// (stale version, duplicate initial, invalid figures, ...) at one type.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("user `{user}` lacks capability `{capability}`")]
    PermissionDenied { user: String, capability: &'static str },
    #[error("ticket `{ticket_id}` was not found")]
    TicketNotFound { ticket_id: String },
    #[error("ticket `{ticket_id}` already has a quote; update the current version instead")]
    QuoteAlreadyExists { ticket_id: String },
    #[error("ticket lookup failed: {0}")]
    TicketLookup(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<TicketDirectoryError> for LifecycleError {
    fn from(value: TicketDirectoryError) -> Self {
        match value {
            TicketDirectoryError::NotFound { ticket_id } => Self::TicketNotFound { ticket_id },
            TicketDirectoryError::Lookup(message) => Self::TicketLookup(message),
        }
    }
}
