use async_trait::async_trait;
use thiserror::Error;

use ticketry_core::domain::approval::QuoteApproval;
use ticketry_core::domain::quote::{Quote, QuoteChanges, QuoteFigures, QuoteId};
use ticketry_core::domain::rates::RateProfile;
use ticketry_core::domain::revision::QuoteDetailRevision;
use ticketry_core::domain::rules::QuoteCalculationRule;
use ticketry_core::domain::ticket::{OrganizationId, TicketId, UserId};
use ticketry_core::errors::DomainError;

pub mod approval;
pub mod catalog;
pub mod memory;
pub mod quote;

pub use approval::SqlApprovalStore;
pub use catalog::{SqlCalculationRuleSet, SqlRateCatalog};
pub use memory::{
    InMemoryApprovalStore, InMemoryCalculationRuleSet, InMemoryQuoteStore, InMemoryRateCatalog,
};
pub use quote::SqlQuoteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Optimistic-concurrency conflict: the caller's base version is no
    /// longer current. Re-read and retry with fresh state.
    #[error(
        "stale quote version for ticket `{ticket_id}`: update based on {base_version}, current is {current_version}"
    )]
    StaleQuoteVersion { ticket_id: String, base_version: u32, current_version: u32 },
    #[error("ticket `{ticket_id}` already has an initial quote")]
    DuplicateInitialQuote { ticket_id: String },
    #[error("update supplies no effective field changes")]
    NoChangesSupplied,
    #[error("no quote found for ticket `{ticket_id}`")]
    NoQuoteForTicket { ticket_id: String },
    #[error("quote `{quote_id}` was not found")]
    QuoteNotFound { quote_id: String },
    #[error("no active rate profile for organization `{organization_id}`")]
    RateProfileNotFound { organization_id: String },
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Durable, versioned quote storage with an append-only revision log.
///
/// `apply_update` is the single write primitive for revisions: it checks the
/// caller's base version against the current one, computes the typed field
/// diff, and persists the new quote row plus one revision row per changed
/// field atomically.
#[async_trait]
pub trait QuoteStore: Send + Sync {
    /// Persist version 1 for a ticket. Fails with `DuplicateInitialQuote`
    /// when any quote already exists for the ticket.
    async fn create_initial(
        &self,
        ticket_id: &TicketId,
        figures: QuoteFigures,
        author: &UserId,
    ) -> Result<Quote, StoreError>;

    async fn apply_update(
        &self,
        ticket_id: &TicketId,
        base_version: u32,
        changes: &QuoteChanges,
        reason: &str,
        author: &UserId,
    ) -> Result<Quote, StoreError>;

    /// The highest-version quote for a ticket, or `None`.
    async fn get_current(&self, ticket_id: &TicketId) -> Result<Option<Quote>, StoreError>;

    /// Every version for a ticket, ascending by version.
    async fn list_all(&self, ticket_id: &TicketId) -> Result<Vec<Quote>, StoreError>;

    async fn get_by_id(&self, quote_id: &QuoteId) -> Result<Option<Quote>, StoreError>;

    /// Revision rows for one quote version, ascending by `created_at`.
    async fn get_revisions(
        &self,
        quote_id: &QuoteId,
    ) -> Result<Vec<QuoteDetailRevision>, StoreError>;
}

#[async_trait]
pub trait ApprovalStore: Send + Sync {
    /// The latest approval record for a quote version, or `None`.
    async fn find_current(&self, quote_id: &QuoteId) -> Result<Option<QuoteApproval>, StoreError>;

    async fn save(&self, approval: QuoteApproval) -> Result<(), StoreError>;
}

/// Read-only, organization-scoped rate lookup.
#[async_trait]
pub trait RateCatalog: Send + Sync {
    async fn lookup(&self, organization_id: &OrganizationId) -> Result<RateProfile, StoreError>;
}

/// Read-only snapshot of the active calculation rules, fetched per
/// operation rather than cached process-wide.
#[async_trait]
pub trait CalculationRuleSet: Send + Sync {
    async fn active_rules(&self) -> Result<Vec<QuoteCalculationRule>, StoreError>;
}
