use std::sync::Arc;

use ticketry_core::calculator;
use ticketry_core::domain::approval::QuoteApproval;
use ticketry_core::domain::quote::{Quote, QuoteChanges, QuoteFigures, QuoteId};
use ticketry_core::domain::revision::QuoteDetailRevision;
use ticketry_core::domain::ticket::TicketId;
use ticketry_core::errors::DomainError;
use ticketry_core::permissions::{Capability, PermissionContext};
use ticketry_db::{CalculationRuleSet, QuoteStore, RateCatalog, StoreError};

use crate::errors::LifecycleError;
use crate::tickets::TicketDirectory;
use crate::tracker::ApprovalTracker;

/// Orchestrates the quote lifecycle: generation, manual creation, audited
/// updates, approval submission, and history reads. Every operation checks
/// the caller's permission context before touching any collaborator.
pub struct QuoteLifecycleService {
    quotes: Arc<dyn QuoteStore>,
    rates: Arc<dyn RateCatalog>,
    rules: Arc<dyn CalculationRuleSet>,
    tickets: Arc<dyn TicketDirectory>,
    tracker: ApprovalTracker,
}

impl QuoteLifecycleService {
    pub fn new(
        quotes: Arc<dyn QuoteStore>,
        rates: Arc<dyn RateCatalog>,
        rules: Arc<dyn CalculationRuleSet>,
        tickets: Arc<dyn TicketDirectory>,
        tracker: ApprovalTracker,
    ) -> Self {
        Self { quotes, rates, rules, tickets, tracker }
    }

    fn require(
        &self,
        context: &PermissionContext,
        capability: Capability,
    ) -> Result<(), LifecycleError> {
        if context.allows(capability) {
            return Ok(());
        }

        tracing::warn!(
            event_name = "quote.permission_denied",
            user = %context.acting_user.0,
            capability = capability.as_str(),
            "lifecycle operation refused"
        );
        Err(LifecycleError::PermissionDenied {
            user: context.acting_user.0.clone(),
            capability: capability.as_str(),
        })
    }

    /// Auto-generate version 1 for a ticket from the active rules and the
    /// organization's rate profile.
    pub async fn generate(
        &self,
        ticket_id: &TicketId,
        context: &PermissionContext,
    ) -> Result<Quote, LifecycleError> {
        self.require(context, Capability::QuotesCreate)?;

        if self.quotes.get_current(ticket_id).await?.is_some() {
            return Err(LifecycleError::QuoteAlreadyExists { ticket_id: ticket_id.0.clone() });
        }

        let ticket = self.tickets.get_ticket(ticket_id).await?;
        let profile = self.rates.lookup(&ticket.organization_id).await?;
        let rules = self.rules.active_rules().await?;
        let figures = calculator::calculate(&ticket, &profile, &rules)?;

        let quote = self.quotes.create_initial(ticket_id, figures, &context.acting_user).await?;

        tracing::info!(
            event_name = "quote.generated",
            ticket_id = %ticket_id.0,
            quote_id = %quote.id.0,
            version = quote.version,
            "quote generated from calculation rules"
        );

        Ok(quote)
    }

    /// Create version 1 from caller-supplied figures, bypassing the
    /// calculator. Figures are validated before any write.
    pub async fn create_manual(
        &self,
        ticket_id: &TicketId,
        figures: QuoteFigures,
        context: &PermissionContext,
    ) -> Result<Quote, LifecycleError> {
        self.require(context, Capability::QuotesCreate)?;

        figures.validate()?;
        if self.quotes.get_current(ticket_id).await?.is_some() {
            return Err(LifecycleError::QuoteAlreadyExists { ticket_id: ticket_id.0.clone() });
        }

        let quote = self.quotes.create_initial(ticket_id, figures, &context.acting_user).await?;

        tracing::info!(
            event_name = "quote.created_manually",
            ticket_id = %ticket_id.0,
            quote_id = %quote.id.0,
            version = quote.version,
            "manual quote created"
        );

        Ok(quote)
    }

    /// Apply a partial update against the version the caller read. A losing
    /// concurrent writer gets `StaleQuoteVersion` and must re-read and retry;
    /// nothing is written for it.
    pub async fn update(
        &self,
        ticket_id: &TicketId,
        base_version: u32,
        changes: &QuoteChanges,
        reason: &str,
        context: &PermissionContext,
    ) -> Result<Quote, LifecycleError> {
        self.require(context, Capability::QuotesUpdate)?;

        let reason = reason.trim();
        if reason.is_empty() {
            return Err(DomainError::MissingReason.into());
        }

        let quote = self
            .quotes
            .apply_update(ticket_id, base_version, changes, reason, &context.acting_user)
            .await?;

        tracing::info!(
            event_name = "quote.updated",
            ticket_id = %ticket_id.0,
            quote_id = %quote.id.0,
            version = quote.version,
            "quote updated"
        );

        Ok(quote)
    }

    pub async fn submit_for_approval(
        &self,
        quote_id: &QuoteId,
        context: &PermissionContext,
    ) -> Result<QuoteApproval, LifecycleError> {
        self.require(context, Capability::QuotesUpdate)?;
        self.tracker.submit(quote_id, &context.acting_user).await
    }

    /// The audited change history of one quote version, oldest first. Read
    /// access only; no mutation capability required.
    pub async fn get_history(
        &self,
        quote_id: &QuoteId,
    ) -> Result<Vec<QuoteDetailRevision>, LifecycleError> {
        if self.quotes.get_by_id(quote_id).await?.is_none() {
            return Err(StoreError::QuoteNotFound { quote_id: quote_id.0.clone() }.into());
        }

        Ok(self.quotes.get_revisions(quote_id).await?)
    }
}
