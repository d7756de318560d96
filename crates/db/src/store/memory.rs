use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;

use ticketry_core::diff::diff_figures;
use ticketry_core::domain::approval::QuoteApproval;
use ticketry_core::domain::quote::{Quote, QuoteChanges, QuoteFigures, QuoteId};
use ticketry_core::domain::rates::RateProfile;
use ticketry_core::domain::revision::{QuoteDetailRevision, RevisionId};
use ticketry_core::domain::rules::QuoteCalculationRule;
use ticketry_core::domain::ticket::{OrganizationId, TicketId, UserId};

use super::{ApprovalStore, CalculationRuleSet, QuoteStore, RateCatalog, StoreError};

#[derive(Default)]
struct QuoteState {
    // Vectors stay ordered by version; appends only.
    quotes_by_ticket: HashMap<String, Vec<Quote>>,
    revisions_by_quote: HashMap<String, Vec<QuoteDetailRevision>>,
}

/// In-memory quote store upholding the same optimistic-concurrency contract
/// as the SQL store. One lock guards quotes and revisions together so the
/// multi-row write stays atomic.
#[derive(Default)]
pub struct InMemoryQuoteStore {
    state: RwLock<QuoteState>,
}

#[async_trait::async_trait]
impl QuoteStore for InMemoryQuoteStore {
    async fn create_initial(
        &self,
        ticket_id: &TicketId,
        figures: QuoteFigures,
        author: &UserId,
    ) -> Result<Quote, StoreError> {
        figures.validate()?;

        let mut state = self.state.write().await;
        let quotes = state.quotes_by_ticket.entry(ticket_id.0.clone()).or_default();
        if !quotes.is_empty() {
            return Err(StoreError::DuplicateInitialQuote { ticket_id: ticket_id.0.clone() });
        }

        let quote = Quote {
            id: QuoteId::generate(),
            ticket_id: ticket_id.clone(),
            version: 1,
            figures,
            created_by: author.clone(),
            created_at: Utc::now(),
        };
        quotes.push(quote.clone());

        Ok(quote)
    }

    async fn apply_update(
        &self,
        ticket_id: &TicketId,
        base_version: u32,
        changes: &QuoteChanges,
        reason: &str,
        author: &UserId,
    ) -> Result<Quote, StoreError> {
        let mut state = self.state.write().await;

        let current = state
            .quotes_by_ticket
            .get(&ticket_id.0)
            .and_then(|quotes| quotes.last())
            .cloned()
            .ok_or_else(|| StoreError::NoQuoteForTicket { ticket_id: ticket_id.0.clone() })?;

        if current.version != base_version {
            return Err(StoreError::StaleQuoteVersion {
                ticket_id: ticket_id.0.clone(),
                base_version,
                current_version: current.version,
            });
        }

        let next_figures = current.figures.with_changes(changes);
        next_figures.validate()?;

        let field_changes = diff_figures(&current.figures, &next_figures);
        if field_changes.is_empty() {
            return Err(StoreError::NoChangesSupplied);
        }

        let now = Utc::now();
        let quote = Quote {
            id: QuoteId::generate(),
            ticket_id: ticket_id.clone(),
            version: base_version + 1,
            figures: next_figures,
            created_by: author.clone(),
            created_at: now,
        };

        let revisions = field_changes
            .into_iter()
            .map(|change| QuoteDetailRevision {
                id: RevisionId::generate(),
                quote_id: quote.id.clone(),
                field: change.field,
                old_value: change.old_value,
                new_value: change.new_value,
                reason: reason.to_string(),
                changed_by: author.clone(),
                created_at: now,
            })
            .collect();

        state.quotes_by_ticket.entry(ticket_id.0.clone()).or_default().push(quote.clone());
        state.revisions_by_quote.insert(quote.id.0.clone(), revisions);

        Ok(quote)
    }

    async fn get_current(&self, ticket_id: &TicketId) -> Result<Option<Quote>, StoreError> {
        let state = self.state.read().await;
        Ok(state.quotes_by_ticket.get(&ticket_id.0).and_then(|quotes| quotes.last()).cloned())
    }

    async fn list_all(&self, ticket_id: &TicketId) -> Result<Vec<Quote>, StoreError> {
        let state = self.state.read().await;
        Ok(state.quotes_by_ticket.get(&ticket_id.0).cloned().unwrap_or_default())
    }

    async fn get_by_id(&self, quote_id: &QuoteId) -> Result<Option<Quote>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .quotes_by_ticket
            .values()
            .flatten()
            .find(|quote| quote.id == *quote_id)
            .cloned())
    }

    async fn get_revisions(
        &self,
        quote_id: &QuoteId,
    ) -> Result<Vec<QuoteDetailRevision>, StoreError> {
        let state = self.state.read().await;
        Ok(state.revisions_by_quote.get(&quote_id.0).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct InMemoryApprovalStore {
    approvals_by_quote: RwLock<HashMap<String, Vec<QuoteApproval>>>,
}

#[async_trait::async_trait]
impl ApprovalStore for InMemoryApprovalStore {
    async fn find_current(&self, quote_id: &QuoteId) -> Result<Option<QuoteApproval>, StoreError> {
        let approvals = self.approvals_by_quote.read().await;
        Ok(approvals
            .get(&quote_id.0)
            .and_then(|records| records.iter().max_by_key(|record| record.updated_at))
            .cloned())
    }

    async fn save(&self, approval: QuoteApproval) -> Result<(), StoreError> {
        let mut approvals = self.approvals_by_quote.write().await;
        let records = approvals.entry(approval.quote_id.0.clone()).or_default();
        if let Some(existing) = records.iter_mut().find(|record| record.id == approval.id) {
            *existing = approval;
        } else {
            records.push(approval);
        }
        Ok(())
    }
}

pub struct InMemoryRateCatalog {
    profiles: Vec<RateProfile>,
}

impl InMemoryRateCatalog {
    pub fn new(profiles: Vec<RateProfile>) -> Self {
        Self { profiles }
    }
}

#[async_trait::async_trait]
impl RateCatalog for InMemoryRateCatalog {
    async fn lookup(&self, organization_id: &OrganizationId) -> Result<RateProfile, StoreError> {
        self.profiles
            .iter()
            .filter(|profile| profile.active && profile.organization_id == *organization_id)
            .max_by_key(|profile| profile.activated_at)
            .cloned()
            .ok_or_else(|| StoreError::RateProfileNotFound {
                organization_id: organization_id.0.clone(),
            })
    }
}

pub struct InMemoryCalculationRuleSet {
    rules: Vec<QuoteCalculationRule>,
}

impl InMemoryCalculationRuleSet {
    pub fn new(rules: Vec<QuoteCalculationRule>) -> Self {
        Self { rules }
    }
}

#[async_trait::async_trait]
impl CalculationRuleSet for InMemoryCalculationRuleSet {
    async fn active_rules(&self) -> Result<Vec<QuoteCalculationRule>, StoreError> {
        Ok(self.rules.iter().filter(|rule| rule.active).cloned().collect())
    }
}
