use std::sync::Arc;

use chrono::Utc;

use ticketry_core::domain::approval::{ApprovalId, ApprovalStatus, QuoteApproval};
use ticketry_core::domain::quote::QuoteId;
use ticketry_core::domain::ticket::UserId;
use ticketry_core::errors::DomainError;
use ticketry_db::{ApprovalStore, QuoteStore, StoreError};

use crate::errors::LifecycleError;

/// Records approval-state transitions per quote version. Only the
/// submission edge lives here; moving a pending record to Approved or
/// Rejected is the external approver workflow's authority.
pub struct ApprovalTracker {
    quotes: Arc<dyn QuoteStore>,
    approvals: Arc<dyn ApprovalStore>,
}

impl ApprovalTracker {
    pub fn new(quotes: Arc<dyn QuoteStore>, approvals: Arc<dyn ApprovalStore>) -> Self {
        Self { quotes, approvals }
    }

    /// Submit a quote for approval: absent record or Rejected moves to
    /// PendingApproval; PendingApproval and Approved refuse resubmission.
    pub async fn submit(
        &self,
        quote_id: &QuoteId,
        acting_user: &UserId,
    ) -> Result<QuoteApproval, LifecycleError> {
        if self.quotes.get_by_id(quote_id).await?.is_none() {
            return Err(StoreError::QuoteNotFound { quote_id: quote_id.0.clone() }.into());
        }

        if let Some(existing) = self.approvals.find_current(quote_id).await? {
            if !existing.status.allows_submission() {
                return Err(
                    DomainError::InvalidApprovalTransition { status: existing.status }.into()
                );
            }
        }

        let now = Utc::now();
        let approval = QuoteApproval {
            id: ApprovalId::generate(),
            quote_id: quote_id.clone(),
            status: ApprovalStatus::PendingApproval,
            submitted_by: acting_user.clone(),
            created_at: now,
            updated_at: now,
        };
        self.approvals.save(approval.clone()).await?;

        tracing::info!(
            event_name = "quote.approval_submitted",
            quote_id = %quote_id.0,
            approval_id = %approval.id.0,
            submitted_by = %acting_user.0,
            "quote submitted for approval"
        );

        Ok(approval)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use ticketry_core::domain::approval::ApprovalStatus;
    use ticketry_core::domain::quote::{ConfidenceLevel, EffortLevel, QuoteFigures, QuoteId};
    use ticketry_core::domain::ticket::{TicketId, UserId};
    use ticketry_core::errors::DomainError;
    use ticketry_db::{
        ApprovalStore, InMemoryApprovalStore, InMemoryQuoteStore, QuoteStore, StoreError,
    };

    use crate::errors::LifecycleError;

    use super::ApprovalTracker;

    fn figures() -> QuoteFigures {
        QuoteFigures {
            estimated_hours_minimum: Decimal::from(4),
            estimated_hours_maximum: Decimal::from(10),
            hourly_rate: Decimal::from(85),
            fixed_cost: Decimal::ZERO,
            effort_level: EffortLevel::High,
            confidence_level: Some(ConfidenceLevel::Medium),
            resolution_multiplier: None,
        }
    }

    async fn tracker_with_quote() -> (ApprovalTracker, QuoteId, Arc<InMemoryApprovalStore>) {
        let quotes = Arc::new(InMemoryQuoteStore::default());
        let approvals = Arc::new(InMemoryApprovalStore::default());
        let quote = quotes
            .create_initial(
                &TicketId("T-1".to_string()),
                figures(),
                &UserId("u-staff".to_string()),
            )
            .await
            .expect("create quote");

        let tracker =
            ApprovalTracker::new(quotes, Arc::clone(&approvals) as Arc<dyn ApprovalStore>);
        (tracker, quote.id, approvals)
    }

    #[tokio::test]
    async fn first_submission_moves_to_pending() {
        let (tracker, quote_id, _) = tracker_with_quote().await;

        let approval = tracker
            .submit(&quote_id, &UserId("u-staff".to_string()))
            .await
            .expect("submit");

        assert_eq!(approval.status, ApprovalStatus::PendingApproval);
        assert_eq!(approval.quote_id, quote_id);
    }

    #[tokio::test]
    async fn pending_quote_refuses_resubmission() {
        let (tracker, quote_id, approvals) = tracker_with_quote().await;
        let user = UserId("u-staff".to_string());
        tracker.submit(&quote_id, &user).await.expect("first submit");

        let error = tracker.submit(&quote_id, &user).await.expect_err("resubmit should fail");
        assert!(matches!(
            error,
            LifecycleError::Domain(DomainError::InvalidApprovalTransition {
                status: ApprovalStatus::PendingApproval,
            })
        ));

        // The pending record is untouched by the failed attempt.
        let current =
            approvals.find_current(&quote_id).await.expect("find").expect("record exists");
        assert_eq!(current.status, ApprovalStatus::PendingApproval);
    }

    #[tokio::test]
    async fn rejected_quote_may_be_resubmitted() {
        let (tracker, quote_id, approvals) = tracker_with_quote().await;
        let user = UserId("u-staff".to_string());
        let first = tracker.submit(&quote_id, &user).await.expect("submit");

        // External approver workflow rejects the pending record.
        let mut rejected = first;
        rejected.status = ApprovalStatus::Rejected;
        rejected.updated_at = chrono::Utc::now();
        approvals.save(rejected).await.expect("store rejection");

        let resubmitted = tracker.submit(&quote_id, &user).await.expect("resubmit");
        assert_eq!(resubmitted.status, ApprovalStatus::PendingApproval);
    }

    #[tokio::test]
    async fn unknown_quote_cannot_be_submitted() {
        let (tracker, _, _) = tracker_with_quote().await;

        let error = tracker
            .submit(&QuoteId("missing".to_string()), &UserId("u-staff".to_string()))
            .await
            .expect_err("missing quote should fail");
        assert!(matches!(error, LifecycleError::Store(StoreError::QuoteNotFound { .. })));
    }
}
