//! The same lifecycle exercised against the SQL stores, with the canonical
//! seed dataset providing rates and rules.

use std::sync::Arc;

use rust_decimal::Decimal;

use ticketry_core::domain::quote::{ConfidenceLevel, EffortLevel, QuoteChanges};
use ticketry_core::domain::revision::QuoteField;
use ticketry_core::domain::ticket::{
    BusinessImpactId, OrganizationId, TicketId, TicketSeverityId, TicketSnapshot, TicketTypeId,
    UserId,
};
use ticketry_core::permissions::{Capability, PermissionContext};
use ticketry_db::{
    connect_with_settings, fixtures, migrations, ApprovalStore, QuoteStore, SqlApprovalStore,
    SqlCalculationRuleSet, SqlQuoteStore, SqlRateCatalog,
};
use ticketry_engine::{ApprovalTracker, InMemoryTicketDirectory, QuoteLifecycleService};

fn ticket(ticket_id: &str) -> TicketSnapshot {
    TicketSnapshot {
        id: TicketId(ticket_id.to_string()),
        organization_id: OrganizationId(fixtures::DEFAULT_ORGANIZATION.to_string()),
        ticket_type: TicketTypeId("incident".to_string()),
        severity: TicketSeverityId("high".to_string()),
        business_impact: BusinessImpactId("major".to_string()),
        users_impacted: 12,
    }
}

fn staff() -> PermissionContext {
    PermissionContext::new(
        UserId("u-staff".to_string()),
        [Capability::QuotesCreate, Capability::QuotesUpdate],
    )
}

async fn sql_service(ticket_snapshot: TicketSnapshot) -> QuoteLifecycleService {
    let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrations");
    fixtures::seed_reference_data(&pool).await.expect("seed");

    let quotes: Arc<dyn QuoteStore> = Arc::new(SqlQuoteStore::new(pool.clone()));
    let approvals: Arc<dyn ApprovalStore> = Arc::new(SqlApprovalStore::new(pool.clone()));
    let tracker = ApprovalTracker::new(Arc::clone(&quotes), approvals);

    QuoteLifecycleService::new(
        quotes,
        Arc::new(SqlRateCatalog::new(pool.clone())),
        Arc::new(SqlCalculationRuleSet::new(pool)),
        Arc::new(InMemoryTicketDirectory::with_tickets([ticket_snapshot])),
        tracker,
    )
}

#[tokio::test]
async fn generate_then_update_round_trips_through_sqlite() {
    let ticket_id = TicketId("T-500".to_string());
    let service = sql_service(ticket(&ticket_id.0)).await;

    let quote = service.generate(&ticket_id, &staff()).await.expect("generate");
    assert_eq!(quote.version, 1);
    assert_eq!(quote.figures.effort_level, EffortLevel::High);
    assert_eq!(quote.figures.confidence_level, Some(ConfidenceLevel::Medium));
    assert_eq!(quote.estimated_cost(), Decimal::from(850));

    let changes = QuoteChanges { hourly_rate: Some(Decimal::from(95)), ..QuoteChanges::default() };
    let updated = service
        .update(&ticket_id, 1, &changes, "market rate adjustment", &staff())
        .await
        .expect("update");
    assert_eq!(updated.version, 2);
    assert_eq!(updated.estimated_cost(), Decimal::from(950));

    let revisions = service.get_history(&updated.id).await.expect("history");
    assert_eq!(revisions.len(), 1);
    assert_eq!(revisions[0].field, QuoteField::HourlyRate);
    assert_eq!(revisions[0].old_value, "85");
    assert_eq!(revisions[0].new_value, "95");
}

#[tokio::test]
async fn approval_submission_round_trips_through_sqlite() {
    let ticket_id = TicketId("T-501".to_string());
    let service = sql_service(ticket(&ticket_id.0)).await;

    let quote = service.generate(&ticket_id, &staff()).await.expect("generate");

    let approval = service.submit_for_approval(&quote.id, &staff()).await.expect("submit");
    assert_eq!(approval.quote_id, quote.id);

    let error = service
        .submit_for_approval(&quote.id, &staff())
        .await
        .expect_err("second submission should fail");
    assert!(error.to_string().contains("cannot be submitted"));
}
