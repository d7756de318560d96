use chrono::{DateTime, Utc};
use sqlx::Row;

use ticketry_core::domain::approval::{ApprovalId, ApprovalStatus, QuoteApproval};
use ticketry_core::domain::quote::QuoteId;
use ticketry_core::domain::ticket::UserId;

use super::{ApprovalStore, StoreError};
use crate::DbPool;

pub struct SqlApprovalStore {
    pool: DbPool,
}

impl SqlApprovalStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_approval(row: &sqlx::sqlite::SqliteRow) -> Result<QuoteApproval, StoreError> {
    let id: String = row.try_get("id").map_err(|e| StoreError::Decode(e.to_string()))?;
    let quote_id: String =
        row.try_get("quote_id").map_err(|e| StoreError::Decode(e.to_string()))?;
    let status_raw: String =
        row.try_get("status").map_err(|e| StoreError::Decode(e.to_string()))?;
    let submitted_by: String =
        row.try_get("submitted_by").map_err(|e| StoreError::Decode(e.to_string()))?;
    let created_at_raw: String =
        row.try_get("created_at").map_err(|e| StoreError::Decode(e.to_string()))?;
    let updated_at_raw: String =
        row.try_get("updated_at").map_err(|e| StoreError::Decode(e.to_string()))?;

    let status = ApprovalStatus::parse(&status_raw)
        .ok_or_else(|| StoreError::Decode(format!("unknown approval status `{status_raw}`")))?;
    let created_at = parse_timestamp(&created_at_raw)?;
    let updated_at = parse_timestamp(&updated_at_raw)?;

    Ok(QuoteApproval {
        id: ApprovalId(id),
        quote_id: QuoteId(quote_id),
        status,
        submitted_by: UserId(submitted_by),
        created_at,
        updated_at,
    })
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StoreError::Decode(format!("invalid timestamp `{raw}`")))
}

#[async_trait::async_trait]
impl ApprovalStore for SqlApprovalStore {
    async fn find_current(&self, quote_id: &QuoteId) -> Result<Option<QuoteApproval>, StoreError> {
        let row = sqlx::query(
            "SELECT id, quote_id, status, submitted_by, created_at, updated_at
             FROM quote_approval
             WHERE quote_id = ?
             ORDER BY updated_at DESC, rowid DESC
             LIMIT 1",
        )
        .bind(&quote_id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref row) => Ok(Some(row_to_approval(row)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, approval: QuoteApproval) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO quote_approval (id, quote_id, status, submitted_by, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 status = excluded.status,
                 submitted_by = excluded.submitted_by,
                 updated_at = excluded.updated_at",
        )
        .bind(&approval.id.0)
        .bind(&approval.quote_id.0)
        .bind(approval.status.as_str())
        .bind(&approval.submitted_by.0)
        .bind(approval.created_at.to_rfc3339())
        .bind(approval.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use ticketry_core::domain::approval::{ApprovalId, ApprovalStatus, QuoteApproval};
    use ticketry_core::domain::quote::{ConfidenceLevel, EffortLevel, QuoteFigures, QuoteId};
    use ticketry_core::domain::ticket::{TicketId, UserId};

    use super::SqlApprovalStore;
    use crate::store::{ApprovalStore, QuoteStore, SqlQuoteStore};
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    /// Insert a parent quote so FK constraints are satisfied.
    async fn insert_quote(pool: &sqlx::SqlitePool, ticket_id: &str) -> QuoteId {
        let store = SqlQuoteStore::new(pool.clone());
        let quote = store
            .create_initial(
                &TicketId(ticket_id.to_string()),
                QuoteFigures {
                    estimated_hours_minimum: Decimal::from(2),
                    estimated_hours_maximum: Decimal::from(6),
                    hourly_rate: Decimal::from(70),
                    fixed_cost: Decimal::ZERO,
                    effort_level: EffortLevel::Medium,
                    confidence_level: Some(ConfidenceLevel::High),
                    resolution_multiplier: None,
                },
                &UserId("u-staff".to_string()),
            )
            .await
            .expect("insert parent quote");
        quote.id
    }

    fn approval(id: &str, quote_id: &QuoteId, status: ApprovalStatus) -> QuoteApproval {
        let now = Utc::now();
        QuoteApproval {
            id: ApprovalId(id.to_string()),
            quote_id: quote_id.clone(),
            status,
            submitted_by: UserId("u-staff".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn save_and_find_current() {
        let pool = setup().await;
        let quote_id = insert_quote(&pool, "T-1").await;
        let store = SqlApprovalStore::new(pool);

        store
            .save(approval("APR-1", &quote_id, ApprovalStatus::PendingApproval))
            .await
            .expect("save");

        let found = store.find_current(&quote_id).await.expect("find").expect("should exist");
        assert_eq!(found.id.0, "APR-1");
        assert_eq!(found.status, ApprovalStatus::PendingApproval);
    }

    #[tokio::test]
    async fn find_current_returns_latest_record() {
        let pool = setup().await;
        let quote_id = insert_quote(&pool, "T-1").await;
        let store = SqlApprovalStore::new(pool);

        let mut first = approval("APR-1", &quote_id, ApprovalStatus::Rejected);
        first.updated_at = Utc::now() - chrono::Duration::hours(2);
        store.save(first).await.expect("save first");
        store
            .save(approval("APR-2", &quote_id, ApprovalStatus::PendingApproval))
            .await
            .expect("save second");

        let found = store.find_current(&quote_id).await.expect("find").expect("should exist");
        assert_eq!(found.id.0, "APR-2");
    }

    #[tokio::test]
    async fn save_upserts_on_conflict() {
        let pool = setup().await;
        let quote_id = insert_quote(&pool, "T-1").await;
        let store = SqlApprovalStore::new(pool);

        let record = approval("APR-1", &quote_id, ApprovalStatus::PendingApproval);
        store.save(record.clone()).await.expect("save");

        let mut updated = record;
        updated.status = ApprovalStatus::Rejected;
        updated.updated_at = Utc::now();
        store.save(updated).await.expect("upsert");

        let found = store.find_current(&quote_id).await.expect("find").expect("should exist");
        assert_eq!(found.status, ApprovalStatus::Rejected);
    }

    #[tokio::test]
    async fn missing_approval_reads_as_none() {
        let pool = setup().await;
        let quote_id = insert_quote(&pool, "T-1").await;
        let store = SqlApprovalStore::new(pool);

        assert!(store.find_current(&quote_id).await.expect("find").is_none());
    }
}
