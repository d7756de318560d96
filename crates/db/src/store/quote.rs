use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Row, Sqlite, Transaction};

use ticketry_core::diff::diff_figures;
use ticketry_core::domain::quote::{
    ConfidenceLevel, EffortLevel, Quote, QuoteChanges, QuoteFigures, QuoteId,
};
use ticketry_core::domain::revision::{QuoteDetailRevision, QuoteField, RevisionId};
use ticketry_core::domain::ticket::{TicketId, UserId};

use super::{QuoteStore, StoreError};
use crate::DbPool;

const QUOTE_COLUMNS: &str = "id, ticket_id, version, estimated_hours_minimum, \
     estimated_hours_maximum, hourly_rate, fixed_cost, effort_level, confidence_level, \
     resolution_multiplier, created_by, created_at";

pub struct SqlQuoteStore {
    pool: DbPool,
}

impl SqlQuoteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn parse_decimal(column: &str, raw: &str) -> Result<Decimal, StoreError> {
    raw.parse::<Decimal>()
        .map_err(|_| StoreError::Decode(format!("invalid decimal in `{column}`: `{raw}`")))
}

fn parse_timestamp(column: &str, raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StoreError::Decode(format!("invalid timestamp in `{column}`: `{raw}`")))
}

fn column<T>(row: &sqlx::sqlite::SqliteRow, name: &str) -> Result<T, StoreError>
where
    T: for<'r> sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get::<T, _>(name).map_err(|e| StoreError::Decode(e.to_string()))
}

fn row_to_quote(row: &sqlx::sqlite::SqliteRow) -> Result<Quote, StoreError> {
    let effort_raw: String = column(row, "effort_level")?;
    let effort_level = EffortLevel::parse(&effort_raw)
        .ok_or_else(|| StoreError::Decode(format!("unknown effort level `{effort_raw}`")))?;

    let confidence_raw: Option<String> = column(row, "confidence_level")?;
    let confidence_level = match confidence_raw {
        Some(raw) => Some(
            ConfidenceLevel::parse(&raw)
                .ok_or_else(|| StoreError::Decode(format!("unknown confidence level `{raw}`")))?,
        ),
        None => None,
    };

    let multiplier_raw: Option<String> = column(row, "resolution_multiplier")?;
    let resolution_multiplier = match multiplier_raw {
        Some(raw) => Some(parse_decimal("resolution_multiplier", &raw)?),
        None => None,
    };

    Ok(Quote {
        id: QuoteId(column::<String>(row, "id")?),
        ticket_id: TicketId(column::<String>(row, "ticket_id")?),
        version: u32::try_from(column::<i64>(row, "version")?)
            .map_err(|_| StoreError::Decode("negative quote version".to_string()))?,
        figures: QuoteFigures {
            estimated_hours_minimum: parse_decimal(
                "estimated_hours_minimum",
                &column::<String>(row, "estimated_hours_minimum")?,
            )?,
            estimated_hours_maximum: parse_decimal(
                "estimated_hours_maximum",
                &column::<String>(row, "estimated_hours_maximum")?,
            )?,
            hourly_rate: parse_decimal("hourly_rate", &column::<String>(row, "hourly_rate")?)?,
            fixed_cost: parse_decimal("fixed_cost", &column::<String>(row, "fixed_cost")?)?,
            effort_level,
            confidence_level,
            resolution_multiplier,
        },
        created_by: UserId(column::<String>(row, "created_by")?),
        created_at: parse_timestamp("created_at", &column::<String>(row, "created_at")?)?,
    })
}

fn row_to_revision(row: &sqlx::sqlite::SqliteRow) -> Result<QuoteDetailRevision, StoreError> {
    let field_raw: String = column(row, "field_name")?;
    let field = QuoteField::parse(&field_raw)
        .ok_or_else(|| StoreError::Decode(format!("unknown quote field `{field_raw}`")))?;

    Ok(QuoteDetailRevision {
        id: RevisionId(column::<String>(row, "id")?),
        quote_id: QuoteId(column::<String>(row, "quote_id")?),
        field,
        old_value: column(row, "old_value")?,
        new_value: column(row, "new_value")?,
        reason: column(row, "reason")?,
        changed_by: UserId(column::<String>(row, "changed_by")?),
        created_at: parse_timestamp("created_at", &column::<String>(row, "created_at")?)?,
    })
}

async fn insert_quote(tx: &mut Transaction<'_, Sqlite>, quote: &Quote) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO quote (id, ticket_id, version, estimated_hours_minimum, \
             estimated_hours_maximum, hourly_rate, fixed_cost, effort_level, confidence_level, \
             resolution_multiplier, created_by, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&quote.id.0)
    .bind(&quote.ticket_id.0)
    .bind(i64::from(quote.version))
    .bind(quote.figures.estimated_hours_minimum.to_string())
    .bind(quote.figures.estimated_hours_maximum.to_string())
    .bind(quote.figures.hourly_rate.to_string())
    .bind(quote.figures.fixed_cost.to_string())
    .bind(quote.figures.effort_level.as_str())
    .bind(quote.figures.confidence_level.map(|level| level.as_str()))
    .bind(quote.figures.resolution_multiplier.map(|multiplier| multiplier.to_string()))
    .bind(&quote.created_by.0)
    .bind(quote.created_at.to_rfc3339())
    .execute(&mut **tx)
    .await
    .map(|_| ())
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait::async_trait]
impl QuoteStore for SqlQuoteStore {
    async fn create_initial(
        &self,
        ticket_id: &TicketId,
        figures: QuoteFigures,
        author: &UserId,
    ) -> Result<Quote, StoreError> {
        figures.validate()?;

        let mut tx = self.pool.begin().await?;

        let existing: i64 =
            sqlx::query("SELECT COUNT(*) AS count FROM quote WHERE ticket_id = ?")
                .bind(&ticket_id.0)
                .fetch_one(&mut *tx)
                .await?
                .get("count");
        if existing > 0 {
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

        insert_quote(&mut tx, &quote).await.map_err(|error| {
            if is_unique_violation(&error) {
                StoreError::DuplicateInitialQuote { ticket_id: ticket_id.0.clone() }
            } else {
                StoreError::Database(error)
            }
        })?;
        tx.commit().await?;

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
        let mut tx = self.pool.begin().await?;

        let current_row = sqlx::query(&format!(
            "SELECT {QUOTE_COLUMNS} FROM quote WHERE ticket_id = ? ORDER BY version DESC LIMIT 1"
        ))
        .bind(&ticket_id.0)
        .fetch_optional(&mut *tx)
        .await?;
        let current = match current_row {
            Some(ref row) => row_to_quote(row)?,
            None => return Err(StoreError::NoQuoteForTicket { ticket_id: ticket_id.0.clone() }),
        };

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

        // The unique (ticket_id, version) index catches the race where a
        // competing writer committed between our read and this insert.
        insert_quote(&mut tx, &quote).await.map_err(|error| {
            if is_unique_violation(&error) {
                StoreError::StaleQuoteVersion {
                    ticket_id: ticket_id.0.clone(),
                    base_version,
                    current_version: base_version + 1,
                }
            } else {
                StoreError::Database(error)
            }
        })?;

        for change in &field_changes {
            sqlx::query(
                "INSERT INTO quote_detail_revision (id, quote_id, field_name, old_value, \
                     new_value, reason, changed_by, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(RevisionId::generate().0)
            .bind(&quote.id.0)
            .bind(change.field.as_str())
            .bind(&change.old_value)
            .bind(&change.new_value)
            .bind(reason)
            .bind(&author.0)
            .bind(now.to_rfc3339())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(quote)
    }

    async fn get_current(&self, ticket_id: &TicketId) -> Result<Option<Quote>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {QUOTE_COLUMNS} FROM quote WHERE ticket_id = ? ORDER BY version DESC LIMIT 1"
        ))
        .bind(&ticket_id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref row) => Ok(Some(row_to_quote(row)?)),
            None => Ok(None),
        }
    }

    async fn list_all(&self, ticket_id: &TicketId) -> Result<Vec<Quote>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {QUOTE_COLUMNS} FROM quote WHERE ticket_id = ? ORDER BY version ASC"
        ))
        .bind(&ticket_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_quote).collect()
    }

    async fn get_by_id(&self, quote_id: &QuoteId) -> Result<Option<Quote>, StoreError> {
        let row = sqlx::query(&format!("SELECT {QUOTE_COLUMNS} FROM quote WHERE id = ?"))
            .bind(&quote_id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref row) => Ok(Some(row_to_quote(row)?)),
            None => Ok(None),
        }
    }

    async fn get_revisions(
        &self,
        quote_id: &QuoteId,
    ) -> Result<Vec<QuoteDetailRevision>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, quote_id, field_name, old_value, new_value, reason, changed_by, created_at
             FROM quote_detail_revision
             WHERE quote_id = ?
             ORDER BY created_at ASC, rowid ASC",
        )
        .bind(&quote_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_revision).collect()
    }
}
