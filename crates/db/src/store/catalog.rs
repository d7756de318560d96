use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::Row;

use ticketry_core::domain::quote::{ConfidenceLevel, EffortLevel};
use ticketry_core::domain::rates::{RateProfile, RateProfileId};
use ticketry_core::domain::rules::{QuoteCalculationRule, QuoteCalculationRuleId};
use ticketry_core::domain::ticket::{
    BusinessImpactId, OrganizationId, TicketSeverityId, TicketTypeId,
};

use super::{CalculationRuleSet, RateCatalog, StoreError};
use crate::DbPool;

pub struct SqlRateCatalog {
    pool: DbPool,
}

impl SqlRateCatalog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

pub struct SqlCalculationRuleSet {
    pool: DbPool,
}

impl SqlCalculationRuleSet {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode<T>(row: &sqlx::sqlite::SqliteRow, name: &str) -> Result<T, StoreError>
where
    T: for<'r> sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get::<T, _>(name).map_err(|e| StoreError::Decode(e.to_string()))
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

fn row_to_profile(row: &sqlx::sqlite::SqliteRow) -> Result<RateProfile, StoreError> {
    Ok(RateProfile {
        id: RateProfileId(decode::<String>(row, "id")?),
        organization_id: OrganizationId(decode::<String>(row, "organization_id")?),
        currency: decode(row, "currency")?,
        hourly_rate_low: parse_decimal(
            "hourly_rate_low",
            &decode::<String>(row, "hourly_rate_low")?,
        )?,
        hourly_rate_medium: parse_decimal(
            "hourly_rate_medium",
            &decode::<String>(row, "hourly_rate_medium")?,
        )?,
        hourly_rate_high: parse_decimal(
            "hourly_rate_high",
            &decode::<String>(row, "hourly_rate_high")?,
        )?,
        active: decode::<i64>(row, "active")? != 0,
        activated_at: parse_timestamp("activated_at", &decode::<String>(row, "activated_at")?)?,
    })
}

fn row_to_rule(row: &sqlx::sqlite::SqliteRow) -> Result<QuoteCalculationRule, StoreError> {
    let effort_raw: String = decode(row, "effort_level")?;
    let effort_level = EffortLevel::parse(&effort_raw)
        .ok_or_else(|| StoreError::Decode(format!("unknown effort level `{effort_raw}`")))?;

    let confidence_raw: String = decode(row, "confidence_level")?;
    let confidence_level = ConfidenceLevel::parse(&confidence_raw)
        .ok_or_else(|| StoreError::Decode(format!("unknown confidence level `{confidence_raw}`")))?;

    let multiplier_raw: Option<String> = decode(row, "resolution_multiplier")?;
    let resolution_multiplier = match multiplier_raw {
        Some(raw) => Some(parse_decimal("resolution_multiplier", &raw)?),
        None => None,
    };

    Ok(QuoteCalculationRule {
        id: QuoteCalculationRuleId(decode::<String>(row, "id")?),
        ticket_type: decode::<Option<String>>(row, "ticket_type")?.map(TicketTypeId),
        severity: decode::<Option<String>>(row, "severity")?.map(TicketSeverityId),
        business_impact: decode::<Option<String>>(row, "business_impact")?.map(BusinessImpactId),
        hours_min: parse_decimal("hours_min", &decode::<String>(row, "hours_min")?)?,
        hours_max: parse_decimal("hours_max", &decode::<String>(row, "hours_max")?)?,
        effort_level,
        confidence_level,
        resolution_multiplier,
        active: decode::<i64>(row, "active")? != 0,
        activated_at: parse_timestamp("activated_at", &decode::<String>(row, "activated_at")?)?,
    })
}

#[async_trait::async_trait]
impl RateCatalog for SqlRateCatalog {
    async fn lookup(&self, organization_id: &OrganizationId) -> Result<RateProfile, StoreError> {
        let row = sqlx::query(
            "SELECT id, organization_id, currency, hourly_rate_low, hourly_rate_medium, \
                 hourly_rate_high, active, activated_at
             FROM rate_profile
             WHERE organization_id = ? AND active = 1
             ORDER BY activated_at DESC
             LIMIT 1",
        )
        .bind(&organization_id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref row) => row_to_profile(row),
            None => Err(StoreError::RateProfileNotFound {
                organization_id: organization_id.0.clone(),
            }),
        }
    }
}

#[async_trait::async_trait]
impl CalculationRuleSet for SqlCalculationRuleSet {
    async fn active_rules(&self) -> Result<Vec<QuoteCalculationRule>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, ticket_type, severity, business_impact, hours_min, hours_max, \
                 effort_level, confidence_level, resolution_multiplier, active, activated_at
             FROM quote_calculation_rule
             WHERE active = 1
             ORDER BY activated_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_rule).collect()
    }
}
