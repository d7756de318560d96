//! Canonical reference dataset shared by integration tests and fresh
//! development databases: one active rate profile and a small rule ladder
//! from a fully wildcarded fallback up to an exact incident rule.

use chrono::{Duration, Utc};

use crate::store::StoreError;
use crate::DbPool;

pub const DEFAULT_ORGANIZATION: &str = "org-default";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeedSummary {
    pub rate_profiles: usize,
    pub calculation_rules: usize,
}

struct RuleSeed {
    id: &'static str,
    ticket_type: Option<&'static str>,
    severity: Option<&'static str>,
    business_impact: Option<&'static str>,
    hours_min: &'static str,
    hours_max: &'static str,
    effort_level: &'static str,
    confidence_level: &'static str,
    age_hours: i64,
}

const RULE_SEEDS: &[RuleSeed] = &[
    RuleSeed {
        id: "rule-incident-high-major",
        ticket_type: Some("incident"),
        severity: Some("high"),
        business_impact: Some("major"),
        hours_min: "4",
        hours_max: "10",
        effort_level: "high",
        confidence_level: "medium",
        age_hours: 2,
    },
    RuleSeed {
        id: "rule-incident",
        ticket_type: Some("incident"),
        severity: None,
        business_impact: None,
        hours_min: "2",
        hours_max: "6",
        effort_level: "medium",
        confidence_level: "medium",
        age_hours: 24,
    },
    RuleSeed {
        id: "rule-default",
        ticket_type: None,
        severity: None,
        business_impact: None,
        hours_min: "1",
        hours_max: "4",
        effort_level: "low",
        confidence_level: "low",
        age_hours: 240,
    },
];

pub async fn seed_reference_data(pool: &DbPool) -> Result<SeedSummary, StoreError> {
    let now = Utc::now();

    sqlx::query(
        "INSERT OR REPLACE INTO rate_profile (id, organization_id, currency, hourly_rate_low, \
             hourly_rate_medium, hourly_rate_high, active, activated_at)
         VALUES (?, ?, ?, ?, ?, ?, 1, ?)",
    )
    .bind("rate-default")
    .bind(DEFAULT_ORGANIZATION)
    .bind("GBP")
    .bind("45")
    .bind("65")
    .bind("85")
    .bind(now.to_rfc3339())
    .execute(pool)
    .await?;

    for seed in RULE_SEEDS {
        sqlx::query(
            "INSERT OR REPLACE INTO quote_calculation_rule (id, ticket_type, severity, \
                 business_impact, hours_min, hours_max, effort_level, confidence_level, \
                 resolution_multiplier, active, activated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, NULL, 1, ?)",
        )
        .bind(seed.id)
        .bind(seed.ticket_type)
        .bind(seed.severity)
        .bind(seed.business_impact)
        .bind(seed.hours_min)
        .bind(seed.hours_max)
        .bind(seed.effort_level)
        .bind(seed.confidence_level)
        .bind((now - Duration::hours(seed.age_hours)).to_rfc3339())
        .execute(pool)
        .await?;
    }

    Ok(SeedSummary { rate_profiles: 1, calculation_rules: RULE_SEEDS.len() })
}

#[cfg(test)]
mod tests {
    use sqlx::Row;

    use super::seed_reference_data;
    use crate::{connect_with_settings, migrations};

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");

        let first = seed_reference_data(&pool).await.expect("seed");
        let second = seed_reference_data(&pool).await.expect("re-seed");
        assert_eq!(first, second);

        let rule_count: i64 =
            sqlx::query("SELECT COUNT(*) AS count FROM quote_calculation_rule")
                .fetch_one(&pool)
                .await
                .expect("count rules")
                .get("count");
        assert_eq!(rule_count as usize, second.calculation_rules);
    }
}
