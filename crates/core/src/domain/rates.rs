use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::quote::EffortLevel;
use crate::domain::ticket::OrganizationId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RateProfileId(pub String);

/// Organization-scoped hourly rate table, one rate per effort level.
/// Read-only from the engine's perspective; profiles are toggled
/// active/inactive by administration, never deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateProfile {
    pub id: RateProfileId,
    pub organization_id: OrganizationId,
    pub currency: String,
    pub hourly_rate_low: Decimal,
    pub hourly_rate_medium: Decimal,
    pub hourly_rate_high: Decimal,
    pub active: bool,
    pub activated_at: DateTime<Utc>,
}

impl RateProfile {
    pub fn rate_for(&self, effort: EffortLevel) -> Decimal {
        match effort {
            EffortLevel::Low => self.hourly_rate_low,
            EffortLevel::Medium => self.hourly_rate_medium,
            EffortLevel::High => self.hourly_rate_high,
        }
    }
}
