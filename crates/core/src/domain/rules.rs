use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::quote::{ConfidenceLevel, EffortLevel};
use crate::domain::ticket::{BusinessImpactId, TicketSeverityId, TicketSnapshot, TicketTypeId};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuoteCalculationRuleId(pub String);

/// Maps a (type, severity, impact) key to a suggested estimate. `None` key
/// fields are wildcards. Rules are toggled active/inactive, never deleted;
/// `activated_at` breaks specificity ties.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteCalculationRule {
    pub id: QuoteCalculationRuleId,
    pub ticket_type: Option<TicketTypeId>,
    pub severity: Option<TicketSeverityId>,
    pub business_impact: Option<BusinessImpactId>,
    pub hours_min: Decimal,
    pub hours_max: Decimal,
    pub effort_level: EffortLevel,
    pub confidence_level: ConfidenceLevel,
    pub resolution_multiplier: Option<Decimal>,
    pub active: bool,
    pub activated_at: DateTime<Utc>,
}

impl QuoteCalculationRule {
    pub fn matches(&self, ticket: &TicketSnapshot) -> bool {
        if let Some(ticket_type) = &self.ticket_type {
            if normalize_key(&ticket_type.0) != normalize_key(&ticket.ticket_type.0) {
                return false;
            }
        }

        if let Some(severity) = &self.severity {
            if normalize_key(&severity.0) != normalize_key(&ticket.severity.0) {
                return false;
            }
        }

        if let Some(business_impact) = &self.business_impact {
            if normalize_key(&business_impact.0) != normalize_key(&ticket.business_impact.0) {
                return false;
            }
        }

        true
    }

    pub fn specificity(&self) -> usize {
        usize::from(self.ticket_type.is_some())
            + usize::from(self.severity.is_some())
            + usize::from(self.business_impact.is_some())
    }
}

pub(crate) fn normalize_key(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}
