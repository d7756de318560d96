use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ticket::{TicketId, UserId};
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuoteId(pub String);

impl QuoteId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffortLevel {
    Low,
    Medium,
    High,
}

impl EffortLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// The stored figures of one quote version. Cost and resolution time are
/// derived on read (`estimated_cost`, `estimated_resolution_hours`) and are
/// never persisted, so they cannot drift from the inputs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteFigures {
    pub estimated_hours_minimum: Decimal,
    pub estimated_hours_maximum: Decimal,
    pub hourly_rate: Decimal,
    pub fixed_cost: Decimal,
    pub effort_level: EffortLevel,
    /// Manual quotes may omit confidence; generated quotes carry the rule's.
    pub confidence_level: Option<ConfidenceLevel>,
    /// Carried over from the matched calculation rule; `None` means 1.
    pub resolution_multiplier: Option<Decimal>,
}

impl QuoteFigures {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.estimated_hours_minimum < Decimal::ZERO
            || self.estimated_hours_maximum < Decimal::ZERO
        {
            return Err(DomainError::InvalidQuoteFigures {
                reason: "estimated hours must be non-negative".to_string(),
            });
        }
        if self.estimated_hours_minimum > self.estimated_hours_maximum {
            return Err(DomainError::InvalidQuoteFigures {
                reason: "estimated hours minimum exceeds maximum".to_string(),
            });
        }
        if self.hourly_rate < Decimal::ZERO {
            return Err(DomainError::InvalidQuoteFigures {
                reason: "hourly rate must be non-negative".to_string(),
            });
        }
        if self.fixed_cost < Decimal::ZERO {
            return Err(DomainError::InvalidQuoteFigures {
                reason: "fixed cost must be non-negative".to_string(),
            });
        }
        if matches!(self.resolution_multiplier, Some(multiplier) if multiplier < Decimal::ZERO) {
            return Err(DomainError::InvalidQuoteFigures {
                reason: "resolution multiplier must be non-negative".to_string(),
            });
        }
        Ok(())
    }

    /// Upper-bound costing: under-quoting is the failure mode to avoid.
    pub fn estimated_cost(&self) -> Decimal {
        self.fixed_cost + self.hourly_rate * self.estimated_hours_maximum
    }

    pub fn estimated_resolution_hours(&self) -> Decimal {
        self.estimated_hours_maximum * self.resolution_multiplier.unwrap_or(Decimal::ONE)
    }

    /// Apply a partial update, carrying forward every field the caller left
    /// unset.
    pub fn with_changes(&self, changes: &QuoteChanges) -> QuoteFigures {
        QuoteFigures {
            estimated_hours_minimum: changes
                .estimated_hours_minimum
                .unwrap_or(self.estimated_hours_minimum),
            estimated_hours_maximum: changes
                .estimated_hours_maximum
                .unwrap_or(self.estimated_hours_maximum),
            hourly_rate: changes.hourly_rate.unwrap_or(self.hourly_rate),
            fixed_cost: changes.fixed_cost.unwrap_or(self.fixed_cost),
            effort_level: changes.effort_level.unwrap_or(self.effort_level),
            confidence_level: changes.confidence_level.or(self.confidence_level),
            resolution_multiplier: self.resolution_multiplier,
        }
    }
}

/// A requested partial update. `None` means "leave as is"; the store computes
/// the effective diff against the base version, so setting a field to its
/// current value produces no revision row.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteChanges {
    pub estimated_hours_minimum: Option<Decimal>,
    pub estimated_hours_maximum: Option<Decimal>,
    pub hourly_rate: Option<Decimal>,
    pub fixed_cost: Option<Decimal>,
    pub effort_level: Option<EffortLevel>,
    pub confidence_level: Option<ConfidenceLevel>,
}

impl QuoteChanges {
    pub fn is_empty(&self) -> bool {
        self.estimated_hours_minimum.is_none()
            && self.estimated_hours_maximum.is_none()
            && self.hourly_rate.is_none()
            && self.fixed_cost.is_none()
            && self.effort_level.is_none()
            && self.confidence_level.is_none()
    }
}

/// One version of a ticket's cost/time estimate. Versions start at 1 and only
/// ever grow; superseded versions are retained for audit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub id: QuoteId,
    pub ticket_id: TicketId,
    pub version: u32,
    pub figures: QuoteFigures,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl Quote {
    pub fn estimated_cost(&self) -> Decimal {
        self.figures.estimated_cost()
    }

    pub fn estimated_resolution_hours(&self) -> Decimal {
        self.figures.estimated_resolution_hours()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::errors::DomainError;

    use super::{ConfidenceLevel, EffortLevel, QuoteChanges, QuoteFigures};

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

    #[test]
    fn estimated_cost_uses_hour_upper_bound() {
        assert_eq!(figures().estimated_cost(), Decimal::from(850));
    }

    #[test]
    fn resolution_time_defaults_to_hour_upper_bound() {
        assert_eq!(figures().estimated_resolution_hours(), Decimal::from(10));
    }

    #[test]
    fn resolution_multiplier_scales_resolution_time() {
        let mut figures = figures();
        figures.resolution_multiplier = Some(Decimal::new(15, 1));
        assert_eq!(figures.estimated_resolution_hours(), Decimal::from(15));
    }

    #[test]
    fn rejects_inverted_hour_bounds() {
        let mut figures = figures();
        figures.estimated_hours_minimum = Decimal::from(12);
        let error = figures.validate().expect_err("min > max should fail");
        assert!(matches!(error, DomainError::InvalidQuoteFigures { .. }));
    }

    #[test]
    fn rejects_negative_rate() {
        let mut figures = figures();
        figures.hourly_rate = Decimal::from(-1);
        assert!(figures.validate().is_err());
    }

    #[test]
    fn with_changes_carries_unchanged_fields_forward() {
        let base = figures();
        let changes =
            QuoteChanges { hourly_rate: Some(Decimal::from(95)), ..QuoteChanges::default() };

        let next = base.with_changes(&changes);

        assert_eq!(next.hourly_rate, Decimal::from(95));
        assert_eq!(next.estimated_hours_minimum, base.estimated_hours_minimum);
        assert_eq!(next.estimated_hours_maximum, base.estimated_hours_maximum);
        assert_eq!(next.confidence_level, base.confidence_level);
        assert_eq!(next.estimated_cost(), Decimal::from(950));
    }

    #[test]
    fn empty_changes_report_empty() {
        assert!(QuoteChanges::default().is_empty());
        let changes =
            QuoteChanges { fixed_cost: Some(Decimal::ZERO), ..QuoteChanges::default() };
        assert!(!changes.is_empty());
    }
}
