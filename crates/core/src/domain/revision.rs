use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::quote::QuoteId;
use crate::domain::ticket::UserId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RevisionId(pub String);

impl RevisionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// The closed set of quote fields the audit trail tracks. Diffing is typed:
/// each field has one comparison rule, so loosely-formatted input can never
/// fabricate a revision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteField {
    EstimatedHoursMinimum,
    EstimatedHoursMaximum,
    HourlyRate,
    FixedCost,
    EffortLevel,
    ConfidenceLevel,
}

impl QuoteField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EstimatedHoursMinimum => "estimated_hours_minimum",
            Self::EstimatedHoursMaximum => "estimated_hours_maximum",
            Self::HourlyRate => "hourly_rate",
            Self::FixedCost => "fixed_cost",
            Self::EffortLevel => "effort_level",
            Self::ConfidenceLevel => "confidence_level",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "estimated_hours_minimum" => Some(Self::EstimatedHoursMinimum),
            "estimated_hours_maximum" => Some(Self::EstimatedHoursMaximum),
            "hourly_rate" => Some(Self::HourlyRate),
            "fixed_cost" => Some(Self::FixedCost),
            "effort_level" => Some(Self::EffortLevel),
            "confidence_level" => Some(Self::ConfidenceLevel),
            _ => None,
        }
    }
}

/// One audit-log row: a single field's before/after within one update
/// operation. Rows from the same operation share `reason`, `changed_by`, and
/// `created_at`. Append-only, never edited.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteDetailRevision {
    pub id: RevisionId,
    /// The quote version row the update produced.
    pub quote_id: QuoteId,
    pub field: QuoteField,
    pub old_value: String,
    pub new_value: String,
    pub reason: String,
    pub changed_by: UserId,
    pub created_at: DateTime<Utc>,
}
