//! Typed field-level diff between two sets of quote figures.
//!
//! Numeric fields compare by `Decimal` value, so `95` and `95.00` are the
//! same figure; enum fields compare by identity. Old/new values are rendered
//! to canonical text for the append-only audit log.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::quote::{ConfidenceLevel, QuoteFigures};
use crate::domain::revision::QuoteField;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: QuoteField,
    pub old_value: String,
    pub new_value: String,
}

/// Diff two figure sets over the closed field set, in stable field order.
/// An update that produces an empty diff is a no-op and must be rejected by
/// the store.
pub fn diff_figures(base: &QuoteFigures, next: &QuoteFigures) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    push_decimal(
        &mut changes,
        QuoteField::EstimatedHoursMinimum,
        base.estimated_hours_minimum,
        next.estimated_hours_minimum,
    );
    push_decimal(
        &mut changes,
        QuoteField::EstimatedHoursMaximum,
        base.estimated_hours_maximum,
        next.estimated_hours_maximum,
    );
    push_decimal(&mut changes, QuoteField::HourlyRate, base.hourly_rate, next.hourly_rate);
    push_decimal(&mut changes, QuoteField::FixedCost, base.fixed_cost, next.fixed_cost);

    if base.effort_level != next.effort_level {
        changes.push(FieldChange {
            field: QuoteField::EffortLevel,
            old_value: base.effort_level.as_str().to_string(),
            new_value: next.effort_level.as_str().to_string(),
        });
    }

    if base.confidence_level != next.confidence_level {
        changes.push(FieldChange {
            field: QuoteField::ConfidenceLevel,
            old_value: confidence_text(base.confidence_level),
            new_value: confidence_text(next.confidence_level),
        });
    }

    changes
}

pub fn decimal_text(value: Decimal) -> String {
    value.normalize().to_string()
}

fn confidence_text(value: Option<ConfidenceLevel>) -> String {
    value.map(|level| level.as_str().to_string()).unwrap_or_else(|| "unset".to_string())
}

fn push_decimal(changes: &mut Vec<FieldChange>, field: QuoteField, old: Decimal, new: Decimal) {
    if old != new {
        changes.push(FieldChange {
            field,
            old_value: decimal_text(old),
            new_value: decimal_text(new),
        });
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::domain::quote::{ConfidenceLevel, EffortLevel, QuoteFigures};
    use crate::domain::revision::QuoteField;

    use super::diff_figures;

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
    fn identical_figures_produce_no_changes() {
        assert!(diff_figures(&figures(), &figures()).is_empty());
    }

    #[test]
    fn rescaled_decimal_is_not_a_change() {
        let base = figures();
        let mut next = figures();
        next.hourly_rate = Decimal::new(8500, 2); // 85.00

        assert!(diff_figures(&base, &next).is_empty());
    }

    #[test]
    fn one_changed_field_yields_one_change_with_canonical_text() {
        let base = figures();
        let mut next = figures();
        next.hourly_rate = Decimal::new(9500, 2);

        let changes = diff_figures(&base, &next);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, QuoteField::HourlyRate);
        assert_eq!(changes[0].old_value, "85");
        assert_eq!(changes[0].new_value, "95");
    }

    #[test]
    fn every_differing_field_is_reported() {
        let base = figures();
        let mut next = figures();
        next.estimated_hours_minimum = Decimal::from(6);
        next.estimated_hours_maximum = Decimal::from(14);
        next.effort_level = EffortLevel::Medium;
        next.confidence_level = None;

        let changed: Vec<QuoteField> =
            diff_figures(&base, &next).into_iter().map(|change| change.field).collect();
        assert_eq!(
            changed,
            vec![
                QuoteField::EstimatedHoursMinimum,
                QuoteField::EstimatedHoursMaximum,
                QuoteField::EffortLevel,
                QuoteField::ConfidenceLevel,
            ]
        );
    }

    #[test]
    fn unset_confidence_renders_as_unset() {
        let base = figures();
        let mut next = figures();
        next.confidence_level = None;

        let changes = diff_figures(&base, &next);
        assert_eq!(changes[0].old_value, "medium");
        assert_eq!(changes[0].new_value, "unset");
    }
}
