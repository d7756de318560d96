//! Pure quote calculation: ticket attributes + rate profile + active rules
//! in, draft figures out. No I/O, no clock, no side effects.

use rust_decimal::Decimal;

use crate::domain::quote::QuoteFigures;
use crate::domain::rates::RateProfile;
use crate::domain::rules::QuoteCalculationRule;
use crate::domain::ticket::TicketSnapshot;
use crate::errors::DomainError;

/// Select the winning rule for a ticket: most specific key first, recency of
/// activation as the tie-break. Inactive rules never participate.
pub fn select_rule<'a>(
    ticket: &TicketSnapshot,
    rules: &'a [QuoteCalculationRule],
) -> Option<&'a QuoteCalculationRule> {
    let mut matching: Vec<&QuoteCalculationRule> =
        rules.iter().filter(|rule| rule.active && rule.matches(ticket)).collect();

    matching.sort_by(|left, right| {
        right
            .specificity()
            .cmp(&left.specificity())
            .then_with(|| right.activated_at.cmp(&left.activated_at))
            .then_with(|| left.id.0.cmp(&right.id.0))
    });

    matching.into_iter().next()
}

/// Produce draft figures for a ticket. Fixed cost starts at zero; the hourly
/// rate comes from the organization's profile at the rule's effort level.
pub fn calculate(
    ticket: &TicketSnapshot,
    profile: &RateProfile,
    rules: &[QuoteCalculationRule],
) -> Result<QuoteFigures, DomainError> {
    let rule = select_rule(ticket, rules)
        .ok_or_else(|| DomainError::NoApplicableRule { ticket_id: ticket.id.0.clone() })?;

    let figures = QuoteFigures {
        estimated_hours_minimum: rule.hours_min,
        estimated_hours_maximum: rule.hours_max,
        hourly_rate: profile.rate_for(rule.effort_level),
        fixed_cost: Decimal::ZERO,
        effort_level: rule.effort_level,
        confidence_level: Some(rule.confidence_level),
        resolution_multiplier: rule.resolution_multiplier,
    };

    figures.validate()?;
    Ok(figures)
}
