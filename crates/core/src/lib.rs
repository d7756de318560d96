pub mod calculator;
pub mod config;
pub mod diff;
pub mod domain;
pub mod errors;
pub mod permissions;

pub use domain::approval::{ApprovalId, ApprovalStatus, QuoteApproval};
pub use domain::quote::{
    ConfidenceLevel, EffortLevel, Quote, QuoteChanges, QuoteFigures, QuoteId,
};
pub use domain::rates::{RateProfile, RateProfileId};
pub use domain::revision::{QuoteDetailRevision, QuoteField, RevisionId};
pub use domain::rules::{QuoteCalculationRule, QuoteCalculationRuleId};
pub use domain::ticket::{
    BusinessImpactId, OrganizationId, TicketId, TicketSeverityId, TicketSnapshot, TicketTypeId,
    UserId,
};
pub use diff::FieldChange;
pub use errors::DomainError;
pub use permissions::{Capability, PermissionContext};
