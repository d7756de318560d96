use thiserror::Error;

use crate::domain::approval::ApprovalStatus;

/// Validation and state-machine failures owned by the domain layer. All are
/// caller-correctable; none should be retried as-is.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid quote figures: {reason}")]
    InvalidQuoteFigures { reason: String },
    #[error("a change reason is mandatory and must not be blank")]
    MissingReason,
    #[error("no active calculation rule matches ticket `{ticket_id}`")]
    NoApplicableRule { ticket_id: String },
    #[error("quote approval cannot be submitted while {status:?}")]
    InvalidApprovalTransition { status: ApprovalStatus },
}

#[cfg(test)]
mod tests {
    use crate::domain::approval::ApprovalStatus;

    use super::DomainError;

    #[test]
    fn display_includes_ticket_id() {
        let error = DomainError::NoApplicableRule { ticket_id: "T-9".to_string() };
        assert!(error.to_string().contains("T-9"));
    }

    #[test]
    fn display_includes_approval_status() {
        let error =
            DomainError::InvalidApprovalTransition { status: ApprovalStatus::PendingApproval };
        assert!(error.to_string().contains("PendingApproval"));
    }
}
