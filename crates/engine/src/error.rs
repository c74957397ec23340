use thiserror::Error;
use uuid::Uuid;

use crate::models::{CategoryKind, TrioViolation};
use crate::services::formation::FormationState;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Unknown category: '{0}'")]
    UnknownCategory(String),

    #[error("Incomplete pool: {size} competitor(s) cannot be split evenly into trios")]
    IncompletePool { size: usize },

    #[error("Insufficient pool: {available} eligible competitor(s), at least 3 required")]
    InsufficientPool { available: usize },

    #[error(
        "Constraint unsatisfiable for category {category} after {attempts} attempt(s){}",
        describe_violations(.violations)
    )]
    ConstraintUnsatisfiable {
        category: CategoryKind,
        attempts: usize,
        violations: Vec<TrioViolation>,
    },

    #[error("Too many seeds: {seeds} seed(s) for {slots} trio(s)")]
    TooManySeeds { seeds: usize, slots: usize },

    #[error("Competitor {competitor_id} is assigned more than once")]
    DuplicateAssignment { competitor_id: Uuid },

    #[error("Invalid placements: {0}")]
    InvalidPlacement(String),

    #[error("Invalid trio: {0}")]
    InvalidTrio(TrioViolation),

    #[error("Conflict: competitor {competitor_id} already has a committed trio in event {event_id}")]
    Conflict { event_id: Uuid, competitor_id: Uuid },

    #[error("Unknown competitor: {0}")]
    UnknownCompetitor(Uuid),

    #[error("Result references unknown trio {trio_number}")]
    UnknownTrio { trio_number: u32 },

    #[error("Invalid prize amount {amount} for trio {trio_number}")]
    InvalidPrize {
        trio_number: u32,
        amount: rust_decimal::Decimal,
    },

    #[error("Handicap {0} is out of range, must be between 0 and 7")]
    HandicapOutOfRange(u8),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Illegal formation transition from {from:?} to {to:?}")]
    IllegalTransition {
        from: FormationState,
        to: FormationState,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            EngineError::Conflict { .. } | EngineError::DuplicateAssignment { .. }
        )
    }

    /// Failures a caller may resubmit with a different seed or a larger budget.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::ConstraintUnsatisfiable { .. })
    }
}

fn describe_violations(violations: &[TrioViolation]) -> String {
    match violations {
        [] => String::new(),
        [only] => format!(": {}", only),
        [first, rest @ ..] => format!(": {} (and {} more)", first, rest.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Violation;

    #[test]
    fn test_unsatisfiable_message_names_the_bound() {
        let err = EngineError::ConstraintUnsatisfiable {
            category: CategoryKind::Handicap,
            attempts: 200,
            violations: vec![TrioViolation {
                number: 1,
                members: [Uuid::nil(); 3],
                violation: Violation::HandicapSumExceeded {
                    total: 21,
                    limit: 11,
                },
            }],
        };

        let message = err.to_string();
        assert!(message.contains("handicap after 200 attempt(s)"));
        assert!(message.contains("handicap sum 21 exceeds the limit of 11"));
        assert!(err.is_retryable());
        assert!(!err.is_conflict());
    }

    #[test]
    fn test_conflict_predicates() {
        let err = EngineError::Conflict {
            event_id: Uuid::nil(),
            competitor_id: Uuid::nil(),
        };
        assert!(err.is_conflict());
        assert!(!err.is_retryable());
    }
}
