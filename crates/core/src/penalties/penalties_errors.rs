use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use super::penalties_model::PenaltyStatus;

/// Expected, recoverable failures of penalty operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PenaltyError {
    #[error("Penalty {0} not found")]
    NotFound(String),

    #[error("User {user_id} does not own penalty {penalty_id}")]
    Forbidden { penalty_id: String, user_id: String },

    #[error("Penalty {penalty_id} is already {status}")]
    AlreadyResolved {
        penalty_id: String,
        status: PenaltyStatus,
    },

    #[error("Dispute deadline for penalty {penalty_id} passed at {deadline}")]
    DeadlineExpired {
        penalty_id: String,
        deadline: DateTime<Utc>,
    },

    #[error("Invalid dispute: {0}")]
    ValidationFailed(String),

    #[error("A penalty already exists for user {user_id} on {date}")]
    DuplicateKind { user_id: String, date: NaiveDate },

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
}

impl PenaltyError {
    pub fn user_message(&self) -> String {
        match self {
            PenaltyError::NotFound(_) => "This penalty no longer exists.".to_string(),
            PenaltyError::Forbidden { .. } => {
                "You can only act on your own penalties.".to_string()
            }
            PenaltyError::AlreadyResolved { status, .. } => {
                format!("This penalty has already been resolved ({}).", status)
            }
            PenaltyError::DeadlineExpired { .. } => {
                "The 24-hour dispute window has closed. You can still accept the penalty."
                    .to_string()
            }
            PenaltyError::ValidationFailed(reason) => {
                format!("Your dispute is incomplete: {}", reason)
            }
            PenaltyError::DuplicateKind { date, .. } => {
                format!("A penalty for {} has already been issued.", date)
            }
            PenaltyError::InvariantViolation(_) => {
                "This action isn't allowed for the penalty's current state.".to_string()
            }
        }
    }
}
