//! Penalty domain models and the status transition table.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::RESPONSE_DEADLINE_HOURS;
use crate::errors::{Error, ValidationError};
use crate::transactions::{NewPaymentTransaction, TransactionType};

/// Lifecycle status of a penalty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyStatus {
    Pending,
    Accepted,
    Disputed,
    AutoAccepted,
    Waived,
}

impl PenaltyStatus {
    pub const ALL: [PenaltyStatus; 5] = [
        PenaltyStatus::Pending,
        PenaltyStatus::Accepted,
        PenaltyStatus::Disputed,
        PenaltyStatus::AutoAccepted,
        PenaltyStatus::Waived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PenaltyStatus::Pending => "pending",
            PenaltyStatus::Accepted => "accepted",
            PenaltyStatus::Disputed => "disputed",
            PenaltyStatus::AutoAccepted => "auto_accepted",
            PenaltyStatus::Waived => "waived",
        }
    }

    /// Transition table. Anything not listed here is rejected.
    ///
    /// ```text
    /// pending  -> accepted | disputed | auto_accepted
    /// disputed -> waived
    /// ```
    pub fn can_transition_to(&self, next: PenaltyStatus) -> bool {
        matches!(
            (self, next),
            (PenaltyStatus::Pending, PenaltyStatus::Accepted)
                | (PenaltyStatus::Pending, PenaltyStatus::Disputed)
                | (PenaltyStatus::Pending, PenaltyStatus::AutoAccepted)
                | (PenaltyStatus::Disputed, PenaltyStatus::Waived)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PenaltyStatus::Accepted | PenaltyStatus::AutoAccepted | PenaltyStatus::Waived
        )
    }

    /// Whether entering this status charges the member.
    pub fn charges_member(&self) -> bool {
        matches!(self, PenaltyStatus::Accepted | PenaltyStatus::AutoAccepted)
    }
}

impl fmt::Display for PenaltyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PenaltyStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PenaltyStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                Error::Validation(ValidationError::InvalidInput(format!(
                    "Unknown penalty status '{}'",
                    s
                )))
            })
    }
}

/// Reason a member gives when disputing a penalty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCategory {
    Sick,
    Injury,
    Travel,
    TechnicalIssue,
    Other,
}

impl ReasonCategory {
    pub const ALL: [ReasonCategory; 5] = [
        ReasonCategory::Sick,
        ReasonCategory::Injury,
        ReasonCategory::Travel,
        ReasonCategory::TechnicalIssue,
        ReasonCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCategory::Sick => "sick",
            ReasonCategory::Injury => "injury",
            ReasonCategory::Travel => "travel",
            ReasonCategory::TechnicalIssue => "technical_issue",
            ReasonCategory::Other => "other",
        }
    }

    /// Human readable label used in chat messages.
    pub fn label(&self) -> &'static str {
        match self {
            ReasonCategory::Sick => "Sick",
            ReasonCategory::Injury => "Injury",
            ReasonCategory::Travel => "Traveling",
            ReasonCategory::TechnicalIssue => "Technical issue",
            ReasonCategory::Other => "Other",
        }
    }
}

impl FromStr for ReasonCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReasonCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| {
                Error::Validation(ValidationError::InvalidInput(format!(
                    "Unknown reason category '{}'",
                    s
                )))
            })
    }
}

/// Domain model for a penalty row. One per (user, date) where the target was missed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingPenalty {
    pub id: String,
    pub user_id: String,
    pub group_id: String,
    pub date: NaiveDate,
    pub target_points: i32,
    pub actual_points: i32,
    pub penalty_amount: Decimal,
    pub status: PenaltyStatus,
    pub reason_category: Option<ReasonCategory>,
    pub reason_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub deadline: DateTime<Utc>,
    pub auto_accepted_at: Option<DateTime<Utc>>,
    pub waived_at: Option<DateTime<Utc>>,
    pub waived_by: Option<String>,
}

impl PendingPenalty {
    pub fn is_past_deadline(&self, now: DateTime<Utc>) -> bool {
        now > self.deadline
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

/// Input model for creating a new penalty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPenalty {
    pub user_id: String,
    pub group_id: String,
    pub date: NaiveDate,
    pub target_points: i32,
    pub actual_points: i32,
    pub penalty_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
}

impl NewPenalty {
    /// Builds a pending penalty charged at the group's per-miss `rate`,
    /// answerable until `now + 24h`.
    pub fn new(
        user_id: impl Into<String>,
        group_id: impl Into<String>,
        date: NaiveDate,
        target_points: i32,
        actual_points: i32,
        rate: Decimal,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            group_id: group_id.into(),
            date,
            target_points,
            actual_points,
            penalty_amount: rate,
            created_at: now,
            deadline: now + Duration::hours(RESPONSE_DEADLINE_HOURS),
        }
    }
}

/// A single compare-and-swap on a penalty's status.
///
/// Applied by the repository as `UPDATE .. WHERE id = ? AND status = from`.
/// When `charge` is present the ledger row is appended in the same store
/// transaction and the member's owed total is re-derived.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusTransition {
    pub penalty_id: String,
    pub user_id: String,
    pub from: PenaltyStatus,
    pub to: PenaltyStatus,
    pub at: DateTime<Utc>,
    pub reason_category: Option<ReasonCategory>,
    pub reason_message: Option<String>,
    pub waived_by: Option<String>,
    pub charge: Option<NewPaymentTransaction>,
}

impl StatusTransition {
    fn base(penalty: &PendingPenalty, to: PenaltyStatus, at: DateTime<Utc>) -> Self {
        Self {
            penalty_id: penalty.id.clone(),
            user_id: penalty.user_id.clone(),
            from: PenaltyStatus::Pending,
            to,
            at,
            reason_category: None,
            reason_message: None,
            waived_by: None,
            charge: None,
        }
    }

    pub fn accept(penalty: &PendingPenalty, at: DateTime<Utc>) -> Self {
        Self {
            charge: Some(penalty_charge(penalty, at)),
            ..Self::base(penalty, PenaltyStatus::Accepted, at)
        }
    }

    pub fn auto_accept(penalty: &PendingPenalty, at: DateTime<Utc>) -> Self {
        Self {
            charge: Some(penalty_charge(penalty, at)),
            ..Self::base(penalty, PenaltyStatus::AutoAccepted, at)
        }
    }

    pub fn dispute(
        penalty: &PendingPenalty,
        category: ReasonCategory,
        message: String,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            reason_category: Some(category),
            reason_message: Some(message),
            ..Self::base(penalty, PenaltyStatus::Disputed, at)
        }
    }

    pub fn waive(penalty: &PendingPenalty, admin_id: &str, at: DateTime<Utc>) -> Self {
        Self {
            from: PenaltyStatus::Disputed,
            waived_by: Some(admin_id.to_string()),
            ..Self::base(penalty, PenaltyStatus::Waived, at)
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.from.can_transition_to(self.to)
    }
}

fn penalty_charge(penalty: &PendingPenalty, at: DateTime<Utc>) -> NewPaymentTransaction {
    NewPaymentTransaction {
        user_id: penalty.user_id.clone(),
        group_id: penalty.group_id.clone(),
        amount: penalty.penalty_amount,
        transaction_type: TransactionType::Penalty,
        description: format!(
            "Missed target on {} ({}/{} points)",
            penalty.date, penalty.actual_points, penalty.target_points
        ),
        penalty_id: Some(penalty.id.clone()),
        created_at: at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn sample_penalty() -> PendingPenalty {
        let now = Utc.with_ymd_and_hms(2024, 3, 2, 6, 0, 0).unwrap();
        let new_penalty = NewPenalty::new(
            "user-1",
            "group-1",
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            50,
            30,
            dec!(10),
            now,
        );
        PendingPenalty {
            id: "penalty-1".to_string(),
            user_id: new_penalty.user_id,
            group_id: new_penalty.group_id,
            date: new_penalty.date,
            target_points: new_penalty.target_points,
            actual_points: new_penalty.actual_points,
            penalty_amount: new_penalty.penalty_amount,
            status: PenaltyStatus::Pending,
            reason_category: None,
            reason_message: None,
            created_at: new_penalty.created_at,
            responded_at: None,
            deadline: new_penalty.deadline,
            auto_accepted_at: None,
            waived_at: None,
            waived_by: None,
        }
    }

    #[test]
    fn test_transition_table() {
        use PenaltyStatus::*;
        assert!(Pending.can_transition_to(Accepted));
        assert!(Pending.can_transition_to(Disputed));
        assert!(Pending.can_transition_to(AutoAccepted));
        assert!(Disputed.can_transition_to(Waived));

        assert!(!Pending.can_transition_to(Waived));
        assert!(!Disputed.can_transition_to(Accepted));
        assert!(!Disputed.can_transition_to(Pending));
        for terminal in [Accepted, AutoAccepted, Waived] {
            assert!(terminal.is_terminal());
            for next in PenaltyStatus::ALL {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in PenaltyStatus::ALL {
            assert_eq!(status.as_str().parse::<PenaltyStatus>().unwrap(), status);
        }
        assert!("rejected".parse::<PenaltyStatus>().is_err());
    }

    #[test]
    fn test_new_penalty_deadline_is_24_hours() {
        let penalty = sample_penalty();
        assert_eq!(penalty.deadline - penalty.created_at, Duration::hours(24));
        assert_eq!(penalty.penalty_amount, dec!(10));
        assert!(!penalty.is_past_deadline(penalty.deadline));
        assert!(penalty.is_past_deadline(penalty.deadline + Duration::seconds(1)));
    }

    #[test]
    fn test_only_charging_transitions_carry_a_transaction() {
        let penalty = sample_penalty();
        let at = penalty.created_at + Duration::hours(1);

        let accept = StatusTransition::accept(&penalty, at);
        let charge = accept.charge.as_ref().unwrap();
        assert_eq!(charge.amount, dec!(10));
        assert_eq!(charge.transaction_type, TransactionType::Penalty);
        assert_eq!(charge.penalty_id.as_deref(), Some("penalty-1"));
        assert!(accept.is_allowed());

        let dispute =
            StatusTransition::dispute(&penalty, ReasonCategory::Sick, "flu".to_string(), at);
        assert!(dispute.charge.is_none());

        let waive = StatusTransition::waive(&penalty, "admin-1", at);
        assert!(waive.charge.is_none());
        assert_eq!(waive.from, PenaltyStatus::Disputed);
        assert!(waive.is_allowed());
    }
}
