//! Database models for penalties.

use diesel::prelude::*;
use uuid::Uuid;

use commitment_core::penalties::{NewPenalty, PenaltyStatus, PendingPenalty, ReasonCategory};
use commitment_core::Result;

use crate::utils::{
    format_date, format_timestamp, parse_date, parse_decimal, parse_optional_timestamp,
    parse_timestamp,
};

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::pending_penalties)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PendingPenaltyDB {
    pub id: String,
    pub user_id: String,
    pub group_id: String,
    pub date: String,
    pub target_points: i32,
    pub actual_points: i32,
    pub penalty_amount: String,
    pub status: String,
    pub reason_category: Option<String>,
    pub reason_message: Option<String>,
    pub created_at: String,
    pub responded_at: Option<String>,
    pub deadline: String,
    pub auto_accepted_at: Option<String>,
    pub waived_at: Option<String>,
    pub waived_by: Option<String>,
}

impl From<NewPenalty> for PendingPenaltyDB {
    fn from(domain: NewPenalty) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: domain.user_id,
            group_id: domain.group_id,
            date: format_date(domain.date),
            target_points: domain.target_points,
            actual_points: domain.actual_points,
            penalty_amount: domain.penalty_amount.to_string(),
            status: PenaltyStatus::Pending.as_str().to_string(),
            reason_category: None,
            reason_message: None,
            created_at: format_timestamp(domain.created_at),
            responded_at: None,
            deadline: format_timestamp(domain.deadline),
            auto_accepted_at: None,
            waived_at: None,
            waived_by: None,
        }
    }
}

impl TryFrom<PendingPenaltyDB> for PendingPenalty {
    type Error = commitment_core::Error;

    fn try_from(db: PendingPenaltyDB) -> Result<Self> {
        Ok(PendingPenalty {
            date: parse_date(&db.date)?,
            penalty_amount: parse_decimal(&db.penalty_amount)?,
            status: db.status.parse::<PenaltyStatus>()?,
            reason_category: db
                .reason_category
                .as_deref()
                .map(str::parse::<ReasonCategory>)
                .transpose()?,
            created_at: parse_timestamp(&db.created_at)?,
            responded_at: parse_optional_timestamp(db.responded_at)?,
            deadline: parse_timestamp(&db.deadline)?,
            auto_accepted_at: parse_optional_timestamp(db.auto_accepted_at)?,
            waived_at: parse_optional_timestamp(db.waived_at)?,
            id: db.id,
            user_id: db.user_id,
            group_id: db.group_id,
            target_points: db.target_points,
            actual_points: db.actual_points,
            reason_message: db.reason_message,
            waived_by: db.waived_by,
        })
    }
}
