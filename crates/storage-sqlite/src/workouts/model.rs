//! Database models for workout logs.

use diesel::prelude::*;
use uuid::Uuid;

use commitment_core::workouts::{WorkoutEntry, WorkoutLog};
use commitment_core::Result;

use crate::utils::{format_date, format_timestamp, parse_date, parse_timestamp};

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::workout_logs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WorkoutLogDB {
    pub id: String,
    pub user_id: String,
    pub group_id: String,
    pub date: String,
    pub exercise: String,
    pub points: i32,
    pub logged_at: String,
}

impl From<WorkoutEntry> for WorkoutLogDB {
    fn from(entry: WorkoutEntry) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: entry.user_id,
            group_id: entry.group_id,
            date: format_date(entry.date),
            exercise: entry.exercise,
            points: entry.points,
            logged_at: format_timestamp(entry.logged_at),
        }
    }
}

impl TryFrom<WorkoutLogDB> for WorkoutLog {
    type Error = commitment_core::Error;

    fn try_from(db: WorkoutLogDB) -> Result<Self> {
        Ok(WorkoutLog {
            date: parse_date(&db.date)?,
            logged_at: parse_timestamp(&db.logged_at)?,
            id: db.id,
            user_id: db.user_id,
            group_id: db.group_id,
            exercise: db.exercise,
            points: db.points,
        })
    }
}
