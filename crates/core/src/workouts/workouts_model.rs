use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A logged workout. Points sum per (user, date) into the daily total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutLog {
    pub id: String,
    pub user_id: String,
    pub group_id: String,
    pub date: NaiveDate,
    pub exercise: String,
    pub points: i32,
    pub logged_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkoutLog {
    pub date: NaiveDate,
    pub exercise: String,
    pub points: i32,
}

/// Fully resolved insert row, produced by the service.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutEntry {
    pub user_id: String,
    pub group_id: String,
    pub date: NaiveDate,
    pub exercise: String,
    pub points: i32,
    pub logged_at: DateTime<Utc>,
}
