//! Group and member domain models.

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Domain model representing an accountability group and its daily rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    pub target_points: i32,
    /// Amount charged per missed day.
    pub penalty_rate: Decimal,
    pub currency_symbol: String,
    /// IANA timezone name used to decide which calendar day just closed.
    pub timezone: String,
    pub created_at: DateTime<Utc>,
}

/// Input model for creating a new group
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGroup {
    pub id: Option<String>,
    pub name: String,
    pub target_points: i32,
    pub penalty_rate: Decimal,
    pub currency_symbol: Option<String>,
    pub timezone: Option<String>,
}

/// A user's profile within a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub user_id: String,
    pub group_id: String,
    pub username: String,
    pub is_admin: bool,
    /// Weekly rest days; never evaluated.
    pub rest_days: Vec<Weekday>,
    /// Cached net owed balance, re-derived from the transaction log on every write.
    pub total_penalty_owed: Decimal,
    pub joined_at: DateTime<Utc>,
}

impl Member {
    pub fn is_rest_day(&self, date: NaiveDate) -> bool {
        use chrono::Datelike;
        self.rest_days.contains(&date.weekday())
    }
}

/// Input model for adding a member to a group
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMember {
    pub user_id: Option<String>,
    pub username: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub rest_days: Vec<Weekday>,
}
