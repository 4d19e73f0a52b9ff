//! Database models for groups and member profiles.

use chrono::Weekday;
use diesel::prelude::*;

use commitment_core::groups::{Group, Member};
use commitment_core::Result;

use crate::utils::{parse_decimal, parse_timestamp};

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::challenge_groups)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct GroupDB {
    pub id: String,
    pub name: String,
    pub target_points: i32,
    pub penalty_rate: String,
    pub currency_symbol: String,
    pub timezone: String,
    pub created_at: String,
}

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::profiles)]
#[diesel(primary_key(user_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProfileDB {
    pub user_id: String,
    pub group_id: String,
    pub username: String,
    pub is_admin: bool,
    /// Comma separated short weekday names, e.g. `Sat,Sun`.
    pub rest_days: String,
    pub total_penalty_owed: String,
    pub joined_at: String,
}

pub fn encode_rest_days(days: &[Weekday]) -> String {
    days.iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn decode_rest_days(value: &str) -> Vec<Weekday> {
    value
        .split(',')
        .filter_map(|d| d.trim().parse::<Weekday>().ok())
        .collect()
}

impl TryFrom<GroupDB> for Group {
    type Error = commitment_core::Error;

    fn try_from(db: GroupDB) -> Result<Self> {
        Ok(Group {
            penalty_rate: parse_decimal(&db.penalty_rate)?,
            created_at: parse_timestamp(&db.created_at)?,
            id: db.id,
            name: db.name,
            target_points: db.target_points,
            currency_symbol: db.currency_symbol,
            timezone: db.timezone,
        })
    }
}

impl TryFrom<ProfileDB> for Member {
    type Error = commitment_core::Error;

    fn try_from(db: ProfileDB) -> Result<Self> {
        Ok(Member {
            rest_days: decode_rest_days(&db.rest_days),
            total_penalty_owed: parse_decimal(&db.total_penalty_owed)?,
            joined_at: parse_timestamp(&db.joined_at)?,
            user_id: db.user_id,
            group_id: db.group_id,
            username: db.username,
            is_admin: db.is_admin,
        })
    }
}
