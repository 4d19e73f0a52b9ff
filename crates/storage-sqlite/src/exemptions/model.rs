//! Database models for sick and recovery days.

use diesel::prelude::*;

use commitment_core::exemptions::{SickDay, SickDayKind};
use commitment_core::Result;

use crate::utils::{parse_date, parse_timestamp};

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::sick_days)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SickDayDB {
    pub id: String,
    pub user_id: String,
    pub date: String,
    pub kind: String,
    pub note: Option<String>,
    pub created_at: String,
}

impl TryFrom<SickDayDB> for SickDay {
    type Error = commitment_core::Error;

    fn try_from(db: SickDayDB) -> Result<Self> {
        Ok(SickDay {
            date: parse_date(&db.date)?,
            kind: db.kind.parse::<SickDayKind>()?,
            created_at: parse_timestamp(&db.created_at)?,
            id: db.id,
            user_id: db.user_id,
            note: db.note,
        })
    }
}
