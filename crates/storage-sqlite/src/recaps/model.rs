//! Database model for posted daily recaps.

use diesel::prelude::*;

#[derive(Queryable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::recap_publications)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RecapPublicationDB {
    pub group_id: String,
    pub date: String,
    pub published_at: String,
}
