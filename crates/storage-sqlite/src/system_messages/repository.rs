use std::sync::Arc;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;

use commitment_core::events::ChatEvent;
use commitment_core::Result;

use super::model::SystemMessageDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::system_messages;

/// Outbox of rendered chat messages, one row per emitted event.
pub struct SystemMessageRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl SystemMessageRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        SystemMessageRepository { pool, writer }
    }

    pub async fn insert(&self, event: &ChatEvent, at: DateTime<Utc>) -> Result<SystemMessageDB> {
        let row = SystemMessageDB::from_event(event, at)?;
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<SystemMessageDB> {
                diesel::insert_into(system_messages::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(row)
            })
            .await
    }

    /// Newest first.
    pub fn list_recent(&self, group_id: &str, limit: i64) -> Result<Vec<SystemMessageDB>> {
        let mut conn = get_connection(&self.pool)?;
        Ok(system_messages::table
            .filter(system_messages::group_id.eq(group_id))
            .order(system_messages::created_at.desc())
            .limit(limit)
            .select(SystemMessageDB::as_select())
            .load::<SystemMessageDB>(&mut conn)
            .map_err(StorageError::from)?)
    }
}
