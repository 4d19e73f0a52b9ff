use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;

use commitment_core::recap::RecapPublicationRepositoryTrait;
use commitment_core::Result;

use super::model::RecapPublicationDB;
use crate::db::WriteHandle;
use crate::errors::StorageError;
use crate::schema::recap_publications;
use crate::utils::{format_date, format_timestamp};

pub struct RecapPublicationRepository {
    writer: WriteHandle,
}

impl RecapPublicationRepository {
    pub fn new(writer: WriteHandle) -> Self {
        RecapPublicationRepository { writer }
    }
}

#[async_trait]
impl RecapPublicationRepositoryTrait for RecapPublicationRepository {
    async fn mark_published(
        &self,
        group_id: &str,
        date: NaiveDate,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let row = RecapPublicationDB {
            group_id: group_id.to_string(),
            date: format_date(date),
            published_at: format_timestamp(at),
        };
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<bool> {
                let inserted = diesel::insert_or_ignore_into(recap_publications::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(inserted == 1)
            })
            .await
    }
}
