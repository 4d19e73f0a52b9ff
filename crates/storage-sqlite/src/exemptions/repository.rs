use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use uuid::Uuid;

use commitment_core::errors::Error;
use commitment_core::exemptions::{ExemptionRepositoryTrait, NewSickDay, SickDay};
use commitment_core::Result;

use super::model::SickDayDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::{is_unique_violation, StorageError};
use crate::schema::sick_days;
use crate::utils::{chunk_for_sqlite, format_date, format_timestamp};

pub struct ExemptionRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl ExemptionRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        ExemptionRepository { pool, writer }
    }
}

#[async_trait]
impl ExemptionRepositoryTrait for ExemptionRepository {
    fn get_sick_day(&self, user_id: &str, date: NaiveDate) -> Result<Option<SickDay>> {
        let mut conn = get_connection(&self.pool)?;
        sick_days::table
            .filter(sick_days::user_id.eq(user_id))
            .filter(sick_days::date.eq(format_date(date)))
            .select(SickDayDB::as_select())
            .first::<SickDayDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(SickDay::try_from)
            .transpose()
    }

    fn list_sick_days(&self, user_id: &str, dates: &[NaiveDate]) -> Result<Vec<SickDay>> {
        let mut conn = get_connection(&self.pool)?;
        let keys: Vec<String> = dates.iter().map(|d| format_date(*d)).collect();

        let mut result = Vec::new();
        for chunk in chunk_for_sqlite(&keys) {
            let rows = sick_days::table
                .filter(sick_days::user_id.eq(user_id))
                .filter(sick_days::date.eq_any(chunk))
                .order(sick_days::date.asc())
                .select(SickDayDB::as_select())
                .load::<SickDayDB>(&mut conn)
                .map_err(StorageError::from)?;
            for row in rows {
                result.push(SickDay::try_from(row)?);
            }
        }
        Ok(result)
    }

    async fn insert_sick_day(
        &self,
        user_id: &str,
        new_sick_day: NewSickDay,
        created_at: DateTime<Utc>,
    ) -> Result<SickDay> {
        let row = SickDayDB {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            date: format_date(new_sick_day.date),
            kind: new_sick_day.kind.as_str().to_string(),
            note: new_sick_day.note,
            created_at: format_timestamp(created_at),
        };

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<SickDay> {
                let inserted = diesel::insert_into(sick_days::table)
                    .values(&row)
                    .returning(SickDayDB::as_returning())
                    .get_result(conn)
                    .map_err(|e| {
                        if is_unique_violation(&e) {
                            Error::ConstraintViolation(format!(
                                "A sick day is already recorded for {}",
                                row.date
                            ))
                        } else {
                            StorageError::from(e).into()
                        }
                    })?;
                SickDay::try_from(inserted)
            })
            .await
    }

    async fn delete_sick_day(&self, user_id: &str, date: NaiveDate) -> Result<usize> {
        let user_id = user_id.to_string();
        let date = format_date(date);
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let removed = diesel::delete(
                    sick_days::table
                        .filter(sick_days::user_id.eq(&user_id))
                        .filter(sick_days::date.eq(&date)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(removed)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_test_db, day, ts, TestDb};
    use commitment_core::exemptions::SickDayKind;

    async fn create_test_repository() -> (ExemptionRepository, TestDb) {
        let db = create_test_db().await;
        let repo = ExemptionRepository::new(Arc::clone(&db.pool), db.writer.clone());
        (repo, db)
    }

    fn sick_day(d: u32, kind: SickDayKind) -> NewSickDay {
        NewSickDay {
            date: day(d),
            kind,
            note: Some("fever".to_string()),
        }
    }

    #[tokio::test]
    async fn test_record_and_list_sick_days() {
        let (repo, _db) = create_test_repository().await;
        repo.insert_sick_day("sam", sick_day(1, SickDayKind::Sick), ts(2024, 3, 1, 8))
            .await
            .unwrap();
        repo.insert_sick_day("sam", sick_day(2, SickDayKind::Recovery), ts(2024, 3, 2, 8))
            .await
            .unwrap();

        let found = repo.get_sick_day("sam", day(2)).unwrap().unwrap();
        assert_eq!(found.kind, SickDayKind::Recovery);
        assert_eq!(found.note.as_deref(), Some("fever"));
        assert!(repo.get_sick_day("alex", day(2)).unwrap().is_none());

        let listed = repo.list_sick_days("sam", &[day(1), day(3)]).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].date, day(1));
        assert!(repo.list_sick_days("sam", &[]).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_sick_day_is_a_constraint_violation() {
        let (repo, _db) = create_test_repository().await;
        repo.insert_sick_day("sam", sick_day(1, SickDayKind::Sick), ts(2024, 3, 1, 8))
            .await
            .unwrap();
        let err = repo
            .insert_sick_day("sam", sick_day(1, SickDayKind::Recovery), ts(2024, 3, 1, 9))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation(_)));
    }

    #[tokio::test]
    async fn test_delete_reports_rows_removed() {
        let (repo, _db) = create_test_repository().await;
        repo.insert_sick_day("sam", sick_day(1, SickDayKind::Sick), ts(2024, 3, 1, 8))
            .await
            .unwrap();
        assert_eq!(repo.delete_sick_day("sam", day(1)).await.unwrap(), 1);
        assert_eq!(repo.delete_sick_day("sam", day(1)).await.unwrap(), 0);
    }
}
