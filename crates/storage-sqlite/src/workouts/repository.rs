use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::dsl::sum;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;

use commitment_core::workouts::{WorkoutEntry, WorkoutLog, WorkoutRepositoryTrait};
use commitment_core::Result;

use super::model::WorkoutLogDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::workout_logs;
use crate::utils::format_date;

pub struct WorkoutRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl WorkoutRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        WorkoutRepository { pool, writer }
    }
}

#[async_trait]
impl WorkoutRepositoryTrait for WorkoutRepository {
    fn total_points_for_day(&self, user_id: &str, date: NaiveDate) -> Result<i32> {
        let mut conn = get_connection(&self.pool)?;
        // SUM over INTEGER comes back as BigInt.
        let total: Option<i64> = workout_logs::table
            .filter(workout_logs::user_id.eq(user_id))
            .filter(workout_logs::date.eq(format_date(date)))
            .select(sum(workout_logs::points))
            .first(&mut conn)
            .map_err(StorageError::from)?;
        Ok(total.unwrap_or(0).clamp(0, i32::MAX as i64) as i32)
    }

    fn list_for_day(&self, user_id: &str, date: NaiveDate) -> Result<Vec<WorkoutLog>> {
        let mut conn = get_connection(&self.pool)?;
        workout_logs::table
            .filter(workout_logs::user_id.eq(user_id))
            .filter(workout_logs::date.eq(format_date(date)))
            .order(workout_logs::logged_at.asc())
            .select(WorkoutLogDB::as_select())
            .load::<WorkoutLogDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(WorkoutLog::try_from)
            .collect()
    }

    async fn insert_workout(&self, entry: WorkoutEntry) -> Result<WorkoutLog> {
        let row: WorkoutLogDB = entry.into();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<WorkoutLog> {
                let inserted = diesel::insert_into(workout_logs::table)
                    .values(&row)
                    .returning(WorkoutLogDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                WorkoutLog::try_from(inserted)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_test_db, day, ts, TestDb};

    async fn create_test_repository() -> (WorkoutRepository, TestDb) {
        let db = create_test_db().await;
        let repo = WorkoutRepository::new(Arc::clone(&db.pool), db.writer.clone());
        (repo, db)
    }

    fn entry(d: u32, exercise: &str, points: i32, hour: u32) -> WorkoutEntry {
        WorkoutEntry {
            user_id: "sam".to_string(),
            group_id: "g1".to_string(),
            date: day(d),
            exercise: exercise.to_string(),
            points,
            logged_at: ts(2024, 3, d, hour),
        }
    }

    #[tokio::test]
    async fn test_daily_total_sums_logs_for_that_day_only() {
        let (repo, _db) = create_test_repository().await;
        assert_eq!(repo.total_points_for_day("sam", day(1)).unwrap(), 0);

        repo.insert_workout(entry(1, "Running", 20, 7)).await.unwrap();
        repo.insert_workout(entry(1, "Push-ups", 10, 18)).await.unwrap();
        repo.insert_workout(entry(2, "Cycling", 40, 7)).await.unwrap();

        assert_eq!(repo.total_points_for_day("sam", day(1)).unwrap(), 30);
        assert_eq!(repo.total_points_for_day("sam", day(2)).unwrap(), 40);
        assert_eq!(repo.total_points_for_day("alex", day(1)).unwrap(), 0);

        let logs = repo.list_for_day("sam", day(1)).unwrap();
        assert_eq!(
            logs.iter().map(|l| l.exercise.as_str()).collect::<Vec<_>>(),
            vec!["Running", "Push-ups"]
        );
    }

    #[tokio::test]
    async fn test_negative_points_are_rejected_by_the_store() {
        let (repo, _db) = create_test_repository().await;
        assert!(repo.insert_workout(entry(1, "Cheating", -5, 7)).await.is_err());
        assert_eq!(repo.total_points_for_day("sam", day(1)).unwrap(), 0);
    }
}
