use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use log::debug;

use super::workouts_model::{NewWorkoutLog, WorkoutEntry, WorkoutLog};
use super::workouts_traits::{WorkoutRepositoryTrait, WorkoutServiceTrait};
use crate::errors::{Result, ValidationError};
use crate::groups::GroupRepositoryTrait;

pub struct WorkoutService {
    workout_repository: Arc<dyn WorkoutRepositoryTrait>,
    group_repository: Arc<dyn GroupRepositoryTrait>,
}

impl WorkoutService {
    pub fn new(
        workout_repository: Arc<dyn WorkoutRepositoryTrait>,
        group_repository: Arc<dyn GroupRepositoryTrait>,
    ) -> Self {
        WorkoutService {
            workout_repository,
            group_repository,
        }
    }
}

#[async_trait]
impl WorkoutServiceTrait for WorkoutService {
    fn daily_points(&self, user_id: &str, date: NaiveDate) -> Result<i32> {
        self.workout_repository.total_points_for_day(user_id, date)
    }

    fn list_for_day(&self, user_id: &str, date: NaiveDate) -> Result<Vec<WorkoutLog>> {
        self.workout_repository.list_for_day(user_id, date)
    }

    async fn log_workout(&self, user_id: &str, new_workout: NewWorkoutLog) -> Result<WorkoutLog> {
        let exercise = new_workout.exercise.trim().to_string();
        if exercise.is_empty() {
            return Err(ValidationError::MissingField("exercise".to_string()).into());
        }
        if new_workout.points < 0 {
            return Err(ValidationError::InvalidInput(
                "workout points cannot be negative".to_string(),
            )
            .into());
        }
        let member = self.group_repository.get_member(user_id)?;

        let log = self
            .workout_repository
            .insert_workout(WorkoutEntry {
                user_id: member.user_id,
                group_id: member.group_id,
                date: new_workout.date,
                exercise,
                points: new_workout.points,
                logged_at: Utc::now(),
            })
            .await?;
        debug!(
            "Logged {} points of {} for {} on {}",
            log.points, log.exercise, log.user_id, log.date
        );
        Ok(log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use crate::test_support::InMemoryStore;

    fn workout(day: u32, exercise: &str, points: i32) -> NewWorkoutLog {
        NewWorkoutLog {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            exercise: exercise.to_string(),
            points,
        }
    }

    #[tokio::test]
    async fn test_points_sum_per_day() {
        let store = Arc::new(InMemoryStore::with_group());
        let service = WorkoutService::new(store.clone(), store.clone());

        service.log_workout("sam", workout(1, "run", 20)).await.unwrap();
        service.log_workout("sam", workout(1, " pushups ", 15)).await.unwrap();
        service.log_workout("sam", workout(2, "swim", 40)).await.unwrap();

        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(service.daily_points("sam", day).unwrap(), 35);
        assert_eq!(service.list_for_day("sam", day).unwrap()[1].exercise, "pushups");
        assert_eq!(
            service
                .daily_points("sam", NaiveDate::from_ymd_opt(2024, 3, 3).unwrap())
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_rejects_invalid_workouts() {
        let store = Arc::new(InMemoryStore::with_group());
        let service = WorkoutService::new(store.clone(), store.clone());

        assert!(matches!(
            service.log_workout("sam", workout(1, "run", -5)).await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            service.log_workout("sam", workout(1, "  ", 5)).await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            service.log_workout("nobody", workout(1, "run", 5)).await,
            Err(Error::Database(_))
        ));
    }
}
