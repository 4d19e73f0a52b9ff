use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::Result;
use crate::workouts::workouts_model::{NewWorkoutLog, WorkoutEntry, WorkoutLog};

/// Trait for workout repository operations
#[async_trait]
pub trait WorkoutRepositoryTrait: Send + Sync {
    /// Sum of logged points for the day; 0 when nothing was logged.
    fn total_points_for_day(&self, user_id: &str, date: NaiveDate) -> Result<i32>;
    fn list_for_day(&self, user_id: &str, date: NaiveDate) -> Result<Vec<WorkoutLog>>;
    async fn insert_workout(&self, entry: WorkoutEntry) -> Result<WorkoutLog>;
}

/// Trait for workout service operations
#[async_trait]
pub trait WorkoutServiceTrait: Send + Sync {
    fn daily_points(&self, user_id: &str, date: NaiveDate) -> Result<i32>;
    fn list_for_day(&self, user_id: &str, date: NaiveDate) -> Result<Vec<WorkoutLog>>;
    async fn log_workout(&self, user_id: &str, new_workout: NewWorkoutLog) -> Result<WorkoutLog>;
}
