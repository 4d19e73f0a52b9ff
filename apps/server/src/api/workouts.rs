use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use commitment_core::workouts::{NewWorkoutLog, WorkoutLog};
use serde::{Deserialize, Serialize};

use crate::{auth::CurrentUser, error::ApiResult, main_lib::AppState};

#[derive(Deserialize)]
struct DayQuery {
    date: Option<NaiveDate>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DailyWorkouts {
    date: NaiveDate,
    total_points: i32,
    workouts: Vec<WorkoutLog>,
}

async fn log_workout(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(new_workout): Json<NewWorkoutLog>,
) -> ApiResult<Json<WorkoutLog>> {
    Ok(Json(state.workout_service.log_workout(&user_id, new_workout).await?))
}

async fn list_workouts(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<DayQuery>,
) -> ApiResult<Json<DailyWorkouts>> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    Ok(Json(DailyWorkouts {
        date,
        total_points: state.workout_service.daily_points(&user_id, date)?,
        workouts: state.workout_service.list_for_day(&user_id, date)?,
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/workouts", get(list_workouts).post(log_workout))
}
