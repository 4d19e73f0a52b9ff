use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, post},
    Json, Router,
};
use chrono::NaiveDate;
use commitment_core::exemptions::{NewSickDay, SickDay};

use crate::{auth::CurrentUser, error::ApiResult, main_lib::AppState};

async fn record_sick_day(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(new_sick_day): Json<NewSickDay>,
) -> ApiResult<Json<SickDay>> {
    Ok(Json(state.exemption_service.record_sick_day(&user_id, new_sick_day).await?))
}

async fn remove_sick_day(
    Path(date): Path<NaiveDate>,
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<StatusCode> {
    state.exemption_service.remove_sick_day(&user_id, date).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sick-days", post(record_sick_day))
        .route("/sick-days/{date}", delete(remove_sick_day))
}
