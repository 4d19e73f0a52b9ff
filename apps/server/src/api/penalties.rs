use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use commitment_core::{
    penalties::PendingPenalty,
    responses::{PenaltyResponse, ResponseOutcome},
};

use crate::{auth::CurrentUser, error::ApiResult, main_lib::AppState};

/// The caller's pending penalties. Any that a sick day now covers are
/// cleared before the list is returned.
async fn list_pending(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<Vec<PendingPenalty>>> {
    Ok(Json(state.exemption_service.list_pending_for_user(&user_id).await?))
}

async fn get_penalty(
    Path(penalty_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<PendingPenalty>> {
    Ok(Json(state.penalty_service.get_penalty(&penalty_id)?))
}

async fn respond(
    Path(penalty_id): Path<String>,
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(response): Json<PenaltyResponse>,
) -> ApiResult<Json<ResponseOutcome>> {
    let action = response.action();
    let outcome = state
        .response_service
        .respond(&penalty_id, &user_id, response, Utc::now())
        .await?;
    tracing::info!("User {} chose {} on penalty {}", user_id, action, penalty_id);
    Ok(Json(outcome))
}

async fn waive(
    Path(penalty_id): Path<String>,
    State(state): State<Arc<AppState>>,
    CurrentUser(admin_id): CurrentUser,
) -> ApiResult<Json<PendingPenalty>> {
    let penalty = state
        .penalty_service
        .waive(&penalty_id, &admin_id, Utc::now())
        .await?;
    Ok(Json(penalty))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/penalties/pending", get(list_pending))
        .route("/penalties/{id}", get(get_penalty))
        .route("/penalties/{id}/respond", post(respond))
        .route("/penalties/{id}/waive", post(waive))
}
