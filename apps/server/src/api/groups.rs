use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use commitment_core::{
    groups::{Group, Member, NewGroup, NewMember},
    penalties::PendingPenalty,
    recap::DailyRecap,
    utils::time_utils::{parse_timezone, previous_local_day},
};
use commitment_storage_sqlite::SystemMessageDB;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    auth::CurrentUser,
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

const DEFAULT_MESSAGE_LIMIT: i64 = 50;

#[derive(Deserialize)]
struct DateQuery {
    date: Option<NaiveDate>,
}

#[derive(Deserialize)]
struct MessagesQuery {
    limit: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PotResponse {
    group_id: String,
    pot: Decimal,
    currency_symbol: String,
}

/// The requested day, or the group's most recently closed local day.
fn resolve_date(group: &Group, date: Option<NaiveDate>) -> ApiResult<NaiveDate> {
    match date {
        Some(date) => Ok(date),
        None => Ok(previous_local_day(Utc::now(), parse_timezone(&group.timezone)?)),
    }
}

async fn create_group(
    State(state): State<Arc<AppState>>,
    Json(new_group): Json<NewGroup>,
) -> ApiResult<Json<Group>> {
    let group = state.group_service.create_group(new_group).await?;
    tracing::info!("Created group {} ({})", group.id, group.name);
    Ok(Json(group))
}

async fn get_group(
    Path(group_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Group>> {
    Ok(Json(state.group_service.get_group(&group_id)?))
}

async fn list_members(
    Path(group_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Member>>> {
    state.group_service.get_group(&group_id)?;
    Ok(Json(state.group_service.list_members(&group_id)?))
}

/// The first member of a group may be added by anyone; after that only the
/// group's admins add members.
async fn add_member(
    Path(group_id): Path<String>,
    State(state): State<Arc<AppState>>,
    CurrentUser(caller_id): CurrentUser,
    Json(new_member): Json<NewMember>,
) -> ApiResult<Json<Member>> {
    let members = state.group_service.list_members(&group_id)?;
    let caller_is_admin = members.iter().any(|m| m.user_id == caller_id && m.is_admin);
    if !members.is_empty() && !caller_is_admin {
        return Err(ApiError::Forbidden(format!(
            "Only an admin of group {} can add members",
            group_id
        )));
    }
    let member = state.group_service.add_member(&group_id, new_member).await?;
    Ok(Json(member))
}

async fn get_recap(
    Path(group_id): Path<String>,
    Query(query): Query<DateQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<DailyRecap>> {
    let group = state.group_service.get_group(&group_id)?;
    let date = resolve_date(&group, query.date)?;
    Ok(Json(state.recap_service.build_recap(&group_id, date)?))
}

async fn get_pot(
    Path(group_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<PotResponse>> {
    let group = state.group_service.get_group(&group_id)?;
    let pot = state.balance_service.group_pot(&group_id)?;
    Ok(Json(PotResponse {
        group_id: group.id,
        pot,
        currency_symbol: group.currency_symbol,
    }))
}

async fn list_disputes(
    Path(group_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<PendingPenalty>>> {
    Ok(Json(state.penalty_service.list_disputed(&group_id)?))
}

async fn list_penalties(
    Path(group_id): Path<String>,
    Query(query): Query<DateQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<PendingPenalty>>> {
    let group = state.group_service.get_group(&group_id)?;
    let date = resolve_date(&group, query.date)?;
    Ok(Json(state.penalty_service.list_group_penalties(&group_id, date)?))
}

async fn list_messages(
    Path(group_id): Path<String>,
    Query(query): Query<MessagesQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<SystemMessageDB>>> {
    let limit = query.limit.unwrap_or(DEFAULT_MESSAGE_LIMIT).clamp(1, 500);
    Ok(Json(state.system_messages.list_recent(&group_id, limit)?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/groups", post(create_group))
        .route("/groups/{id}", get(get_group))
        .route("/groups/{id}/members", get(list_members).post(add_member))
        .route("/groups/{id}/recap", get(get_recap))
        .route("/groups/{id}/pot", get(get_pot))
        .route("/groups/{id}/disputes", get(list_disputes))
        .route("/groups/{id}/penalties", get(list_penalties))
        .route("/groups/{id}/messages", get(list_messages))
}
