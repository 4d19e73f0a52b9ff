use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use chrono::{DateTime, Utc};
use commitment_core::evaluation::{DailyRunReport, EvaluationSummary};
use serde::Serialize;

use crate::{error::ApiResult, main_lib::AppState};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyEvaluationResponse {
    #[serde(flatten)]
    pub report: DailyRunReport,
    /// Groups whose recap was posted by this run.
    pub recaps_published: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SweepResponse {
    auto_accepted: Vec<String>,
}

/// True when every member due for the day has a verdict.
fn is_settled(summary: &EvaluationSummary) -> bool {
    let evaluated = summary.met + summary.exempt + summary.missed + summary.already_evaluated;
    summary.failed_user_ids.is_empty() && evaluated > 0
}

/// Runs the daily evaluation and posts the recap of every settled group day
/// that has not been posted yet.
pub(crate) async fn run_daily_and_publish(
    state: &Arc<AppState>,
    now: DateTime<Utc>,
) -> ApiResult<DailyEvaluationResponse> {
    let report = state.evaluation_service.run_daily(now).await?;

    let mut recaps_published = Vec::new();
    for summary in report.groups.iter().filter(|s| is_settled(s)) {
        let Some(date) = summary.date else {
            continue;
        };
        match state
            .recap_service
            .publish_recap(&summary.group_id, date, now)
            .await
        {
            Ok(Some(_)) => recaps_published.push(summary.group_id.clone()),
            Ok(None) => {}
            Err(e) => tracing::warn!(
                "Failed to publish recap for group {} on {}: {}",
                summary.group_id,
                date,
                e
            ),
        }
    }

    Ok(DailyEvaluationResponse {
        report,
        recaps_published,
    })
}

async fn daily_evaluation(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<DailyEvaluationResponse>> {
    let response = run_daily_and_publish(&state, Utc::now()).await?;
    tracing::info!(
        "Daily evaluation: {} auto-accepted, {} groups, {} recaps",
        response.report.auto_accepted.len(),
        response.report.groups.len(),
        response.recaps_published.len()
    );
    Ok(Json(response))
}

async fn sweep(State(state): State<Arc<AppState>>) -> ApiResult<Json<SweepResponse>> {
    let auto_accepted = state.penalty_service.sweep_expired(Utc::now()).await?;
    Ok(Json(SweepResponse { auto_accepted }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/cron/daily-evaluation", post(daily_evaluation))
        .route("/cron/sweep", post(sweep))
}
