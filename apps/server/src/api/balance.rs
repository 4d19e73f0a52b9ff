use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use commitment_core::transactions::{
    Balance, NewContribution, PaymentTransaction, ReconcileReport,
};

use crate::{
    auth::CurrentUser,
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

async fn get_balance(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<Balance>> {
    Ok(Json(state.balance_service.get_balance(&user_id)?))
}

async fn list_transactions(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<Vec<PaymentTransaction>>> {
    Ok(Json(state.balance_service.list_transactions(&user_id)?))
}

async fn reconcile(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<ReconcileReport>> {
    Ok(Json(state.balance_service.reconcile(&user_id).await?))
}

async fn record_payment(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(contribution): Json<NewContribution>,
) -> ApiResult<Json<PaymentTransaction>> {
    Ok(Json(state.balance_service.record_payment(&user_id, contribution).await?))
}

async fn record_donation(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(contribution): Json<NewContribution>,
) -> ApiResult<Json<PaymentTransaction>> {
    Ok(Json(state.balance_service.record_donation(&user_id, contribution).await?))
}

/// Removes a manual payment or donation. Admins only.
async fn remove_manual_correction(
    Path(transaction_id): Path<String>,
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<PaymentTransaction>> {
    let caller = state.group_service.get_member(&user_id)?;
    if !caller.is_admin {
        return Err(ApiError::Forbidden(
            "Only group admins can remove transactions.".to_string(),
        ));
    }
    let removed = state
        .balance_service
        .remove_manual_correction(&transaction_id)
        .await?;
    tracing::info!(
        "Admin {} removed transaction {} for {}",
        user_id,
        removed.id,
        removed.user_id
    );
    Ok(Json(removed))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/balance", get(get_balance))
        .route("/balance/transactions", get(list_transactions))
        .route("/balance/reconcile", post(reconcile))
        .route("/payments", post(record_payment))
        .route("/donations", post(record_donation))
        .route("/transactions/{id}", delete(remove_manual_correction))
}
