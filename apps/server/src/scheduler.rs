//! Background scheduler for the penalty lifecycle.
//!
//! Two loops: the deadline sweep on `CM_SWEEP_INTERVAL_SECS`, and the daily
//! evaluation hourly. Groups close their day at local midnight, so the daily
//! run fires every hour and relies on evaluation being idempotent.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::api::cron::run_daily_and_publish;
use crate::main_lib::AppState;

/// Daily evaluation cadence.
const DAILY_RUN_INTERVAL_SECS: u64 = 60 * 60;

/// Initial delay before the first run, to let the server finish starting.
const INITIAL_DELAY_SECS: u64 = 10;

pub fn start_penalty_scheduler(state: Arc<AppState>, sweep_every: Duration) {
    let sweep_state = state.clone();
    tokio::spawn(async move {
        info!("Penalty sweep scheduler started ({}s interval)", sweep_every.as_secs());
        tokio::time::sleep(Duration::from_secs(INITIAL_DELAY_SECS)).await;

        let mut ticker = interval(sweep_every);
        loop {
            ticker.tick().await;
            run_scheduled_sweep(&sweep_state).await;
        }
    });

    tokio::spawn(async move {
        info!("Daily evaluation scheduler started (hourly)");
        tokio::time::sleep(Duration::from_secs(INITIAL_DELAY_SECS)).await;

        let mut ticker = interval(Duration::from_secs(DAILY_RUN_INTERVAL_SECS));
        loop {
            ticker.tick().await;
            run_scheduled_evaluation(&state).await;
        }
    });
}

async fn run_scheduled_sweep(state: &Arc<AppState>) {
    match state.penalty_service.sweep_expired(Utc::now()).await {
        Ok(ids) if ids.is_empty() => debug!("Sweep found no expired penalties"),
        Ok(ids) => info!("Sweep auto-accepted {} penalties", ids.len()),
        Err(e) => warn!("Scheduled sweep failed: {}", e),
    }
}

async fn run_scheduled_evaluation(state: &Arc<AppState>) {
    match run_daily_and_publish(state, Utc::now()).await {
        Ok(response) => {
            let created: usize = response
                .report
                .groups
                .iter()
                .map(|g| g.created_penalty_ids.len())
                .sum();
            info!(
                "Scheduled evaluation: {} penalties created, {} recaps posted",
                created,
                response.recaps_published.len()
            );
        }
        Err(e) => warn!("Scheduled evaluation failed: {}", e),
    }
}
