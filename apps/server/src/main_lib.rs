use std::sync::Arc;

use crate::{chat_events::OutboxChatEventSink, config::Config};
use commitment_core::{
    evaluation::{EvaluationService, EvaluationServiceTrait},
    events::ChatEventSink,
    exemptions::{ExemptionService, ExemptionServiceTrait},
    groups::{GroupService, GroupServiceTrait},
    penalties::{PenaltyLedgerTrait, PenaltyService},
    recap::{RecapService, RecapServiceTrait},
    responses::{ResponseService, ResponseServiceTrait},
    transactions::{BalanceService, BalanceServiceTrait},
    workouts::{WorkoutService, WorkoutServiceTrait},
};
use commitment_storage_sqlite::{
    db, ExemptionRepository, GroupRepository, PenaltyRepository, RecapPublicationRepository,
    SystemMessageRepository, TransactionRepository, WorkoutRepository,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub struct AppState {
    pub group_service: Arc<dyn GroupServiceTrait>,
    pub workout_service: Arc<dyn WorkoutServiceTrait>,
    pub balance_service: Arc<dyn BalanceServiceTrait>,
    pub penalty_service: Arc<dyn PenaltyLedgerTrait>,
    pub response_service: Arc<dyn ResponseServiceTrait>,
    pub exemption_service: Arc<dyn ExemptionServiceTrait>,
    pub evaluation_service: Arc<dyn EvaluationServiceTrait>,
    pub recap_service: Arc<dyn RecapServiceTrait>,
    pub system_messages: Arc<SystemMessageRepository>,
    pub cron_secret: Option<String>,
    pub db_path: String,
}

pub fn init_tracing() {
    let log_format = std::env::var("CM_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = db::spawn_writer((*pool).clone());

    let group_repository = Arc::new(GroupRepository::new(pool.clone(), writer.clone()));
    let workout_repository = Arc::new(WorkoutRepository::new(pool.clone(), writer.clone()));
    let penalty_repository = Arc::new(PenaltyRepository::new(pool.clone(), writer.clone()));
    let transaction_repository =
        Arc::new(TransactionRepository::new(pool.clone(), writer.clone()));
    let exemption_repository = Arc::new(ExemptionRepository::new(pool.clone(), writer.clone()));
    let system_messages = Arc::new(SystemMessageRepository::new(pool.clone(), writer.clone()));
    let recap_publications = Arc::new(RecapPublicationRepository::new(writer.clone()));

    let chat_event_sink: Arc<dyn ChatEventSink> =
        Arc::new(OutboxChatEventSink::start(system_messages.clone()));

    let group_service = Arc::new(GroupService::new(group_repository.clone()));
    let workout_service = Arc::new(WorkoutService::new(
        workout_repository.clone(),
        group_repository.clone(),
    ));
    let balance_service = Arc::new(BalanceService::new(
        transaction_repository.clone(),
        group_repository.clone(),
    ));

    let penalty_service = Arc::new(PenaltyService::new(
        penalty_repository.clone(),
        group_repository.clone(),
        balance_service.clone(),
        chat_event_sink.clone(),
    ));
    let response_service = Arc::new(ResponseService::new(
        penalty_repository.clone(),
        group_repository.clone(),
        balance_service.clone(),
        chat_event_sink.clone(),
    ));
    let exemption_service = Arc::new(ExemptionService::new(
        exemption_repository.clone(),
        penalty_repository.clone(),
        penalty_service.clone(),
        group_repository.clone(),
        chat_event_sink.clone(),
    ));
    let evaluation_service = Arc::new(EvaluationService::new(
        group_repository.clone(),
        workout_repository.clone(),
        penalty_repository.clone(),
        exemption_service.clone(),
        penalty_service.clone(),
    ));
    let recap_service = Arc::new(RecapService::new(
        group_repository.clone(),
        penalty_repository.clone(),
        penalty_repository.clone(),
        balance_service.clone(),
        recap_publications,
        chat_event_sink.clone(),
    ));

    Ok(Arc::new(AppState {
        group_service,
        workout_service,
        balance_service,
        penalty_service,
        response_service,
        exemption_service,
        evaluation_service,
        recap_service,
        system_messages,
        cron_secret: config.cron_secret.clone(),
        db_path,
    }))
}
