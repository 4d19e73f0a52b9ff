use std::sync::Arc;

use chrono::Utc;
use commitment_core::events::ChatEvent;
use commitment_storage_sqlite::SystemMessageRepository;
use tokio::sync::mpsc;

/// Drains the channel into the outbox, one row per event, in emit order.
pub async fn outbox_worker(
    mut rx: mpsc::UnboundedReceiver<ChatEvent>,
    repository: Arc<SystemMessageRepository>,
) {
    tracing::info!("Chat outbox worker started");

    while let Some(event) = rx.recv().await {
        match repository.insert(&event, Utc::now()).await {
            Ok(row) => tracing::info!(
                group_id = %row.group_id,
                event_type = %row.event_type,
                "Posted system message: {}",
                row.message
            ),
            Err(e) => tracing::error!(
                group_id = %event.group_id(),
                "Failed to store system message: {}",
                e
            ),
        }
    }

    tracing::info!("Chat outbox worker shutting down");
}
