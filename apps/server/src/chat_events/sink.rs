use std::sync::Arc;

use commitment_core::events::{ChatEvent, ChatEventSink};
use commitment_storage_sqlite::SystemMessageRepository;
use tokio::sync::mpsc;

use super::worker::outbox_worker;

/// Chat event sink for the web server runtime.
///
/// `emit` only enqueues; the worker spawned by `start` owns the writes, so a
/// failing outbox never fails the mutation that produced the event.
pub struct OutboxChatEventSink {
    tx: mpsc::UnboundedSender<ChatEvent>,
}

impl OutboxChatEventSink {
    /// Creates the sink and spawns its worker. Must be called inside a Tokio runtime.
    pub fn start(repository: Arc<SystemMessageRepository>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(outbox_worker(rx, repository));
        Self { tx }
    }
}

impl ChatEventSink for OutboxChatEventSink {
    fn emit(&self, event: ChatEvent) {
        if let Err(e) = self.tx.send(event) {
            tracing::warn!("Chat outbox worker is gone, dropping event: {:?}", e.0);
        }
    }
}
