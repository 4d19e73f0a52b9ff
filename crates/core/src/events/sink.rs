//! Chat event sink trait and implementations.

use std::sync::{Arc, Mutex};

use super::ChatEvent;

/// Trait for receiving chat events.
///
/// Core services emit events through this trait after a mutation has
/// committed.
///
/// # Design Rules
///
/// - `emit()` must be fast and non-blocking (no network calls, no DB writes)
/// - Implementations should queue events for async processing
/// - Failure to emit must not affect domain operations (best-effort)
pub trait ChatEventSink: Send + Sync {
    /// Emit a single chat event.
    fn emit(&self, event: ChatEvent);

    /// Emit multiple chat events.
    ///
    /// Default implementation calls `emit()` for each event.
    fn emit_batch(&self, events: Vec<ChatEvent>) {
        for event in events {
            self.emit(event);
        }
    }
}

/// No-op implementation for contexts that don't post to chat.
#[derive(Clone, Default)]
pub struct NoOpChatEventSink;

impl ChatEventSink for NoOpChatEventSink {
    fn emit(&self, _event: ChatEvent) {}
}

/// Mock sink for testing - collects emitted events.
#[derive(Clone, Default)]
pub struct MockChatEventSink {
    events: Arc<Mutex<Vec<ChatEvent>>>,
}

impl MockChatEventSink {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns all collected events.
    pub fn events(&self) -> Vec<ChatEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Returns the rendered messages of all collected events.
    pub fn messages(&self) -> Vec<String> {
        self.events().iter().map(ChatEvent::message).collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().unwrap().is_empty()
    }
}

impl ChatEventSink for MockChatEventSink {
    fn emit(&self, event: ChatEvent) {
        self.events.lock().unwrap().push(event);
    }
}
