//! Chat delivery for the web server.
//!
//! Core services emit `ChatEvent`s through `OutboxChatEventSink`; a background
//! worker renders each one and appends it to the `system_messages` outbox.

mod sink;
mod worker;

pub use sink::OutboxChatEventSink;
