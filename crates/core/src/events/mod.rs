//! Chat events module.
//!
//! Provides the system-message events and the sink trait services emit them
//! through. Runtime adapters implement the sink to deliver messages to the
//! group chat.

mod chat_event;
mod sink;

pub use chat_event::*;
pub use sink::*;
