//! Commitment Core - Domain entities, services, and traits.
//!
//! This crate contains the accountability rules: daily target evaluation,
//! the penalty ledger and its state machine, member responses, exemptions,
//! balances and the daily recap. It is database-agnostic and defines traits
//! that are implemented by the `storage-sqlite` crate.

pub mod constants;
pub mod errors;
pub mod evaluation;
pub mod events;
pub mod exemptions;
pub mod groups;
pub mod penalties;
pub mod recap;
pub mod responses;
pub mod transactions;
pub mod utils;
pub mod workouts;

#[cfg(test)]
mod test_support;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
