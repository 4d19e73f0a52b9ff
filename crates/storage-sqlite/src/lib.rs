//! SQLite storage implementation for the commitment engine.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository traits defined in `commitment-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - Repository implementations for groups, penalties, the payment log,
//!   sick days, workouts, posted recaps and the chat outbox
//! - Database-specific model types (with Diesel derives)
//!
//! # Architecture
//!
//! This crate is the only place in the application where Diesel dependencies exist.
//! `core` is database-agnostic and works with traits.
//!
//! ```text
//!     core (domain)
//!           │
//!           ▼
//!  storage-sqlite (this crate)
//!           │
//!           ▼
//!       SQLite DB
//! ```
//!
//! All writes go through the single writer actor (`WriteHandle`), one
//! IMMEDIATE transaction per job. Reads use the r2d2 pool.

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod exemptions;
pub mod groups;
pub mod penalties;
pub mod recaps;
pub mod system_messages;
pub mod transactions;
pub mod workouts;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

pub use exemptions::ExemptionRepository;
pub use groups::GroupRepository;
pub use penalties::PenaltyRepository;
pub use recaps::RecapPublicationRepository;
pub use system_messages::{SystemMessageDB, SystemMessageRepository};
pub use transactions::TransactionRepository;
pub use workouts::WorkoutRepository;

// Re-export from commitment-core for convenience
pub use commitment_core::errors::{DatabaseError, Error, Result};

#[cfg(test)]
mod test_support;
