//! Penalties module - penalty records, their lifecycle, and the ledger service.

mod penalties_errors;
mod penalties_model;
mod penalties_service;
mod penalties_traits;

pub use penalties_errors::PenaltyError;
pub use penalties_model::{
    NewPenalty, PenaltyStatus, PendingPenalty, ReasonCategory, StatusTransition,
};
pub use penalties_service::PenaltyService;
pub use penalties_traits::{PenaltyLedgerTrait, PenaltyRepositoryTrait};
