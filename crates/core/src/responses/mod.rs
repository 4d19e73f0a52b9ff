//! Responses module - members accepting or disputing their penalties.

mod responses_model;
mod responses_service;

pub use responses_model::{PenaltyResponse, ResponseOutcome};
pub use responses_service::{ResponseService, ResponseServiceTrait};
