//! Exemptions module - rest, sick and recovery days.
//!
//! Rest days and dated sick/recovery days stop a day from being evaluated.
//! A sick day recorded after the fact removes the matching penalty as long
//! as it is still pending.

mod exemptions_model;
mod exemptions_service;
mod exemptions_traits;

pub use exemptions_model::{resolve_exemptions, ExemptionKind, NewSickDay, SickDay, SickDayKind};
pub use exemptions_service::ExemptionService;
pub use exemptions_traits::{ExemptionRepositoryTrait, ExemptionServiceTrait};
