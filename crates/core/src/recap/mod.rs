//! Recap module - the end-of-day group summary.

mod recap_model;
mod recap_service;
mod recap_traits;

pub use recap_model::{
    build_daily_recap, consecutive_clean_days, DailyRecap, RecapCounts, RecapMember,
};
pub use recap_service::RecapService;
pub use recap_traits::{RecapPublicationRepositoryTrait, RecapServiceTrait, StreakSourceTrait};
