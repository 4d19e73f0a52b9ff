mod model;
mod repository;

pub use model::PendingPenaltyDB;
pub use repository::PenaltyRepository;
