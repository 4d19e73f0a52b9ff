mod model;
mod repository;

pub use model::SickDayDB;
pub use repository::ExemptionRepository;
