mod model;
mod repository;

pub use model::WorkoutLogDB;
pub use repository::WorkoutRepository;
