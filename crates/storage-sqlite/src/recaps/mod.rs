mod model;
mod repository;

pub use model::RecapPublicationDB;
pub use repository::RecapPublicationRepository;
