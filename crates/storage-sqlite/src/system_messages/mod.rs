mod model;
mod repository;

pub use model::SystemMessageDB;
pub use repository::SystemMessageRepository;
