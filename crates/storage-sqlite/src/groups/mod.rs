mod model;
mod repository;

pub use model::{GroupDB, ProfileDB};
pub use repository::GroupRepository;
