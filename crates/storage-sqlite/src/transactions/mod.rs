mod model;
mod repository;

pub use model::PaymentTransactionDB;
pub(crate) use repository::{append_transaction, refresh_owed_total};
pub use repository::TransactionRepository;
