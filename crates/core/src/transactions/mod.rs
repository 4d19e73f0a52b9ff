//! Transactions module - append-only payment ledger and derived balances.

mod transactions_model;
mod transactions_service;
mod transactions_traits;

pub use transactions_model::{
    Balance, NewContribution, NewPaymentTransaction, PaymentTransaction, ReconcileReport,
    TransactionType,
};
pub use transactions_service::BalanceService;
pub use transactions_traits::{BalanceServiceTrait, TransactionRepositoryTrait};
