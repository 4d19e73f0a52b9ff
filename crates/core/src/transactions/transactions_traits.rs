use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::errors::Result;
use crate::transactions::transactions_model::{
    Balance, NewContribution, NewPaymentTransaction, PaymentTransaction, ReconcileReport,
};

/// Trait for the append-only transaction log.
///
/// Every write re-derives the member's cached `total_penalty_owed` from the
/// log inside the same store transaction.
#[async_trait]
pub trait TransactionRepositoryTrait: Send + Sync {
    fn get_transaction(&self, transaction_id: &str) -> Result<PaymentTransaction>;
    fn list_for_user(&self, user_id: &str) -> Result<Vec<PaymentTransaction>>;
    /// The value currently stored on the member's profile.
    fn cached_owed_total(&self, user_id: &str) -> Result<Decimal>;
    async fn append(&self, new_transaction: NewPaymentTransaction) -> Result<PaymentTransaction>;
    /// Re-sums the log and stores the result on the profile.
    async fn refresh_owed_total(&self, user_id: &str) -> Result<Decimal>;
    /// Manual-correction cleanup. Refuses rows tied to a penalty.
    async fn delete_manual_correction(&self, transaction_id: &str) -> Result<PaymentTransaction>;
}

/// Trait for balance service operations
#[async_trait]
pub trait BalanceServiceTrait: Send + Sync {
    fn get_balance(&self, user_id: &str) -> Result<Balance>;
    fn list_transactions(&self, user_id: &str) -> Result<Vec<PaymentTransaction>>;
    /// Drops the memoized balance; called after every write touching `user_id`.
    fn invalidate(&self, user_id: &str);
    /// Sum of every member's net owed balance.
    fn group_pot(&self, group_id: &str) -> Result<Decimal>;
    async fn record_payment(
        &self,
        user_id: &str,
        contribution: NewContribution,
    ) -> Result<PaymentTransaction>;
    async fn record_donation(
        &self,
        user_id: &str,
        contribution: NewContribution,
    ) -> Result<PaymentTransaction>;
    async fn reconcile(&self, user_id: &str) -> Result<ReconcileReport>;
    async fn remove_manual_correction(&self, transaction_id: &str) -> Result<PaymentTransaction>;
}
