use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use log::{debug, warn};
use rust_decimal::Decimal;

use super::transactions_model::{
    Balance, NewContribution, NewPaymentTransaction, PaymentTransaction, ReconcileReport,
    TransactionType,
};
use super::transactions_traits::{BalanceServiceTrait, TransactionRepositoryTrait};
use crate::errors::{Result, ValidationError};
use crate::groups::GroupRepositoryTrait;

/// Balance reads over the transaction log with a memoized per-member cache.
///
/// The cache is read-through and never feeds a write path. Each entry is
/// stamped with the member's write generation as it was before the log was
/// read, and is served only while that generation is still current.
pub struct BalanceService {
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    group_repository: Arc<dyn GroupRepositoryTrait>,
    cache: DashMap<String, (u64, Balance)>,
    generations: DashMap<String, u64>,
}

impl BalanceService {
    pub fn new(
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        group_repository: Arc<dyn GroupRepositoryTrait>,
    ) -> Self {
        BalanceService {
            transaction_repository,
            group_repository,
            cache: DashMap::new(),
            generations: DashMap::new(),
        }
    }

    fn generation(&self, user_id: &str) -> u64 {
        self.generations.get(user_id).map(|g| *g).unwrap_or(0)
    }

    fn derive_balance(&self, user_id: &str) -> Result<Balance> {
        let transactions = self.transaction_repository.list_for_user(user_id)?;
        Ok(Balance::from_transactions(user_id, &transactions))
    }

    async fn record_contribution(
        &self,
        user_id: &str,
        contribution: NewContribution,
        transaction_type: TransactionType,
    ) -> Result<PaymentTransaction> {
        if contribution.amount <= Decimal::ZERO {
            return Err(ValidationError::InvalidInput(format!(
                "{} amount must be positive",
                transaction_type.as_str()
            ))
            .into());
        }
        let member = self.group_repository.get_member(user_id)?;
        let description = contribution
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| match transaction_type {
                TransactionType::Donation => "Donation".to_string(),
                _ => "Payment".to_string(),
            });

        let result = self
            .transaction_repository
            .append(NewPaymentTransaction {
                user_id: member.user_id.clone(),
                group_id: member.group_id,
                amount: contribution.amount,
                transaction_type,
                description,
                penalty_id: None,
                created_at: Utc::now(),
            })
            .await;
        self.invalidate(user_id);
        result
    }
}

#[async_trait]
impl BalanceServiceTrait for BalanceService {
    fn get_balance(&self, user_id: &str) -> Result<Balance> {
        let generation = self.generation(user_id);
        if let Some(cached) = self.cache.get(user_id) {
            if cached.0 == generation {
                return Ok(cached.1.clone());
            }
        }
        let balance = self.derive_balance(user_id)?;
        self.cache.insert(user_id.to_string(), (generation, balance.clone()));
        Ok(balance)
    }

    fn list_transactions(&self, user_id: &str) -> Result<Vec<PaymentTransaction>> {
        self.transaction_repository.list_for_user(user_id)
    }

    fn invalidate(&self, user_id: &str) {
        *self.generations.entry(user_id.to_string()).or_insert(0) += 1;
        if self.cache.remove(user_id).is_some() {
            debug!("Dropped cached balance for {}", user_id);
        }
    }

    fn group_pot(&self, group_id: &str) -> Result<Decimal> {
        let members = self.group_repository.list_members(group_id)?;
        let mut pot = Decimal::ZERO;
        for member in members {
            pot += self.get_balance(&member.user_id)?.net_owed;
        }
        Ok(pot)
    }

    async fn record_payment(
        &self,
        user_id: &str,
        contribution: NewContribution,
    ) -> Result<PaymentTransaction> {
        self.record_contribution(user_id, contribution, TransactionType::Payment)
            .await
    }

    async fn record_donation(
        &self,
        user_id: &str,
        contribution: NewContribution,
    ) -> Result<PaymentTransaction> {
        self.record_contribution(user_id, contribution, TransactionType::Donation)
            .await
    }

    async fn reconcile(&self, user_id: &str) -> Result<ReconcileReport> {
        let cached_before = self.transaction_repository.cached_owed_total(user_id)?;
        let derived = self
            .transaction_repository
            .refresh_owed_total(user_id)
            .await?;
        self.invalidate(user_id);

        let drift_corrected = cached_before != derived;
        if drift_corrected {
            warn!(
                "Owed total for {} drifted: cached {} but log sums to {}",
                user_id, cached_before, derived
            );
        }
        Ok(ReconcileReport {
            user_id: user_id.to_string(),
            cached_before,
            derived,
            drift_corrected,
        })
    }

    async fn remove_manual_correction(&self, transaction_id: &str) -> Result<PaymentTransaction> {
        let removed = self
            .transaction_repository
            .delete_manual_correction(transaction_id)
            .await?;
        self.invalidate(&removed.user_id);
        warn!(
            "Removed manual correction {} ({} {}) for {}",
            removed.id,
            removed.transaction_type.as_str(),
            removed.amount,
            removed.user_id
        );
        Ok(removed)
    }
}
