//! Payment ledger domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::{Error, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Penalty,
    Payment,
    Donation,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Penalty => "penalty",
            TransactionType::Payment => "payment",
            TransactionType::Donation => "donation",
        }
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "penalty" => Ok(TransactionType::Penalty),
            "payment" => Ok(TransactionType::Payment),
            "donation" => Ok(TransactionType::Donation),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown transaction type '{}'",
                other
            )))),
        }
    }
}

/// Append-only ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTransaction {
    pub id: String,
    pub user_id: String,
    pub group_id: String,
    /// Always positive; the type decides the sign in the balance.
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub description: String,
    /// Set for `penalty` rows; at most one row per penalty.
    pub penalty_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPaymentTransaction {
    pub user_id: String,
    pub group_id: String,
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub description: String,
    pub penalty_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A member's balance derived from the transaction log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub user_id: String,
    pub total_penalties: Decimal,
    pub total_payments: Decimal,
    pub total_donations: Decimal,
    pub net_owed: Decimal,
}

impl Balance {
    pub fn from_transactions(user_id: &str, transactions: &[PaymentTransaction]) -> Self {
        let sum_of = |kind: TransactionType| -> Decimal {
            transactions
                .iter()
                .filter(|t| t.transaction_type == kind)
                .map(|t| t.amount)
                .sum()
        };
        let total_penalties = sum_of(TransactionType::Penalty);
        let total_payments = sum_of(TransactionType::Payment);
        let total_donations = sum_of(TransactionType::Donation);
        Self {
            user_id: user_id.to_string(),
            total_penalties,
            total_payments,
            total_donations,
            net_owed: total_penalties - total_payments - total_donations,
        }
    }
}

/// Outcome of re-deriving a member's cached owed total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub user_id: String,
    pub cached_before: Decimal,
    pub derived: Decimal,
    pub drift_corrected: bool,
}

/// Input for recording a payment or donation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContribution {
    pub amount: Decimal,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tx(kind: TransactionType, amount: Decimal) -> PaymentTransaction {
        PaymentTransaction {
            id: format!("{}-{}", kind.as_str(), amount),
            user_id: "u1".to_string(),
            group_id: "g1".to_string(),
            amount,
            transaction_type: kind,
            description: String::new(),
            penalty_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_balance_from_transactions() {
        let log = vec![
            tx(TransactionType::Penalty, dec!(10)),
            tx(TransactionType::Penalty, dec!(10)),
            tx(TransactionType::Payment, dec!(5)),
            tx(TransactionType::Donation, dec!(2.5)),
        ];
        let balance = Balance::from_transactions("u1", &log);
        assert_eq!(balance.total_penalties, dec!(20));
        assert_eq!(balance.total_payments, dec!(5));
        assert_eq!(balance.total_donations, dec!(2.5));
        assert_eq!(balance.net_owed, dec!(12.5));
    }

    #[test]
    fn test_empty_log_owes_nothing() {
        assert_eq!(Balance::from_transactions("u1", &[]).net_owed, Decimal::ZERO);
    }
}
