//! Database models for the payment transaction log.

use diesel::prelude::*;

use commitment_core::transactions::{NewPaymentTransaction, PaymentTransaction, TransactionType};
use commitment_core::Result;
use uuid::Uuid;

use crate::utils::{format_timestamp, parse_decimal, parse_timestamp};

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::payment_transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PaymentTransactionDB {
    pub id: String,
    pub user_id: String,
    pub group_id: String,
    pub amount: String,
    pub transaction_type: String,
    pub description: String,
    pub penalty_id: Option<String>,
    pub created_at: String,
}

impl From<NewPaymentTransaction> for PaymentTransactionDB {
    fn from(domain: NewPaymentTransaction) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            user_id: domain.user_id,
            group_id: domain.group_id,
            amount: domain.amount.to_string(),
            transaction_type: domain.transaction_type.as_str().to_string(),
            description: domain.description,
            penalty_id: domain.penalty_id,
            created_at: format_timestamp(domain.created_at),
        }
    }
}

impl TryFrom<PaymentTransactionDB> for PaymentTransaction {
    type Error = commitment_core::Error;

    fn try_from(db: PaymentTransactionDB) -> Result<Self> {
        Ok(PaymentTransaction {
            amount: parse_decimal(&db.amount)?,
            transaction_type: db.transaction_type.parse::<TransactionType>()?,
            created_at: parse_timestamp(&db.created_at)?,
            id: db.id,
            user_id: db.user_id,
            group_id: db.group_id,
            description: db.description,
            penalty_id: db.penalty_id,
        })
    }
}
