use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use rust_decimal::Decimal;

use commitment_core::errors::{DatabaseError, Error};
use commitment_core::transactions::{
    Balance, NewPaymentTransaction, PaymentTransaction, TransactionRepositoryTrait,
};
use commitment_core::Result;

use super::model::PaymentTransactionDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{payment_transactions, profiles};
use crate::utils::parse_decimal;

fn load_for_user(conn: &mut SqliteConnection, user_id: &str) -> Result<Vec<PaymentTransaction>> {
    payment_transactions::table
        .filter(payment_transactions::user_id.eq(user_id))
        .order(payment_transactions::created_at.asc())
        .select(PaymentTransactionDB::as_select())
        .load::<PaymentTransactionDB>(conn)
        .map_err(StorageError::from)?
        .into_iter()
        .map(PaymentTransaction::try_from)
        .collect()
}

/// Appends one ledger row. Must run inside a writer job.
pub(crate) fn append_transaction(
    conn: &mut SqliteConnection,
    new_transaction: NewPaymentTransaction,
) -> Result<PaymentTransaction> {
    let row: PaymentTransactionDB = new_transaction.into();
    let inserted = diesel::insert_into(payment_transactions::table)
        .values(&row)
        .returning(PaymentTransactionDB::as_returning())
        .get_result(conn)
        .map_err(StorageError::from)?;
    PaymentTransaction::try_from(inserted)
}

/// Re-sums the member's log and overwrites `profiles.total_penalty_owed`.
/// Must run inside the same writer job as the write it follows.
pub(crate) fn refresh_owed_total(conn: &mut SqliteConnection, user_id: &str) -> Result<Decimal> {
    let transactions = load_for_user(conn, user_id)?;
    let net = Balance::from_transactions(user_id, &transactions).net_owed;
    let updated = diesel::update(profiles::table.find(user_id))
        .set(profiles::total_penalty_owed.eq(net.to_string()))
        .execute(conn)
        .map_err(StorageError::from)?;
    if updated == 0 {
        return Err(DatabaseError::NotFound(format!("member {}", user_id)).into());
    }
    Ok(net)
}

pub struct TransactionRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl TransactionRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        TransactionRepository { pool, writer }
    }
}

#[async_trait]
impl TransactionRepositoryTrait for TransactionRepository {
    fn get_transaction(&self, transaction_id: &str) -> Result<PaymentTransaction> {
        let mut conn = get_connection(&self.pool)?;
        payment_transactions::table
            .find(transaction_id)
            .select(PaymentTransactionDB::as_select())
            .first::<PaymentTransactionDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .ok_or_else(|| DatabaseError::NotFound(format!("transaction {}", transaction_id)))?
            .try_into()
    }

    fn list_for_user(&self, user_id: &str) -> Result<Vec<PaymentTransaction>> {
        let mut conn = get_connection(&self.pool)?;
        load_for_user(&mut conn, user_id)
    }

    fn cached_owed_total(&self, user_id: &str) -> Result<Decimal> {
        let mut conn = get_connection(&self.pool)?;
        let cached = profiles::table
            .find(user_id)
            .select(profiles::total_penalty_owed)
            .first::<String>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .ok_or_else(|| DatabaseError::NotFound(format!("member {}", user_id)))?;
        parse_decimal(&cached)
    }

    async fn append(&self, new_transaction: NewPaymentTransaction) -> Result<PaymentTransaction> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<PaymentTransaction> {
                let transaction = append_transaction(conn, new_transaction)?;
                refresh_owed_total(conn, &transaction.user_id)?;
                Ok(transaction)
            })
            .await
    }

    async fn refresh_owed_total(&self, user_id: &str) -> Result<Decimal> {
        let user_id = user_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Decimal> {
                refresh_owed_total(conn, &user_id)
            })
            .await
    }

    async fn delete_manual_correction(&self, transaction_id: &str) -> Result<PaymentTransaction> {
        let transaction_id = transaction_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<PaymentTransaction> {
                let row = payment_transactions::table
                    .find(&transaction_id)
                    .select(PaymentTransactionDB::as_select())
                    .first::<PaymentTransactionDB>(conn)
                    .optional()
                    .map_err(StorageError::from)?
                    .ok_or_else(|| {
                        DatabaseError::NotFound(format!("transaction {}", transaction_id))
                    })?;
                if row.penalty_id.is_some() {
                    return Err(Error::ConstraintViolation(format!(
                        "transaction {} is a penalty charge and cannot be removed",
                        transaction_id
                    )));
                }

                diesel::delete(payment_transactions::table.find(&transaction_id))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                let removed = PaymentTransaction::try_from(row)?;
                refresh_owed_total(conn, &removed.user_id)?;
                Ok(removed)
            })
            .await
    }
}
