use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use log::debug;

use commitment_core::penalties::{
    NewPenalty, PenaltyError, PenaltyRepositoryTrait, PenaltyStatus, PendingPenalty,
    StatusTransition,
};
use commitment_core::recap::StreakSourceTrait;
use commitment_core::Result;

use super::model::PendingPenaltyDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::{is_unique_violation, StorageError};
use crate::schema::pending_penalties;
use crate::transactions::{append_transaction, refresh_owed_total};
use crate::utils::{chunk_for_sqlite, format_date, format_timestamp, parse_date};

/// Columns written by a status transition. `None` leaves the column untouched.
#[derive(AsChangeset)]
#[diesel(table_name = pending_penalties)]
struct StatusChange {
    status: String,
    reason_category: Option<String>,
    reason_message: Option<String>,
    responded_at: Option<String>,
    auto_accepted_at: Option<String>,
    waived_at: Option<String>,
    waived_by: Option<String>,
}

impl From<&StatusTransition> for StatusChange {
    fn from(transition: &StatusTransition) -> Self {
        let at = format_timestamp(transition.at);
        let mut change = StatusChange {
            status: transition.to.as_str().to_string(),
            reason_category: transition.reason_category.map(|c| c.as_str().to_string()),
            reason_message: transition.reason_message.clone(),
            responded_at: None,
            auto_accepted_at: None,
            waived_at: None,
            waived_by: None,
        };
        match transition.to {
            PenaltyStatus::Accepted | PenaltyStatus::Disputed => change.responded_at = Some(at),
            PenaltyStatus::AutoAccepted => change.auto_accepted_at = Some(at),
            PenaltyStatus::Waived => {
                change.waived_at = Some(at);
                change.waived_by = transition.waived_by.clone();
            }
            PenaltyStatus::Pending => {}
        }
        change
    }
}

fn load_penalty(conn: &mut SqliteConnection, penalty_id: &str) -> Result<PendingPenalty> {
    pending_penalties::table
        .find(penalty_id)
        .select(PendingPenaltyDB::as_select())
        .first::<PendingPenaltyDB>(conn)
        .optional()
        .map_err(StorageError::from)?
        .ok_or_else(|| PenaltyError::NotFound(penalty_id.to_string()))?
        .try_into()
}

fn collect_penalties(rows: Vec<PendingPenaltyDB>) -> Result<Vec<PendingPenalty>> {
    rows.into_iter().map(PendingPenalty::try_from).collect()
}

pub struct PenaltyRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl PenaltyRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        PenaltyRepository { pool, writer }
    }
}

#[async_trait]
impl PenaltyRepositoryTrait for PenaltyRepository {
    fn get_penalty(&self, penalty_id: &str) -> Result<PendingPenalty> {
        let mut conn = get_connection(&self.pool)?;
        load_penalty(&mut conn, penalty_id)
    }

    fn find_penalty(&self, user_id: &str, date: NaiveDate) -> Result<Option<PendingPenalty>> {
        let mut conn = get_connection(&self.pool)?;
        pending_penalties::table
            .filter(pending_penalties::user_id.eq(user_id))
            .filter(pending_penalties::date.eq(format_date(date)))
            .select(PendingPenaltyDB::as_select())
            .first::<PendingPenaltyDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(PendingPenalty::try_from)
            .transpose()
    }

    fn list_for_user_by_status(
        &self,
        user_id: &str,
        status: PenaltyStatus,
    ) -> Result<Vec<PendingPenalty>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = pending_penalties::table
            .filter(pending_penalties::user_id.eq(user_id))
            .filter(pending_penalties::status.eq(status.as_str()))
            .order(pending_penalties::date.asc())
            .select(PendingPenaltyDB::as_select())
            .load::<PendingPenaltyDB>(&mut conn)
            .map_err(StorageError::from)?;
        collect_penalties(rows)
    }

    fn list_for_group_on_date(
        &self,
        group_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<PendingPenalty>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = pending_penalties::table
            .filter(pending_penalties::group_id.eq(group_id))
            .filter(pending_penalties::date.eq(format_date(date)))
            .order(pending_penalties::created_at.asc())
            .select(PendingPenaltyDB::as_select())
            .load::<PendingPenaltyDB>(&mut conn)
            .map_err(StorageError::from)?;
        collect_penalties(rows)
    }

    fn list_for_group_by_status(
        &self,
        group_id: &str,
        status: PenaltyStatus,
    ) -> Result<Vec<PendingPenalty>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = pending_penalties::table
            .filter(pending_penalties::group_id.eq(group_id))
            .filter(pending_penalties::status.eq(status.as_str()))
            .order(pending_penalties::date.asc())
            .select(PendingPenaltyDB::as_select())
            .load::<PendingPenaltyDB>(&mut conn)
            .map_err(StorageError::from)?;
        collect_penalties(rows)
    }

    fn list_expired_pending(&self, now: DateTime<Utc>) -> Result<Vec<PendingPenalty>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = pending_penalties::table
            .filter(pending_penalties::status.eq(PenaltyStatus::Pending.as_str()))
            .filter(pending_penalties::deadline.lt(format_timestamp(now)))
            .order(pending_penalties::deadline.asc())
            .select(PendingPenaltyDB::as_select())
            .load::<PendingPenaltyDB>(&mut conn)
            .map_err(StorageError::from)?;
        collect_penalties(rows)
    }

    async fn insert_penalty(&self, new_penalty: NewPenalty) -> Result<PendingPenalty> {
        let user_id = new_penalty.user_id.clone();
        let date = new_penalty.date;
        let row: PendingPenaltyDB = new_penalty.into();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<PendingPenalty> {
                let inserted = diesel::insert_into(pending_penalties::table)
                    .values(&row)
                    .returning(PendingPenaltyDB::as_returning())
                    .get_result(conn)
                    .map_err(|e| {
                        if is_unique_violation(&e) {
                            commitment_core::Error::from(PenaltyError::DuplicateKind { user_id, date })
                        } else {
                            commitment_core::Error::from(StorageError::from(e))
                        }
                    })?;
                PendingPenalty::try_from(inserted)
            })
            .await
    }

    async fn transition(&self, transition: StatusTransition) -> Result<PendingPenalty> {
        if !transition.is_allowed() {
            return Err(PenaltyError::InvariantViolation(format!(
                "{} -> {} is not a valid transition",
                transition.from, transition.to
            ))
            .into());
        }

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<PendingPenalty> {
                let change = StatusChange::from(&transition);
                let updated = diesel::update(
                    pending_penalties::table
                        .filter(pending_penalties::id.eq(&transition.penalty_id))
                        .filter(pending_penalties::status.eq(transition.from.as_str())),
                )
                .set(&change)
                .execute(conn)
                .map_err(StorageError::from)?;

                if updated == 0 {
                    // Lost the race, or the row was never in `from`.
                    let current = load_penalty(conn, &transition.penalty_id)?;
                    debug!(
                        "Transition {} -> {} for penalty {} found it {}",
                        transition.from, transition.to, transition.penalty_id, current.status
                    );
                    return Err(PenaltyError::AlreadyResolved {
                        penalty_id: current.id,
                        status: current.status,
                    }
                    .into());
                }

                if let Some(charge) = transition.charge {
                    append_transaction(conn, charge)?;
                    refresh_owed_total(conn, &transition.user_id)?;
                }

                load_penalty(conn, &transition.penalty_id)
            })
            .await
    }

    async fn delete_pending(&self, penalty_ids: Vec<String>) -> Result<Vec<String>> {
        if penalty_ids.is_empty() {
            return Ok(Vec::new());
        }

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Vec<String>> {
                let mut deleted = Vec::with_capacity(penalty_ids.len());
                for chunk in chunk_for_sqlite(&penalty_ids) {
                    let still_pending = pending_penalties::table
                        .filter(pending_penalties::id.eq_any(chunk))
                        .filter(pending_penalties::status.eq(PenaltyStatus::Pending.as_str()))
                        .select(pending_penalties::id)
                        .load::<String>(conn)
                        .map_err(StorageError::from)?;
                    if still_pending.is_empty() {
                        continue;
                    }
                    diesel::delete(
                        pending_penalties::table
                            .filter(pending_penalties::id.eq_any(&still_pending))
                            .filter(
                                pending_penalties::status.eq(PenaltyStatus::Pending.as_str()),
                            ),
                    )
                    .execute(conn)
                    .map_err(StorageError::from)?;
                    deleted.extend(still_pending);
                }
                Ok(deleted)
            })
            .await
    }
}

impl StreakSourceTrait for PenaltyRepository {
    fn penalized_dates(
        &self,
        group_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NaiveDate>> {
        let mut conn = get_connection(&self.pool)?;
        pending_penalties::table
            .filter(pending_penalties::group_id.eq(group_id))
            .filter(pending_penalties::date.ge(format_date(from)))
            .filter(pending_penalties::date.le(format_date(to)))
            .filter(pending_penalties::status.ne(PenaltyStatus::Waived.as_str()))
            .select(pending_penalties::date)
            .distinct()
            .order(pending_penalties::date.desc())
            .load::<String>(&mut conn)
            .map_err(StorageError::from)?
            .iter()
            .map(|d| parse_date(d))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_test_db, day, new_penalty, ts, TestDb};
    use crate::transactions::TransactionRepository;
    use commitment_core::errors::Error;
    use commitment_core::penalties::ReasonCategory;
    use commitment_core::transactions::TransactionRepositoryTrait;
    use rust_decimal_macros::dec;

    async fn create_test_repository() -> (PenaltyRepository, TransactionRepository, TestDb) {
        let db = create_test_db().await;
        let penalties = PenaltyRepository::new(Arc::clone(&db.pool), db.writer.clone());
        let transactions = TransactionRepository::new(Arc::clone(&db.pool), db.writer.clone());
        (penalties, transactions, db)
    }

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let (repo, _, _db) = create_test_repository().await;
        let created = repo.insert_penalty(new_penalty("sam", 1)).await.unwrap();

        assert_eq!(created.status, PenaltyStatus::Pending);
        assert_eq!(created.penalty_amount, dec!(10));
        assert_eq!(repo.get_penalty(&created.id).unwrap(), created);
        assert_eq!(
            repo.find_penalty("sam", day(1)).unwrap().map(|p| p.id),
            Some(created.id.clone())
        );
        assert!(repo.find_penalty("sam", day(2)).unwrap().is_none());
        assert_eq!(repo.list_for_group_on_date("g1", day(1)).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_second_penalty_for_same_day_is_duplicate() {
        let (repo, _, _db) = create_test_repository().await;
        repo.insert_penalty(new_penalty("sam", 1)).await.unwrap();

        let err = repo.insert_penalty(new_penalty("sam", 1)).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Penalty(PenaltyError::DuplicateKind { ref user_id, .. }) if user_id == "sam"
        ));
        assert_eq!(repo.list_for_group_on_date("g1", day(1)).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_penalty_is_not_found() {
        let (repo, _, _db) = create_test_repository().await;
        assert!(matches!(
            repo.get_penalty("nope"),
            Err(Error::Penalty(PenaltyError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_accept_charges_once_and_rewrites_owed_total() {
        let (repo, transactions, _db) = create_test_repository().await;
        let penalty = repo.insert_penalty(new_penalty("sam", 1)).await.unwrap();
        let at = ts(2024, 3, 2, 9);

        let accepted = repo
            .transition(StatusTransition::accept(&penalty, at))
            .await
            .unwrap();
        assert_eq!(accepted.status, PenaltyStatus::Accepted);
        assert_eq!(accepted.responded_at, Some(at));

        let log = transactions.list_for_user("sam").unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].penalty_id.as_deref(), Some(penalty.id.as_str()));
        assert_eq!(transactions.cached_owed_total("sam").unwrap(), dec!(10));

        // The row is no longer pending; a second accept loses the CAS.
        let err = repo
            .transition(StatusTransition::accept(&penalty, at))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Penalty(PenaltyError::AlreadyResolved {
                status: PenaltyStatus::Accepted,
                ..
            })
        ));
        assert_eq!(transactions.list_for_user("sam").unwrap().len(), 1);
        assert_eq!(transactions.cached_owed_total("sam").unwrap(), dec!(10));
    }

    #[tokio::test]
    async fn test_dispute_then_waive_never_charges() {
        let (repo, transactions, _db) = create_test_repository().await;
        let penalty = repo.insert_penalty(new_penalty("sam", 1)).await.unwrap();

        let disputed = repo
            .transition(StatusTransition::dispute(
                &penalty,
                ReasonCategory::Sick,
                "flu".to_string(),
                ts(2024, 3, 2, 8),
            ))
            .await
            .unwrap();
        assert_eq!(disputed.reason_category, Some(ReasonCategory::Sick));
        assert_eq!(disputed.reason_message.as_deref(), Some("flu"));
        assert_eq!(repo.list_for_group_by_status("g1", PenaltyStatus::Disputed).unwrap().len(), 1);

        let waived = repo
            .transition(StatusTransition::waive(&disputed, "alex", ts(2024, 3, 2, 12)))
            .await
            .unwrap();
        assert_eq!(waived.status, PenaltyStatus::Waived);
        assert_eq!(waived.waived_by.as_deref(), Some("alex"));
        assert!(transactions.list_for_user("sam").unwrap().is_empty());
        assert_eq!(transactions.cached_owed_total("sam").unwrap(), dec!(0));
    }

    #[tokio::test]
    async fn test_transition_outside_table_is_rejected() {
        let (repo, _, _db) = create_test_repository().await;
        let penalty = repo.insert_penalty(new_penalty("sam", 1)).await.unwrap();
        let mut waive_from_pending = StatusTransition::waive(&penalty, "alex", ts(2024, 3, 2, 8));
        waive_from_pending.from = PenaltyStatus::Pending;

        let err = repo.transition(waive_from_pending).await.unwrap_err();
        assert!(matches!(err, Error::Penalty(PenaltyError::InvariantViolation(_))));
        assert_eq!(repo.get_penalty(&penalty.id).unwrap().status, PenaltyStatus::Pending);
    }

    #[tokio::test]
    async fn test_concurrent_transitions_resolve_to_one_winner() {
        let (repo, transactions, _db) = create_test_repository().await;
        let repo = Arc::new(repo);
        let penalty = repo.insert_penalty(new_penalty("sam", 1)).await.unwrap();
        let at = ts(2024, 3, 2, 9);

        let accept = {
            let repo = Arc::clone(&repo);
            let t = StatusTransition::accept(&penalty, at);
            tokio::spawn(async move { repo.transition(t).await })
        };
        let dispute = {
            let repo = Arc::clone(&repo);
            let t = StatusTransition::dispute(&penalty, ReasonCategory::Travel, "away".into(), at);
            tokio::spawn(async move { repo.transition(t).await })
        };
        let results = [accept.await.unwrap(), dispute.await.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let final_status = repo.get_penalty(&penalty.id).unwrap().status;
        let charges = transactions.list_for_user("sam").unwrap().len();
        match final_status {
            PenaltyStatus::Accepted => assert_eq!(charges, 1),
            PenaltyStatus::Disputed => assert_eq!(charges, 0),
            other => panic!("unexpected status {}", other),
        }
    }

    #[tokio::test]
    async fn test_expired_pending_uses_strict_deadline() {
        let (repo, _, _db) = create_test_repository().await;
        let penalty = repo.insert_penalty(new_penalty("sam", 1)).await.unwrap();

        assert!(repo.list_expired_pending(penalty.deadline).unwrap().is_empty());
        let expired = repo
            .list_expired_pending(penalty.deadline + chrono::Duration::microseconds(1))
            .unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, penalty.id);
    }

    #[tokio::test]
    async fn test_delete_pending_skips_resolved_rows() {
        let (repo, _, _db) = create_test_repository().await;
        let pending = repo.insert_penalty(new_penalty("sam", 1)).await.unwrap();
        let resolved = repo.insert_penalty(new_penalty("sam", 2)).await.unwrap();
        repo.transition(StatusTransition::accept(&resolved, ts(2024, 3, 3, 7)))
            .await
            .unwrap();

        let deleted = repo
            .delete_pending(vec![pending.id.clone(), resolved.id.clone(), "ghost".into()])
            .await
            .unwrap();
        assert_eq!(deleted, vec![pending.id.clone()]);
        assert!(repo.find_penalty("sam", day(1)).unwrap().is_none());
        assert!(repo.find_penalty("sam", day(2)).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_penalized_dates_ignore_waived() {
        let (repo, _, _db) = create_test_repository().await;
        repo.insert_penalty(new_penalty("sam", 1)).await.unwrap();
        repo.insert_penalty(new_penalty("alex", 1)).await.unwrap();
        let to_waive = repo.insert_penalty(new_penalty("sam", 3)).await.unwrap();
        let disputed = repo
            .transition(StatusTransition::dispute(
                &to_waive,
                ReasonCategory::Injury,
                "ankle".into(),
                ts(2024, 3, 4, 7),
            ))
            .await
            .unwrap();
        repo.transition(StatusTransition::waive(&disputed, "alex", ts(2024, 3, 4, 9)))
            .await
            .unwrap();

        let dates = repo.penalized_dates("g1", day(1), day(5)).unwrap();
        assert_eq!(dates, vec![day(1)]);
        assert!(repo.penalized_dates("g1", day(2), day(5)).unwrap().is_empty());
    }
}
