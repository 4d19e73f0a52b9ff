use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::errors::Result;
use crate::penalties::penalties_model::{
    NewPenalty, PenaltyStatus, PendingPenalty, StatusTransition,
};

/// Trait for penalty repository operations
#[async_trait]
pub trait PenaltyRepositoryTrait: Send + Sync {
    /// Fails with `PenaltyError::NotFound` when the id is unknown.
    fn get_penalty(&self, penalty_id: &str) -> Result<PendingPenalty>;
    fn find_penalty(&self, user_id: &str, date: NaiveDate) -> Result<Option<PendingPenalty>>;
    fn list_for_user_by_status(
        &self,
        user_id: &str,
        status: PenaltyStatus,
    ) -> Result<Vec<PendingPenalty>>;
    fn list_for_group_on_date(&self, group_id: &str, date: NaiveDate)
        -> Result<Vec<PendingPenalty>>;
    fn list_for_group_by_status(
        &self,
        group_id: &str,
        status: PenaltyStatus,
    ) -> Result<Vec<PendingPenalty>>;
    /// Pending penalties whose deadline is strictly before `now`.
    fn list_expired_pending(&self, now: DateTime<Utc>) -> Result<Vec<PendingPenalty>>;

    /// Fails with `PenaltyError::DuplicateKind` when (user, date) already has a row.
    async fn insert_penalty(&self, new_penalty: NewPenalty) -> Result<PendingPenalty>;
    /// Conditional status update. Zero affected rows is reported as
    /// `PenaltyError::AlreadyResolved` (or `NotFound` if the row is gone).
    async fn transition(&self, transition: StatusTransition) -> Result<PendingPenalty>;
    /// Deletes the given penalties that are still pending. Returns the ids deleted.
    async fn delete_pending(&self, penalty_ids: Vec<String>) -> Result<Vec<String>>;
}

/// Trait for the penalty ledger: creation and non-member transitions.
#[async_trait]
pub trait PenaltyLedgerTrait: Send + Sync {
    fn get_penalty(&self, penalty_id: &str) -> Result<PendingPenalty>;
    fn list_group_penalties(&self, group_id: &str, date: NaiveDate)
        -> Result<Vec<PendingPenalty>>;
    fn list_disputed(&self, group_id: &str) -> Result<Vec<PendingPenalty>>;
    async fn create_penalty(&self, new_penalty: NewPenalty) -> Result<PendingPenalty>;
    async fn mark_auto_accepted(
        &self,
        penalty_id: &str,
        now: DateTime<Utc>,
    ) -> Result<PendingPenalty>;
    /// Auto-accepts every pending penalty past its deadline. Returns the ids transitioned.
    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<Vec<String>>;
    async fn waive(
        &self,
        penalty_id: &str,
        admin_id: &str,
        now: DateTime<Utc>,
    ) -> Result<PendingPenalty>;
    async fn delete_for_exemption(&self, penalty_ids: Vec<String>) -> Result<Vec<String>>;
}
