use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::errors::Result;
use crate::exemptions::exemptions_model::{ExemptionKind, NewSickDay, SickDay};
use crate::groups::Member;
use crate::penalties::PendingPenalty;

/// Trait for sick and recovery day storage.
#[async_trait]
pub trait ExemptionRepositoryTrait: Send + Sync {
    fn get_sick_day(&self, user_id: &str, date: NaiveDate) -> Result<Option<SickDay>>;
    /// Sick and recovery days recorded for `user_id` on any of `dates`.
    fn list_sick_days(&self, user_id: &str, dates: &[NaiveDate]) -> Result<Vec<SickDay>>;
    async fn insert_sick_day(
        &self,
        user_id: &str,
        new_sick_day: NewSickDay,
        created_at: DateTime<Utc>,
    ) -> Result<SickDay>;
    /// Returns the number of rows removed.
    async fn delete_sick_day(&self, user_id: &str, date: NaiveDate) -> Result<usize>;
}

/// Trait for exemption service operations
#[async_trait]
pub trait ExemptionServiceTrait: Send + Sync {
    /// The exemption covering `date` for `member`, if any. Rest days win over sick days.
    fn exemption_for(&self, member: &Member, date: NaiveDate) -> Result<Option<ExemptionKind>>;
    /// The member's pending penalties after removing those a sick day now covers.
    async fn list_pending_for_user(&self, user_id: &str) -> Result<Vec<PendingPenalty>>;
    async fn record_sick_day(&self, user_id: &str, new_sick_day: NewSickDay) -> Result<SickDay>;
    async fn remove_sick_day(&self, user_id: &str, date: NaiveDate) -> Result<()>;
}
