use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::errors::Result;
use crate::evaluation::evaluation_model::{DailyRunReport, EvaluationSummary, MemberEvaluation};

/// Trait for the daily evaluation run.
///
/// Every operation is idempotent: re-running a day creates nothing new.
#[async_trait]
pub trait EvaluationServiceTrait: Send + Sync {
    async fn evaluate_member(
        &self,
        user_id: &str,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<MemberEvaluation>;
    async fn evaluate_group(
        &self,
        group_id: &str,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<EvaluationSummary>;
    /// Sweeps expired penalties, then evaluates every group for its previous local day.
    async fn run_daily(&self, now: DateTime<Utc>) -> Result<DailyRunReport>;
}
