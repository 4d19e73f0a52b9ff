use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::errors::Result;
use crate::recap::recap_model::DailyRecap;

/// Source of the days on which a group had a penalty that still counts.
pub trait StreakSourceTrait: Send + Sync {
    /// Distinct dates in `[from, to]` with at least one non-waived penalty in the group.
    fn penalized_dates(&self, group_id: &str, from: NaiveDate, to: NaiveDate)
        -> Result<Vec<NaiveDate>>;
}

/// Record of which (group, day) recaps have been posted.
#[async_trait]
pub trait RecapPublicationRepositoryTrait: Send + Sync {
    /// Marks the recap as posted. Returns `false` if it already was.
    async fn mark_published(
        &self,
        group_id: &str,
        date: NaiveDate,
        at: DateTime<Utc>,
    ) -> Result<bool>;
}

/// Trait for recap service operations.
#[async_trait]
pub trait RecapServiceTrait: Send + Sync {
    fn build_recap(&self, group_id: &str, date: NaiveDate) -> Result<DailyRecap>;
    /// Builds the recap and posts it to the group chat at most once per group
    /// and day. `None` means it was posted earlier.
    async fn publish_recap(
        &self,
        group_id: &str,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Option<DailyRecap>>;
}
