use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use log::debug;

use super::recap_model::{build_daily_recap, consecutive_clean_days, DailyRecap};
use super::recap_traits::{
    RecapPublicationRepositoryTrait, RecapServiceTrait, StreakSourceTrait,
};
use crate::constants::STREAK_LOOKBACK_DAYS;
use crate::errors::Result;
use crate::events::{ChatEvent, ChatEventSink};
use crate::groups::{Group, GroupRepositoryTrait};
use crate::penalties::PenaltyRepositoryTrait;
use crate::transactions::BalanceServiceTrait;
use crate::utils::time_utils::{local_date_from_utc, parse_timezone};

pub struct RecapService {
    group_repository: Arc<dyn GroupRepositoryTrait>,
    penalty_repository: Arc<dyn PenaltyRepositoryTrait>,
    streak_source: Arc<dyn StreakSourceTrait>,
    balance_service: Arc<dyn BalanceServiceTrait>,
    publications: Arc<dyn RecapPublicationRepositoryTrait>,
    event_sink: Arc<dyn ChatEventSink>,
}

impl RecapService {
    pub fn new(
        group_repository: Arc<dyn GroupRepositoryTrait>,
        penalty_repository: Arc<dyn PenaltyRepositoryTrait>,
        streak_source: Arc<dyn StreakSourceTrait>,
        balance_service: Arc<dyn BalanceServiceTrait>,
        publications: Arc<dyn RecapPublicationRepositoryTrait>,
        event_sink: Arc<dyn ChatEventSink>,
    ) -> Self {
        RecapService {
            group_repository,
            penalty_repository,
            streak_source,
            balance_service,
            publications,
            event_sink,
        }
    }

    fn group_start(group: &Group) -> NaiveDate {
        let tz = parse_timezone(&group.timezone).unwrap_or(chrono_tz::UTC);
        local_date_from_utc(group.created_at, tz)
    }

    fn streak(&self, group: &Group, date: NaiveDate) -> Result<u32> {
        let earliest = Self::group_start(group).max(date - Duration::days(STREAK_LOOKBACK_DAYS));
        if earliest > date {
            return Ok(0);
        }
        let penalized: HashSet<NaiveDate> = self
            .streak_source
            .penalized_dates(&group.id, earliest, date)?
            .into_iter()
            .collect();
        Ok(consecutive_clean_days(&penalized, date, earliest))
    }
}

#[async_trait]
impl RecapServiceTrait for RecapService {
    fn build_recap(&self, group_id: &str, date: NaiveDate) -> Result<DailyRecap> {
        let group = self.group_repository.get_group(group_id)?;
        let tz = parse_timezone(&group.timezone).unwrap_or(chrono_tz::UTC);
        let members: Vec<_> = self
            .group_repository
            .list_members(group_id)?
            .into_iter()
            .filter(|m| local_date_from_utc(m.joined_at, tz) <= date)
            .collect();
        let penalties = self.penalty_repository.list_for_group_on_date(group_id, date)?;
        let streak = self.streak(&group, date)?;
        let pot = self.balance_service.group_pot(group_id)?;

        Ok(build_daily_recap(&group, &members, &penalties, date, streak, pot))
    }

    async fn publish_recap(
        &self,
        group_id: &str,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Option<DailyRecap>> {
        let recap = self.build_recap(group_id, date)?;
        if !self.publications.mark_published(group_id, date, now).await? {
            debug!("Recap for group {} on {} already posted", group_id, date);
            return Ok(None);
        }
        debug!("Posting recap for group {} on {}", group_id, date);
        self.event_sink.emit(ChatEvent::DailyRecap {
            group_id: recap.group_id.clone(),
            date,
            summary: recap.message(),
        });
        Ok(Some(recap))
    }
}
