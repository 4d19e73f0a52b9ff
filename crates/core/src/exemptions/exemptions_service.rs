use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use log::{debug, info, warn};

use super::exemptions_model::{resolve_exemptions, ExemptionKind, NewSickDay, SickDay};
use super::exemptions_traits::{ExemptionRepositoryTrait, ExemptionServiceTrait};
use crate::errors::{DatabaseError, Error, Result};
use crate::events::{ChatEvent, ChatEventSink};
use crate::groups::{GroupRepositoryTrait, Member};
use crate::penalties::{PenaltyLedgerTrait, PenaltyRepositoryTrait, PenaltyStatus, PendingPenalty};

/// Applies sick and recovery days to penalties that are still awaiting a response.
pub struct ExemptionService {
    exemption_repository: Arc<dyn ExemptionRepositoryTrait>,
    penalty_repository: Arc<dyn PenaltyRepositoryTrait>,
    penalty_ledger: Arc<dyn PenaltyLedgerTrait>,
    group_repository: Arc<dyn GroupRepositoryTrait>,
    event_sink: Arc<dyn ChatEventSink>,
}

impl ExemptionService {
    pub fn new(
        exemption_repository: Arc<dyn ExemptionRepositoryTrait>,
        penalty_repository: Arc<dyn PenaltyRepositoryTrait>,
        penalty_ledger: Arc<dyn PenaltyLedgerTrait>,
        group_repository: Arc<dyn GroupRepositoryTrait>,
        event_sink: Arc<dyn ChatEventSink>,
    ) -> Self {
        ExemptionService {
            exemption_repository,
            penalty_repository,
            penalty_ledger,
            group_repository,
            event_sink,
        }
    }

    fn announce_cleared(&self, user_id: &str, cleared: &[&PendingPenalty]) {
        let Some(first) = cleared.first() else {
            return;
        };
        let username = self
            .group_repository
            .get_member(user_id)
            .map(|m| m.username)
            .unwrap_or_else(|_| user_id.to_string());
        let mut dates: Vec<NaiveDate> = cleared.iter().map(|p| p.date).collect();
        dates.sort();
        self.event_sink.emit(ChatEvent::PenaltiesExempted {
            group_id: first.group_id.clone(),
            username,
            dates,
        });
    }

    /// A sick day recorded after the penalty was resolved leaves it standing.
    /// Returns the resolved penalty on that day, if any.
    fn resolved_penalty_on(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<PendingPenalty>> {
        let resolved = self
            .penalty_repository
            .find_penalty(user_id, date)?
            .filter(|p| p.status != PenaltyStatus::Pending);
        if let Some(penalty) = &resolved {
            info!(
                "Penalty {} for {} on {} stays {} despite the sick day",
                penalty.id, user_id, date, penalty.status
            );
        }
        Ok(resolved)
    }
}

#[async_trait]
impl ExemptionServiceTrait for ExemptionService {
    fn exemption_for(&self, member: &Member, date: NaiveDate) -> Result<Option<ExemptionKind>> {
        if member.is_rest_day(date) {
            return Ok(Some(ExemptionKind::RestDay));
        }
        Ok(self
            .exemption_repository
            .get_sick_day(&member.user_id, date)?
            .map(|day| ExemptionKind::from(day.kind)))
    }

    async fn list_pending_for_user(&self, user_id: &str) -> Result<Vec<PendingPenalty>> {
        let pending = self
            .penalty_repository
            .list_for_user_by_status(user_id, PenaltyStatus::Pending)?;
        if pending.is_empty() {
            return Ok(pending);
        }

        let dates: Vec<NaiveDate> = pending.iter().map(|p| p.date).collect();
        let sick_days = self.exemption_repository.list_sick_days(user_id, &dates)?;
        let covered = resolve_exemptions(&pending, &sick_days);
        if covered.is_empty() {
            return Ok(pending);
        }

        debug!(
            "{} pending penalties for {} fall on sick days",
            covered.len(),
            user_id
        );
        let deleted = self
            .penalty_ledger
            .delete_for_exemption(covered.clone())
            .await?;
        let cleared: Vec<&PendingPenalty> =
            pending.iter().filter(|p| deleted.contains(&p.id)).collect();
        self.announce_cleared(user_id, &cleared);

        if deleted.len() == covered.len() {
            return Ok(pending
                .into_iter()
                .filter(|p| !deleted.contains(&p.id))
                .collect());
        }
        let skipped: Vec<&String> = covered.iter().filter(|id| !deleted.contains(id)).collect();
        debug!("Skipped exempting {:?} for {}: no longer pending", skipped, user_id);
        self.penalty_repository
            .list_for_user_by_status(user_id, PenaltyStatus::Pending)
    }

    async fn record_sick_day(&self, user_id: &str, mut new_sick_day: NewSickDay) -> Result<SickDay> {
        // The member must exist.
        self.group_repository.get_member(user_id)?;
        if self
            .exemption_repository
            .get_sick_day(user_id, new_sick_day.date)?
            .is_some()
        {
            return Err(Error::ConstraintViolation(format!(
                "A sick day is already recorded for {}",
                new_sick_day.date
            )));
        }
        new_sick_day.note = new_sick_day
            .note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        let sick_day = self
            .exemption_repository
            .insert_sick_day(user_id, new_sick_day, Utc::now())
            .await?;
        info!(
            "Recorded {} day {} for {}",
            sick_day.kind, sick_day.date, sick_day.user_id
        );
        if let Err(e) = self.resolved_penalty_on(user_id, sick_day.date) {
            warn!("Could not check {} for resolved penalties: {}", sick_day.date, e);
        }
        Ok(sick_day)
    }

    async fn remove_sick_day(&self, user_id: &str, date: NaiveDate) -> Result<()> {
        let removed = self
            .exemption_repository
            .delete_sick_day(user_id, date)
            .await?;
        if removed == 0 {
            return Err(DatabaseError::NotFound(format!("No sick day on {} for {}", date, user_id)).into());
        }
        Ok(())
    }
}
